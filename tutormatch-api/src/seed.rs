//! Demo data for local development (`--seed-demo`)
//!
//! Users are keyed by email; running the seeder again leaves existing users
//! alone and only prints fresh tokens.

use sqlx::SqlitePool;
use tracing::info;

use tutormatch_common::auth::issue_token;
use tutormatch_common::models::{
    Account, AuthProvider, AvailabilitySlot, ContactMode, DayOfWeek, NewUser, PreferredContact,
    ProficiencyLevel, Role, TimeZoneSlot,
};
use tutormatch_common::{Error, Result};

use crate::services::accounts::{create_user, find_account_by_email};
use crate::services::students::{update_student_profile, StudentProfileUpdate};
use crate::services::tutors::{save_tutor_profile, TutorProfileUpdate};

struct DemoTeacher {
    email: &'static str,
    name: &'static str,
    instrument: &'static str,
    level: ProficiencyLevel,
    rate: f64,
    city: &'static str,
    state: &'static str,
    country: &'static str,
    years: i64,
    time_zone: &'static str,
    days: &'static [DayOfWeek],
    verified: bool,
}

struct DemoStudent {
    email: &'static str,
    name: &'static str,
    provider: AuthProvider,
    level: ProficiencyLevel,
    instruments: &'static [&'static str],
    bio: &'static str,
}

const TEACHERS: &[DemoTeacher] = &[
    DemoTeacher {
        email: "guru.raghunath@musictutor.com",
        name: "Guru Raghunath Sharma",
        instrument: "Mridangam",
        level: ProficiencyLevel::Expert,
        rate: 75.0,
        city: "Chennai",
        state: "Tamil Nadu",
        country: "India",
        years: 25,
        time_zone: "UTC",
        days: &[DayOfWeek::Mon, DayOfWeek::Wed, DayOfWeek::Sat],
        verified: true,
    },
    DemoTeacher {
        email: "priya.venkatesh@musictutor.com",
        name: "Priya Venkatesh",
        instrument: "Violin",
        level: ProficiencyLevel::Advanced,
        rate: 55.0,
        city: "Toronto",
        state: "Ontario",
        country: "Canada",
        years: 12,
        time_zone: "America/Toronto",
        days: &[DayOfWeek::Tue, DayOfWeek::Thu],
        verified: true,
    },
    DemoTeacher {
        email: "karthik.s@musictutor.com",
        name: "Karthik Subramanian",
        instrument: "Piano",
        level: ProficiencyLevel::Intermediate,
        rate: 40.0,
        city: "London",
        state: "England",
        country: "United Kingdom",
        years: 6,
        time_zone: "Europe/London",
        days: &[DayOfWeek::Fri, DayOfWeek::Sun],
        verified: false,
    },
];

const STUDENTS: &[DemoStudent] = &[
    DemoStudent {
        email: "alex.johnson@gmail.com",
        name: "Alex Johnson",
        provider: AuthProvider::Email,
        level: ProficiencyLevel::Beginner,
        instruments: &["Mridangam"],
        bio: "Eager to learn traditional percussion!",
    },
    DemoStudent {
        email: "maya.patel@gmail.com",
        name: "Maya Patel",
        provider: AuthProvider::Google,
        level: ProficiencyLevel::Intermediate,
        instruments: &["Violin", "Piano"],
        bio: "Two years of learning, looking to advance.",
    },
    DemoStudent {
        email: "raj.kumar@gmail.com",
        name: "Raj Kumar",
        provider: AuthProvider::Email,
        level: ProficiencyLevel::Beginner,
        instruments: &["Piano"],
        bio: "Complete beginner, very motivated!",
    },
];

/// Return the account for `new_user.email`, creating it if absent
async fn ensure_user(db: &SqlitePool, new_user: NewUser) -> Result<(Account, bool)> {
    if let Some(account) = find_account_by_email(db, &new_user.email).await? {
        return Ok((account, false));
    }
    Ok((create_user(db, new_user).await?, true))
}

async fn seed_teacher(db: &SqlitePool, teacher: &DemoTeacher) -> Result<Account> {
    let mut new_user = NewUser::new(teacher.email, teacher.name, Some(Role::Teacher));
    new_user.photo_url = Some(format!("https://i.pravatar.cc/300?u={}", teacher.email));

    let (account, created) = ensure_user(db, new_user).await?;
    if !created {
        return Ok(account);
    }

    let update = TutorProfileUpdate {
        instrument: Some(teacher.instrument.to_string()),
        proficiency_level: Some(teacher.level),
        hourly_rate: Some(teacher.rate),
        city: Some(teacher.city.to_string()),
        state: Some(teacher.state.to_string()),
        country: Some(teacher.country.to_string()),
        bio: Some(format!(
            "{} teacher with {} years of experience.",
            teacher.instrument, teacher.years
        )),
        availability: Some(
            teacher
                .days
                .iter()
                .map(|&day| AvailabilitySlot {
                    day,
                    start_time: "16:00".to_string(),
                    end_time: "19:00".to_string(),
                })
                .collect(),
        ),
        time_zone_availability: Some(vec![TimeZoneSlot {
            time_zone: teacher.time_zone.to_string(),
            start_time: "09:00".to_string(),
            end_time: "12:00".to_string(),
        }]),
        preferred_contact: Some(Some(PreferredContact {
            mode: ContactMode::Email,
            value: teacher.email.to_string(),
        })),
        is_online: Some(true),
        years_of_experience: Some(teacher.years),
    };
    save_tutor_profile(db, account.id(), update, true).await?;

    if teacher.verified {
        sqlx::query("UPDATE tutor_profiles SET is_verified = 1 WHERE user_id = ?")
            .bind(account.id().to_string())
            .execute(db)
            .await?;
    }

    Ok(account)
}

async fn seed_student(db: &SqlitePool, student: &DemoStudent) -> Result<Account> {
    let mut new_user = NewUser::new(student.email, student.name, Some(Role::Student));
    new_user.auth_provider = student.provider;

    let (account, created) = ensure_user(db, new_user).await?;
    if created {
        let update = StudentProfileUpdate {
            level: Some(student.level),
            preferred_instruments: Some(student.instruments.iter().map(|i| i.to_string()).collect()),
            bio: Some(Some(student.bio.to_string())),
        };
        update_student_profile(db, account.id(), update).await?;
    }
    Ok(account)
}

/// Insert the demo admin, teachers and students and log a token for each
pub async fn seed_demo_data(db: &SqlitePool, token_secret: &str) -> Result<()> {
    let mut accounts = Vec::new();

    let (admin, _) = ensure_user(
        db,
        NewUser::new("admin@musictutor.com", "Admin User", Some(Role::Admin)),
    )
    .await?;
    accounts.push(admin);

    for teacher in TEACHERS {
        accounts.push(seed_teacher(db, teacher).await?);
    }
    for student in STUDENTS {
        accounts.push(seed_student(db, student).await?);
    }

    for account in &accounts {
        let token = issue_token(token_secret, account.id())
            .map_err(|e| Error::Internal(format!("Failed to issue demo token: {}", e)))?;
        info!(
            email = %account.user.email,
            role = ?account.role(),
            token = %token,
            "Demo user ready"
        );
    }

    info!(users = accounts.len(), "Demo data seeded");
    Ok(())
}
