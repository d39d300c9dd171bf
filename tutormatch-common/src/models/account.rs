//! User accounts and roles
//!
//! The `users.role` column is nullable, but code never inspects it directly:
//! an [`Account`] pairs the user row with a [`RoleProfile`] whose variant
//! carries exactly the profile data that belongs to that role.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::student::StudentProfile;
use super::text_enum;
use super::tutor::TutorProfile;

text_enum! {
    Role {
        Student => "student",
        Teacher => "teacher",
        Admin => "admin",
    }
}

text_enum! {
    AuthProvider {
        Email => "email",
        Google => "google",
        Apple => "apple",
        Facebook => "facebook",
    }
}

/// Row from the `users` table, minus the role
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub auth_provider: AuthProvider,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role-specific data attached to an account
#[derive(Debug, Clone)]
pub enum RoleProfile {
    /// Signed up but has not chosen a role yet
    Unassigned,
    Student(StudentProfile),
    Teacher(TutorProfile),
    Admin,
}

impl RoleProfile {
    pub fn role(&self) -> Option<Role> {
        match self {
            RoleProfile::Unassigned => None,
            RoleProfile::Student(_) => Some(Role::Student),
            RoleProfile::Teacher(_) => Some(Role::Teacher),
            RoleProfile::Admin => Some(Role::Admin),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub user: User,
    pub profile: RoleProfile,
}

impl Account {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn role(&self) -> Option<Role> {
        self.profile.role()
    }

    /// Teachers must finish onboarding before they are listed; everyone else is done
    pub fn has_completed_onboarding(&self) -> bool {
        match &self.profile {
            RoleProfile::Teacher(profile) => profile.onboarding_complete,
            _ => true,
        }
    }
}

/// Input for provisioning a user (seeding, tests)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub auth_provider: AuthProvider,
    pub role: Option<Role>,
}

impl NewUser {
    pub fn new(email: impl Into<String>, name: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            photo_url: None,
            auth_provider: AuthProvider::Email,
            role,
        }
    }
}
