//! Domain operations over the database
//!
//! Handlers in [`crate::api`] parse and authorize; everything that reads or
//! writes storage lives here and returns `tutormatch_common::Result`.

pub mod accounts;
pub mod enquiries;
pub mod review_locks;
pub mod reviews;
pub mod students;
pub mod tutors;

pub use review_locks::TutorLocks;
