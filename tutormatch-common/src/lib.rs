//! # TutorMatch Common Library
//!
//! Shared code for the TutorMatch service crates:
//! - Database initialization, migrations and settings
//! - Domain models (accounts, tutor/student profiles, enquiries, reviews)
//! - Configuration resolution
//! - Bearer token signing and verification
//! - Utility functions

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
