//! Services layer - Business logic
//!
//! This module contains the business logic of the Askbox service:
//! - `moderation`: the moderation engine (submission, authentication,
//!   approve/reject state machine)
//! - `password`: Argon2id password hashing and verification

pub mod moderation;
pub mod password;

pub use moderation::{ModerationError, ModerationService};
pub use password::{hash_password, verify_password};
