//! Data models
//!
//! This module contains the data structures used throughout the Askbox
//! service:
//! - Database entities (QaSession, Question)
//! - The question moderation status

mod question;
mod session;

pub use question::{Question, QuestionStatus};
pub use session::QaSession;
