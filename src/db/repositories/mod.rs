//! Repository layer
//!
//! Data access for the Askbox service. Each repository is a trait consumed
//! by the moderation engine plus a SQLx implementation that dispatches on
//! the configured database driver.

mod question;
mod session;

pub use question::{QuestionRepository, SqlxQuestionRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
