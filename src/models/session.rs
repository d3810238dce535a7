//! Q&A session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A password-protected Q&A session
///
/// The id is opaque (a UUID rendered as text), assigned exactly once at
/// creation and immutable thereafter. Whoever presents the matching password
/// is the session owner; there is no persistent owner identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaSession {
    /// Session ID (opaque, globally unique)
    pub id: String,
    /// Argon2id hash of the owner password (PHC string format)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl QaSession {
    /// Server-relative link for submitting questions to this session
    pub fn ask_link(&self) -> String {
        format!("/ask/{}", self.id)
    }

    /// Server-relative link for the owner's moderation view
    pub fn view_link(&self) -> String {
        format!("/qa/{}/questions", self.id)
    }
}
