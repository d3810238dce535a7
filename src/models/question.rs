//! Question model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Question moderation status
///
/// New questions start out `Pending`. The session owner moves them to
/// `Approved` or `Rejected`; both are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Pending,
    Approved,
    Rejected,
}

impl Default for QuestionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for QuestionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Invalid question status: {}", s)),
        }
    }
}

/// Question entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub session_id: String,
    pub body: String,
    pub status: QuestionStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_display() {
        for status in [
            QuestionStatus::Pending,
            QuestionStatus::Approved,
            QuestionStatus::Rejected,
        ] {
            let parsed: QuestionStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("deleted".parse::<QuestionStatus>().is_err());
        assert!("".parse::<QuestionStatus>().is_err());
    }
}
