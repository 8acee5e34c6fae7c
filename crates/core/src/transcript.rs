//! Transcript types: who said what, when.
//!
//! The transcript is append-only. Entries are never edited or deleted;
//! readers ask for the most recent k in chronological order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse the stored string form. Unknown strings are rejected so a
    /// corrupted row surfaces as an error instead of a silent remap.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a user's conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub user_id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(user_id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// The `"role: content"` form fed to the snippet index.
    pub fn snippet(&self) -> String {
        format!("{}: {}", self.role, self.content)
    }
}
