//! The slot memory contract.
//!
//! Two kinds of durable per-user state share one store: the transcript
//! (append-only message log) and slot records (namespaced key/value pairs,
//! also append-only: a "write" is an insert, and reads pick the newest
//! record inside a freshness window). Backends live in the memory crate.

use async_trait::async_trait;
use chrono::Duration;

use crate::error::MemoryError;
use crate::transcript::{Role, TranscriptEntry};

/// Slot namespace reserved for router bookkeeping (e.g. `last_tool`).
pub const META_NAMESPACE: &str = "meta";

/// Default freshness window for slot reads: records older than this are
/// treated as stale and skipped.
pub fn default_freshness() -> Duration {
    Duration::hours(24)
}

/// Durable per-user conversational state.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Append one transcript entry. Never updates existing rows.
    async fn append_message(
        &self,
        user_id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), MemoryError>;

    /// The most recent `k` entries for a user, oldest first. `k = 0` is empty.
    async fn recent_messages(
        &self,
        user_id: &str,
        k: u32,
    ) -> Result<Vec<TranscriptEntry>, MemoryError>;

    /// Record a slot value. Appends a new version; history stays intact.
    async fn set_slot(
        &self,
        user_id: &str,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), MemoryError>;

    /// The newest value for a slot, or `None` when nothing fresh enough
    /// exists. `max_age = None` disables the staleness check entirely.
    async fn get_slot(
        &self,
        user_id: &str,
        namespace: &str,
        key: &str,
        max_age: Option<Duration>,
    ) -> Result<Option<String>, MemoryError>;
}
