//! In-memory slot store for tests and ephemeral sessions.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use switchboard_core::error::MemoryError;
use switchboard_core::memory::SlotStore;
use switchboard_core::transcript::{Role, TranscriptEntry};
use tokio::sync::RwLock;

struct SlotRecord {
    user_id: String,
    namespace: String,
    key: String,
    value: String,
    timestamp: DateTime<Utc>,
}

/// A slot store that keeps everything in process memory.
///
/// Same append-only semantics as the SQLite store: slot writes push a new
/// record and reads scan from the back for the newest fresh match.
pub struct InMemoryStore {
    messages: RwLock<Vec<TranscriptEntry>>,
    slots: RwLock<Vec<SlotRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            slots: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SlotStore for InMemoryStore {
    async fn append_message(
        &self,
        user_id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), MemoryError> {
        self.messages
            .write()
            .await
            .push(TranscriptEntry::new(user_id, role, content));
        Ok(())
    }

    async fn recent_messages(
        &self,
        user_id: &str,
        k: u32,
    ) -> Result<Vec<TranscriptEntry>, MemoryError> {
        let messages = self.messages.read().await;
        let matching: Vec<TranscriptEntry> = messages
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        let start = matching.len().saturating_sub(k as usize);
        Ok(matching[start..].to_vec())
    }

    async fn set_slot(
        &self,
        user_id: &str,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), MemoryError> {
        self.slots.write().await.push(SlotRecord {
            user_id: user_id.into(),
            namespace: namespace.into(),
            key: key.into(),
            value: value.into(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn get_slot(
        &self,
        user_id: &str,
        namespace: &str,
        key: &str,
        max_age: Option<Duration>,
    ) -> Result<Option<String>, MemoryError> {
        let cutoff = max_age.map(|age| Utc::now() - age);
        let slots = self.slots.read().await;
        let found = slots
            .iter()
            .rev()
            .find(|r| {
                r.user_id == user_id
                    && r.namespace == namespace
                    && r.key == key
                    && cutoff.is_none_or(|c| r.timestamp >= c)
            })
            .map(|r| r.value.clone());
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transcript_round_trip() {
        let store = InMemoryStore::new();
        store.append_message("u1", Role::User, "hi").await.unwrap();
        store.append_message("u1", Role::Assistant, "hello").await.unwrap();
        store.append_message("u2", Role::User, "other").await.unwrap();

        let recent = store.recent_messages("u1", 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "hi");
        assert_eq!(recent[1].content, "hello");
    }

    #[tokio::test]
    async fn recent_messages_keeps_only_last_k() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store
                .append_message("u1", Role::User, &format!("msg {i}"))
                .await
                .unwrap();
        }

        let recent = store.recent_messages("u1", 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "msg 3");
        assert_eq!(recent[1].content, "msg 4");
    }

    #[tokio::test]
    async fn newest_slot_wins_and_freshness_applies() {
        let store = InMemoryStore::new();
        store.set_slot("u1", "get_weather", "location", "Paris").await.unwrap();
        store.set_slot("u1", "get_weather", "location", "Tokyo").await.unwrap();

        let value = store
            .get_slot("u1", "get_weather", "location", Some(Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("Tokyo"));

        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        let stale = store
            .get_slot("u1", "get_weather", "location", Some(Duration::milliseconds(5)))
            .await
            .unwrap();
        assert!(stale.is_none());
    }
}
