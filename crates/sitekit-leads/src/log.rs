// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local lead log: a bounded FIFO of submitted leads kept in the key-value
//! store as one JSON array.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sitekit_core::{DeliveryMethod, KeyValueStore, Lead, LeadId, SitekitError};
use tokio::sync::Mutex;
use tracing::warn;

/// One persisted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLead {
    #[serde(flatten)]
    pub lead: Lead,
    /// RFC 3339 time the entry was written.
    pub saved_at: String,
    /// Channel that delivered the lead, or `local`.
    pub method: DeliveryMethod,
}

impl StoredLead {
    pub fn is_pending(&self) -> bool {
        self.method.is_local()
    }
}

pub struct LeadLog {
    store: Arc<dyn KeyValueStore>,
    key: String,
    capacity: usize,
    // Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl LeadLog {
    /// A capacity of zero is treated as one.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, capacity: usize) -> Self {
        Self {
            store,
            key: key.into(),
            capacity: capacity.max(1),
            guard: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All entries, oldest first.
    pub async fn entries(&self) -> Result<Vec<StoredLead>, SitekitError> {
        self.read().await
    }

    /// Entries nobody has delivered yet.
    pub async fn pending(&self) -> Result<Vec<StoredLead>, SitekitError> {
        Ok(self
            .read()
            .await?
            .into_iter()
            .filter(StoredLead::is_pending)
            .collect())
    }

    /// Append one entry, evicting the oldest ones beyond capacity.
    ///
    /// Returns the log length after the write.
    pub async fn append(&self, entry: StoredLead) -> Result<usize, SitekitError> {
        let _guard = self.guard.lock().await;
        let mut entries = self.read().await?;
        entries.push(entry);
        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
        }
        self.write(&entries).await?;
        Ok(entries.len())
    }

    /// Record that a stored lead was delivered later. Returns false when the
    /// lead is no longer in the log.
    pub async fn mark_delivered(
        &self,
        lead_id: &LeadId,
        method: DeliveryMethod,
    ) -> Result<bool, SitekitError> {
        let _guard = self.guard.lock().await;
        let mut entries = self.read().await?;
        let Some(entry) = entries.iter_mut().find(|e| &e.lead.lead_id == lead_id) else {
            return Ok(false);
        };
        entry.method = method;
        self.write(&entries).await?;
        Ok(true)
    }

    pub async fn clear(&self) -> Result<(), SitekitError> {
        let _guard = self.guard.lock().await;
        self.store.remove(&self.key).await
    }

    async fn read(&self) -> Result<Vec<StoredLead>, SitekitError> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(key = %self.key, error = %e, "lead log is not valid JSON, starting fresh");
                Ok(Vec::new())
            }
        }
    }

    async fn write(&self, entries: &[StoredLead]) -> Result<(), SitekitError> {
        let raw = serde_json::to_string(entries).map_err(SitekitError::storage)?;
        self.store.set(&self.key, &raw).await?;
        sitekit_prometheus::set_lead_log_size(entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::tests_support::{sample_lead, MemoryStore};

    fn stored(id: &str, method: DeliveryMethod) -> StoredLead {
        let mut lead = sample_lead();
        lead.lead_id = LeadId(id.to_string());
        StoredLead {
            lead,
            saved_at: "2026-10-18T00:00:00.000Z".into(),
            method,
        }
    }

    #[tokio::test]
    async fn evicts_oldest_beyond_capacity() {
        let log = LeadLog::new(Arc::new(MemoryStore::default()), "leads", 2);
        for id in ["a", "b", "c"] {
            log.append(stored(id, DeliveryMethod::Local)).await.unwrap();
        }
        let ids: Vec<String> = log
            .entries()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.lead.lead_id.0)
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn mark_delivered_updates_in_place() {
        let log = LeadLog::new(Arc::new(MemoryStore::default()), "leads", 5);
        log.append(stored("a", DeliveryMethod::Local)).await.unwrap();
        log.append(stored("b", DeliveryMethod::Channel("emailjs".into())))
            .await
            .unwrap();

        assert_eq!(log.pending().await.unwrap().len(), 1);
        assert!(log
            .mark_delivered(&LeadId("a".into()), DeliveryMethod::Channel("formspree".into()))
            .await
            .unwrap());
        assert!(!log
            .mark_delivered(&LeadId("zz".into()), DeliveryMethod::Local)
            .await
            .unwrap());

        let entries = log.entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(log.pending().await.unwrap().is_empty());
        assert_eq!(entries[0].method.as_str(), "formspree");
    }

    #[tokio::test]
    async fn corrupt_log_is_replaced() {
        let store = Arc::new(MemoryStore::default());
        store.set("leads", "{not json").await.unwrap();
        let log = LeadLog::new(store, "leads", 5);
        assert!(log.entries().await.unwrap().is_empty());
        assert_eq!(log.append(stored("a", DeliveryMethod::Local)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stored_entries_keep_flat_json_shape() {
        let store = Arc::new(MemoryStore::default());
        let log = LeadLog::new(store.clone(), "leads", 5);
        log.append(stored("a", DeliveryMethod::Local)).await.unwrap();

        let raw = store.get("leads").await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["lead_id"], "a");
        assert_eq!(value[0]["form_type"], "contact");
        assert_eq!(value[0]["method"], "local");
        assert_eq!(value[0]["referrer"], "Direct");
    }

    proptest! {
        #[test]
        fn log_never_exceeds_capacity(capacity in 1usize..8, inserts in 0usize..20) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let log = LeadLog::new(Arc::new(MemoryStore::default()), "leads", capacity);
                for i in 0..inserts {
                    let len = log.append(stored(&i.to_string(), DeliveryMethod::Local)).await.unwrap();
                    prop_assert!(len <= capacity);
                }
                let entries = log.entries().await.unwrap();
                prop_assert_eq!(entries.len(), inserts.min(capacity));
                // Survivors are the newest inserts, still in order.
                let expected: Vec<String> = (inserts.saturating_sub(capacity)..inserts)
                    .map(|i| i.to_string())
                    .collect();
                let ids: Vec<String> = entries.into_iter().map(|e| e.lead.lead_id.0).collect();
                prop_assert_eq!(ids, expected);
                Ok(())
            })?;
        }
    }
}
