// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Popup suppression: once dismissed or submitted, the lead popup stays
//! hidden for a configured number of days.
//!
//! Records are kept per visitor id and dropped once their window has passed,
//! either when read or by [`PopupGate::sweep`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sitekit_config::model::PopupConfig;
use sitekit_core::{KeyValueStore, SitekitError};
use tracing::{debug, warn};

const DAY_MS: i64 = 86_400_000;

/// Longest visitor id accepted.
pub const MAX_VISITOR_LEN: usize = 64;

/// Visitor ids are 1 to 64 ASCII letters, digits, `-` or `_`.
pub fn is_valid_visitor(visitor: &str) -> bool {
    (1..=MAX_VISITOR_LEN).contains(&visitor.len())
        && visitor
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupStatus {
    pub timestamp_ms: i64,
    pub submitted: bool,
}

pub struct PopupGate {
    store: Arc<dyn KeyValueStore>,
    config: PopupConfig,
}

impl PopupGate {
    pub fn new(store: Arc<dyn KeyValueStore>, config: PopupConfig) -> Self {
        Self { store, config }
    }

    fn prefix(&self) -> String {
        format!("{}:", self.config.storage_key)
    }

    fn key(&self, visitor: &str) -> String {
        format!("{}{visitor}", self.prefix())
    }

    fn expired(&self, status: &PopupStatus, now: DateTime<Utc>) -> bool {
        let days = if status.submitted {
            self.config.dont_show_after_submit_days
        } else {
            self.config.dont_show_for_days
        };
        now.timestamp_millis() - status.timestamp_ms > i64::from(days) * DAY_MS
    }

    /// Stored status for a visitor; unreadable records count as absent.
    pub async fn status(&self, visitor: &str) -> Option<PopupStatus> {
        match self.store.get(&self.key(visitor)).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(visitor, error = %e, "failed to read popup status");
                None
            }
        }
    }

    /// Whether the popup may be shown to `visitor` at `now`. An expired
    /// record is deleted on the way.
    pub async fn should_show(&self, visitor: &str, now: DateTime<Utc>) -> bool {
        let Some(status) = self.status(visitor).await else {
            return true;
        };
        if !self.expired(&status, now) {
            return false;
        }
        if let Err(e) = self.store.remove(&self.key(visitor)).await {
            warn!(visitor, error = %e, "failed to remove expired popup status");
        }
        true
    }

    /// Delete every expired or unreadable record. Returns how many went.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<usize, SitekitError> {
        let mut removed = 0;
        for key in self.store.keys_with_prefix(&self.prefix()).await? {
            let stale = match self.store.get(&key).await? {
                Some(raw) => serde_json::from_str::<PopupStatus>(&raw)
                    .map_or(true, |status| self.expired(&status, now)),
                None => false,
            };
            if stale {
                self.store.remove(&key).await?;
                removed += 1;
            }
        }
        debug!(removed, "popup records swept");
        Ok(removed)
    }

    pub async fn record_dismissed(&self, visitor: &str, now: DateTime<Utc>) {
        self.record(visitor, now, false).await;
    }

    pub async fn record_submitted(&self, visitor: &str, now: DateTime<Utc>) {
        self.record(visitor, now, true).await;
    }

    async fn record(&self, visitor: &str, now: DateTime<Utc>, submitted: bool) {
        let status = PopupStatus {
            timestamp_ms: now.timestamp_millis(),
            submitted,
        };
        let result = match serde_json::to_string(&status) {
            Ok(raw) => self.store.set(&self.key(visitor), &raw).await,
            Err(e) => Err(SitekitError::storage(e)),
        };
        if let Err(e) = result {
            warn!(visitor, submitted, error = %e, "failed to store popup status");
        }
    }
}
