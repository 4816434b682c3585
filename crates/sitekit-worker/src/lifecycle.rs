// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::Serialize;
use strum::Display;

/// Lifecycle state of one worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Created, install not started.
    Parsed,
    Installing,
    /// Precache complete; waiting for the previous version's clients to close.
    Installed,
    Activating,
    /// Controls clients and serves fetches from its own store.
    Activated,
    /// Failed to install or was replaced. Never serves from its own store.
    Redundant,
}

impl WorkerState {
    /// Whether `next` is a legal transition from `self`.
    pub fn can_become(self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Parsed, Installing)
                | (Installing, Installed)
                | (Installed, Activating)
                | (Activating, Activated)
                | (_, Redundant)
        ) && self != Redundant
    }

    pub fn is_waiting(self) -> bool {
        self == WorkerState::Installed
    }
}
