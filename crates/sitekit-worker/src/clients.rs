// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Open pages controlled by the worker, and the broadcast channel that
//! reaches them.

use std::sync::Arc;

use sitekit_core::WorkerMessage;
use tokio::sync::{broadcast, watch};
use tracing::debug;

const BROADCAST_CAPACITY: usize = 64;

/// Shared registry of connected clients.
///
/// Cloning is cheap; all clones see the same clients.
#[derive(Clone)]
pub struct ClientHub {
    tx: broadcast::Sender<WorkerMessage>,
    count: Arc<watch::Sender<usize>>,
}

impl ClientHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (count, _) = watch::channel(0);
        Self {
            tx,
            count: Arc::new(count),
        }
    }

    /// Register a client. It stays counted until the handle is dropped.
    pub fn connect(&self) -> ClientHandle {
        let rx = self.tx.subscribe();
        self.count.send_modify(|n| *n += 1);
        debug!(clients = *self.count.borrow(), "client connected");
        ClientHandle {
            rx,
            guard: ClientGuard {
                count: Arc::clone(&self.count),
            },
        }
    }

    pub fn client_count(&self) -> usize {
        *self.count.borrow()
    }

    /// Send a message to every connected client. Returns how many received it.
    pub fn broadcast(&self, message: WorkerMessage) -> usize {
        self.tx.send(message).unwrap_or(0)
    }

    /// Resolve once no client is connected.
    pub async fn wait_idle(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives in `self`, so the watch cannot close under us.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for ClientHub {
    fn default() -> Self {
        Self::new()
    }
}

/// One connected client.
pub struct ClientHandle {
    rx: broadcast::Receiver<WorkerMessage>,
    guard: ClientGuard,
}

impl ClientHandle {
    /// Next broadcast message. Returns `None` once the hub is gone.
    ///
    /// A client that falls behind skips the messages it missed.
    pub async fn recv(&mut self) -> Option<WorkerMessage> {
        loop {
            match self.rx.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "client lagged behind worker broadcasts");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Split into the raw receiver and the guard that keeps the client counted.
    pub fn into_parts(self) -> (broadcast::Receiver<WorkerMessage>, ClientGuard) {
        (self.rx, self.guard)
    }
}

/// Keeps a client counted while alive.
pub struct ClientGuard {
    count: Arc<watch::Sender<usize>>,
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.count.send_modify(|n| *n = n.saturating_sub(1));
    }
}
