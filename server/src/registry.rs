//! Connection registry for the relay server
//!
//! Tracks every live connection by its assigned id. Handlers never touch a
//! shared map directly; all membership changes go through `register`,
//! `unregister` and `snapshot`, which serialize access behind one lock.

use log::info;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Write half of a registered connection.
///
/// Each connection has exactly one writer task consuming the other end of
/// this channel, so a send here can never race another writer on the same
/// transport.
pub type ConnectionSender = mpsc::UnboundedSender<WsMessage>;

/// Live connections indexed by their assigned id.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<u32, ConnectionSender>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a connection and returns its assigned id.
    ///
    /// Ids are derived from the live set: 1 when the registry is empty,
    /// otherwise the current maximum plus one. The id is computed and
    /// inserted under the write lock, so concurrent registrations can never
    /// be handed the same id. Ids may be reused once all connections drop.
    pub async fn register(&self, sender: ConnectionSender) -> u32 {
        let mut connections = self.connections.write().await;
        let id = match connections.keys().max() {
            Some(max) => max + 1,
            None => 1,
        };
        connections.insert(id, sender);
        info!("Connection {} registered ({} live)", id, connections.len());
        id
    }

    /// Removes a connection. A no-op if the id is already gone, so handlers
    /// can unregister unconditionally on every exit path.
    pub async fn unregister(&self, id: u32) -> bool {
        let removed = self.connections.write().await.remove(&id).is_some();
        if removed {
            info!("Connection {} unregistered", id);
        }
        removed
    }

    /// Point-in-time copy of the live set, ordered by id. Safe to iterate
    /// while handlers register and unregister concurrently.
    pub async fn snapshot(&self) -> Vec<(u32, ConnectionSender)> {
        let connections = self.connections.read().await;
        let mut entries: Vec<(u32, ConnectionSender)> = connections
            .iter()
            .map(|(id, sender)| (*id, sender.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Returns the number of currently live connections.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
