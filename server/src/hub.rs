//! Broadcast fan-out over the connection registry.

use crate::registry::ConnectionRegistry;
use log::warn;
use std::sync::Arc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Fans a message out to every registered connection.
///
/// The hub only delivers; connection lifecycle stays with the handlers. A
/// connection whose writer is gone is skipped and left in the registry for
/// its own handler to remove.
pub struct BroadcastHub {
    registry: Arc<ConnectionRegistry>,
}

impl BroadcastHub {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Sends `text` to every connection in the current registry snapshot,
    /// except `exclude` when given. A failed send never aborts delivery to
    /// the remaining connections.
    pub async fn broadcast(&self, text: &str, exclude: Option<u32>) {
        for (id, sender) in self.registry.snapshot().await {
            if Some(id) == exclude {
                continue;
            }

            if sender.send(WsMessage::Text(text.to_string())).is_err() {
                warn!("Skipping broadcast to connection {}: writer closed", id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    async fn registered_receiver(
        registry: &ConnectionRegistry,
    ) -> (u32, mpsc::UnboundedReceiver<WsMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = registry.register(sender).await;
        (id, receiver)
    }

    fn received_text(receiver: &mut mpsc::UnboundedReceiver<WsMessage>) -> Option<String> {
        match receiver.try_recv() {
            Ok(WsMessage::Text(text)) => Some(text),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_connections() {
        let registry = Arc::new(ConnectionRegistry::new());
        let hub = BroadcastHub::new(Arc::clone(&registry));

        let (_, mut rx1) = registered_receiver(&registry).await;
        let (_, mut rx2) = registered_receiver(&registry).await;

        hub.broadcast("hello", None).await;

        assert_eq!(received_text(&mut rx1).as_deref(), Some("hello"));
        assert_eq!(received_text(&mut rx2).as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_broadcast_excludes_requested_connection() {
        let registry = Arc::new(ConnectionRegistry::new());
        let hub = BroadcastHub::new(Arc::clone(&registry));

        let (id1, mut rx1) = registered_receiver(&registry).await;
        let (_, mut rx2) = registered_receiver(&registry).await;

        hub.broadcast("joined", Some(id1)).await;

        assert!(received_text(&mut rx1).is_none());
        assert_eq!(received_text(&mut rx2).as_deref(), Some("joined"));
    }

    #[tokio::test]
    async fn test_broadcast_survives_partial_failure() {
        let registry = Arc::new(ConnectionRegistry::new());
        let hub = BroadcastHub::new(Arc::clone(&registry));

        let (_, mut rx1) = registered_receiver(&registry).await;
        let (_, rx2) = registered_receiver(&registry).await;
        let (_, mut rx3) = registered_receiver(&registry).await;

        // Kill the middle connection's writer.
        drop(rx2);

        hub.broadcast("update", None).await;

        assert_eq!(received_text(&mut rx1).as_deref(), Some("update"));
        assert_eq!(received_text(&mut rx3).as_deref(), Some("update"));

        // Lifecycle is not the hub's job: the dead connection stays
        // registered until its handler removes it.
        assert_eq!(registry.len().await, 3);
    }

    #[tokio::test]
    async fn test_broadcast_to_empty_registry() {
        let registry = Arc::new(ConnectionRegistry::new());
        let hub = BroadcastHub::new(Arc::clone(&registry));

        hub.broadcast("nobody home", None).await;
    }
}
