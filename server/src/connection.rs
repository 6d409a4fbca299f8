//! Per-connection lifecycle: handshake, registration, relay, cleanup.

use crate::hub::BroadcastHub;
use crate::registry::ConnectionRegistry;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::Message;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Accept loop. Every inbound TCP connection gets its own handler task.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<ConnectionRegistry>,
    hub: Arc<BroadcastHub>,
) -> std::io::Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        let registry = Arc::clone(&registry);
        let hub = Arc::clone(&hub);

        tokio::spawn(async move {
            handle_connection(stream, addr, registry, hub).await;
        });
    }
}

/// Drives one connection from handshake to cleanup.
///
/// The server never interprets relayed traffic: every text frame a client
/// sends is handed to the hub verbatim. The only messages the server
/// originates are `new_connection` announcements.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    registry: Arc<ConnectionRegistry>,
    hub: Arc<BroadcastHub>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();

    // Writer task: sole consumer of this connection's outbound channel and
    // sole writer of the transport's send half.
    let (sender, mut outbound) = mpsc::unbounded_channel::<WsMessage>();
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            if write.send(msg).await.is_err() {
                break;
            }
        }
    });

    let id = registry.register(sender.clone()).await;
    info!("Connection {} established from {}", id, addr);

    announce(&registry, &hub, &sender, id).await;

    // Relay loop: forward inbound frames to the hub until the peer goes
    // away. Errors here are this connection's problem only.
    while let Some(frame) = read.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => {
                debug!("Relaying message from connection {}: {}", id, text);
                hub.broadcast(&text, None).await;
            }
            Ok(WsMessage::Close(_)) => {
                info!("Connection {} sent close", id);
                break;
            }
            Ok(_) => {} // ping/pong/binary: nothing to relay
            Err(e) => {
                warn!("Connection {} receive failed: {}", id, e);
                break;
            }
        }
    }

    // Cleanup runs on every exit path of the relay loop.
    registry.unregister(id).await;
    drop(sender);
    let _ = writer.await;
    info!("Connection {} closed", id);
}

/// Introduces a freshly registered connection to the session.
///
/// The id assignment itself goes to the new connection only. The newcomer
/// then gets one announcement per already-live peer, and the peers get one
/// announcement of the newcomer, so every client can spawn remote players
/// before their first moves arrive.
async fn announce(
    registry: &ConnectionRegistry,
    hub: &BroadcastHub,
    sender: &mpsc::UnboundedSender<WsMessage>,
    id: u32,
) {
    match (Message::NewConnection { id }).encode() {
        Ok(text) => {
            let _ = sender.send(WsMessage::Text(text.clone()));
            hub.broadcast(&text, Some(id)).await;
        }
        Err(e) => warn!("Failed to encode announcement for connection {}: {}", id, e),
    }

    for (peer_id, _) in registry.snapshot().await {
        if peer_id == id {
            continue;
        }
        match (Message::NewConnection { id: peer_id }).encode() {
            Ok(text) => {
                let _ = sender.send(WsMessage::Text(text));
            }
            Err(e) => warn!("Failed to encode roster entry {}: {}", peer_id, e),
        }
    }
}
