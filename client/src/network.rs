//! Client network bridge: one task per transport half.

use crate::game::OutboundStaging;
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use shared::Message;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};

/// Capacity of the inbound and outbound message queues. A full queue
/// backpressures its producer instead of growing without bound.
pub const QUEUE_CAPACITY: usize = 256;

/// How often the staging pump moves staged messages to the outbound queue.
const PUMP_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Error)]
pub enum NetError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: tungstenite::Error,
    },
}

/// Connects to the server and spawns the two bridge tasks.
///
/// The returned receiver is the inbound queue, fed by the task owning the
/// transport's read half; the returned sender feeds the outbound queue,
/// drained by the task owning the write half. Each half belongs to exactly
/// one task, so the transport never sees two concurrent receives or sends.
///
/// Connection establishment is the only failure surfaced here; once the
/// bridge is up, transport loss shows up as the inbound queue closing.
pub async fn connect(
    addr: &str,
) -> Result<(mpsc::Receiver<Message>, mpsc::Sender<Message>), NetError> {
    let url = format!("ws://{}", addr);
    let (ws_stream, _) = connect_async(&url)
        .await
        .map_err(|source| NetError::Connect {
            addr: addr.to_string(),
            source,
        })?;
    info!("Connected to {}", url);

    let (mut write, mut read) = ws_stream.split();
    let (inbound_tx, inbound_rx) = mpsc::channel::<Message>(QUEUE_CAPACITY);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(QUEUE_CAPACITY);

    // Receiver task: transport -> inbound queue. Frames are decoded here,
    // once, so the router only ever sees typed messages. A malformed frame
    // costs one message, never the task.
    tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => match Message::decode(&text) {
                    Ok(msg) => {
                        if inbound_tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Dropping malformed message: {}", e),
                },
                Ok(WsMessage::Close(_)) => {
                    info!("Server closed the connection");
                    break;
                }
                Ok(_) => {} // ping/pong/binary carry no game state
                Err(e) => {
                    warn!("Receive failed: {}", e);
                    break;
                }
            }
        }
        // Dropping inbound_tx closes the inbound queue, which stops the
        // router and starts session teardown.
    });

    // Sender task: outbound queue -> transport. Ends once the queue closes,
    // after flushing whatever was already queued.
    tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let text = match msg.encode() {
                Ok(text) => text,
                Err(e) => {
                    warn!("Dropping unencodable message: {}", e);
                    continue;
                }
            };
            if write.send(WsMessage::Text(text)).await.is_err() {
                warn!("Send failed, stopping sender task");
                break;
            }
        }
    });

    Ok((inbound_rx, outbound_tx))
}

/// Moves staged messages into the outbound queue, oldest first.
///
/// The sole consumer of the staging buffer. Runs until the session aborts
/// it or the outbound queue closes under it.
pub async fn pump_outbound(staging: Arc<OutboundStaging>, outbound: mpsc::Sender<Message>) {
    let mut tick = tokio::time::interval(PUMP_INTERVAL);
    loop {
        tick.tick().await;
        for msg in staging.drain() {
            if outbound.send(msg).await.is_err() {
                return;
            }
        }
    }
}
