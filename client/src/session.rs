//! One connection's worth of client: bridge, router, pump, simulation.

use crate::game::{MessageRouter, OutboundStaging, World, STAGING_CAPACITY};
use crate::input::InputSource;
use crate::network::{self, NetError};
use crate::render::FrameSink;
use crate::sim::SimulationLoop;
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Runs a session until its transport closes.
///
/// Only connection establishment can fail here; once the bridge is up,
/// every failure is contained inside the session and ends it cleanly. The
/// caller decides whether to reconnect.
pub async fn run(
    addr: &str,
    input: Box<dyn InputSource>,
    frames: Box<dyn FrameSink>,
) -> Result<(), NetError> {
    let (inbound_rx, outbound_tx) = network::connect(addr).await?;

    let world = Arc::new(Mutex::new(World::new()));
    let staging = Arc::new(OutboundStaging::new(STAGING_CAPACITY));
    let shutdown = Arc::new(AtomicBool::new(false));

    let sim = SimulationLoop::new(
        Arc::clone(&world),
        Arc::clone(&staging),
        input,
        frames,
        Arc::clone(&shutdown),
    )
    .spawn();

    let pump = tokio::spawn(network::pump_outbound(
        Arc::clone(&staging),
        outbound_tx.clone(),
    ));

    // The router runs until the bridge drops the inbound queue, which is
    // the transport-closed signal.
    MessageRouter::new(world, inbound_rx).run().await;

    info!("Session ending, stopping simulation");
    shutdown.store(true, Ordering::Relaxed);

    match tokio::task::spawn_blocking(move || sim.join()).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => warn!("Simulation thread panicked"),
        Err(e) => warn!("Failed to join simulation thread: {}", e),
    }

    // With the simulation stopped, one final drain flushes whatever it
    // staged last; dropping the queue sender then lets the bridge's sender
    // task send the remainder and exit.
    pump.abort();
    for msg in staging.drain() {
        if outbound_tx.send(msg).await.is_err() {
            break;
        }
    }
    drop(outbound_tx);

    Ok(())
}
