//! # Game Client Library
//!
//! Client side of the position-synchronization protocol. A session bridges
//! two worlds: an async domain that talks to the server, and a simulation
//! loop on its own OS thread that advances the locally controlled player.
//!
//! ## Data Flow
//!
//! ```text
//! transport.recv -> inbound queue -> router -> shared world
//! simulation     -> staging buffer -> outbound queue -> transport.send
//! ```
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! The bridge: one task owns the transport's read half and feeds the
//! inbound queue, one task owns the write half and drains the outbound
//! queue. Messages are decoded once, at this boundary.
//!
//! ### Game Module (`game`)
//! The shared world (player map plus the controlled id), the router that
//! applies inbound messages to it, and the FIFO staging buffer for moves
//! awaiting transmission.
//!
//! ### Simulation Module (`sim`)
//! The fixed-tick loop. It runs on a dedicated thread so a blocking tick
//! can never stall message delivery, reads the world, and stages a move
//! per tick. It never writes positions back; the server's echo does that.
//!
//! ### Input Module (`input`) / Render Module (`render`)
//! Narrow seams for the externally provided capabilities the loop needs:
//! "sample the input state" and "present a frame".
//!
//! ### Session Module (`session`) / Config Module (`config`)
//! Wiring for one connection's lifetime, and the persisted server address
//! the binary's retry loop reconnects to.

pub mod config;
pub mod game;
pub mod input;
pub mod network;
pub mod render;
pub mod session;
pub mod sim;
