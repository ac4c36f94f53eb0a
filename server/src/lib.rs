//! # Game Server Library
//!
//! Authoritative server for a shared-screen arcade shooter. Players sit at the
//! bottom of the field and shoot at aliens drifting down from the top; the
//! server owns the only copy of the game state and pushes a full snapshot to
//! every browser after each change.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! A fixed-rate tick (30Hz) moves bullets and aliens, resolves collisions,
//! and spawns new aliens. The simulation keeps running even when nobody is
//! connected.
//!
//! ### Intent Handling
//! Sessions send `move`, `shoot` and `newPlayer` intents. Each one is
//! applied the moment it arrives and followed by an immediate broadcast, so
//! a client never waits for the next tick to see its own input.
//!
//! ### State Broadcasting
//! Every tick and every applied intent publishes the complete state as a
//! JSON `update` event. An alien reaching a player additionally triggers the
//! game-over sequence: a collision message now, then a cleared message and a
//! reload instruction a few seconds later.
//!
//! ## Architecture Design
//!
//! ### Single Game Task
//! The game state, the session registry and the tick timer all live in one
//! task. Connection tasks hand decoded intents to it over a channel, which
//! gives run-to-completion semantics for every intent and tick without any
//! locking around the state.
//!
//! ### WebSocket Sessions
//! Each browser holds one WebSocket. A reader task decodes incoming frames,
//! a writer task drains the session's outbound mailbox; when either ends the
//! session is reported as disconnected.
//!
//! ### One Round At A Time
//! Any disconnect clears the whole game, players included. Remaining
//! sessions get their player back the next time they send `newPlayer`.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Session ids, lifecycle states, capacity limits and outbound mailboxes.
//!
//! ### Game Module (`game`)
//! The `GameState` aggregate and the intent handlers.
//!
//! ### Simulation Module (`simulation`)
//! The per-tick step: bullets, aliens, spawning.
//!
//! ### Network Module (`network`)
//! Listener, per-session tasks, the game loop and the game-over timer.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use arcade_server::network::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let server = Server::new(ServerConfig {
//!         addr: "127.0.0.1:3000".to_string(),
//!         ..ServerConfig::default()
//!     })
//!     .await?;
//!
//!     server.run().await
//! }
//! ```

pub mod client_manager;
pub mod game;
pub mod network;
pub mod simulation;
