//! Connection layer for the Boardsync hardware-state client.
//!
//! This crate owns everything with a socket or a clock in it: the
//! WebSocket connection to the execution engine with fixed-interval
//! reconnection, the session loop that drives frames through the
//! normalizer into the peripheral store, the per-device activity-pulse
//! timers, and the outbound command gateway.
//!
//! # Components
//!
//! - [`Session`]: one connection, one store, one ordered delta stream
//! - [`CommandGateway`]: fire-and-forget command sending
//! - [`ClientConfig`] / [`ConnectionState`]: configuration and lifecycle
//!
//! # Example
//!
//! ```no_run
//! use boardsync_client::{ClientConfig, Session};
//! use boardsync_protocol::Command;
//!
//! # async fn example() -> boardsync_core::Result<()> {
//! let session = Session::connect(ClientConfig::for_host("localhost")?);
//!
//! // Run a program on the engine; results stream back as deltas.
//! session.gateway().send(&Command::Execute {
//!     code: "import RPi.GPIO as GPIO".to_string(),
//! })?;
//! # Ok(())
//! # }
//! ```

mod activity;
mod connection;
mod gateway;
mod session;

pub use connection::{ClientConfig, ConnectionState};
pub use gateway::CommandGateway;
pub use session::Session;
