//! Connection configuration and lifecycle state.
//!
//! One [`crate::Session`] owns one logical connection to the execution
//! engine. The connection's lifecycle is published through a
//! `tokio::sync::watch` channel as a [`ConnectionState`]; user-facing code
//! reads it to drive a connectivity indicator and the command gateway
//! reads it to refuse sends while the link is down.

use std::fmt;
use std::time::Duration;

use boardsync_core::constants::{
    BUS_ACTIVITY_WINDOW_MS, ENGINE_PORT, ENGINE_WS_PATH, RECONNECT_INTERVAL_MS,
};
use boardsync_core::{Error, Result};
use url::Url;

/// Lifecycle state of the engine connection.
///
/// ```text
/// Idle ──► Connecting ──► Open ──► Closed
///              ▲                     │
///              └──── fixed backoff ──┘   (unless reconnection disabled)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Session constructed, no connection attempt yet.
    Idle,

    /// Dialing the engine.
    Connecting,

    /// Link established; commands may be sent.
    Open,

    /// Link lost or refused; a retry is pending unless disabled.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// Configuration for a [`crate::Session`].
///
/// # Example
///
/// ```
/// use boardsync_client::ClientConfig;
///
/// let config = ClientConfig::for_host("localhost").unwrap();
/// assert_eq!(config.endpoint.as_str(), "ws://localhost:8000/ws/execute");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint of the execution engine.
    pub endpoint: Url,

    /// Fixed backoff between reconnect attempts. Deliberately not
    /// exponential: the emulated engine restarts quickly.
    pub reconnect_interval: Duration,

    /// Whether to re-dial after the connection drops.
    pub reconnect: bool,

    /// How long a bus device's activity indicator stays lit after traffic.
    pub activity_window: Duration,
}

impl ClientConfig {
    /// Configuration for an explicit endpoint, with default timing.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            reconnect_interval: Duration::from_millis(RECONNECT_INTERVAL_MS),
            reconnect: true,
            activity_window: Duration::from_millis(BUS_ACTIVITY_WINDOW_MS),
        }
    }

    /// Derive the endpoint from a host name plus the engine's well-known
    /// port and path.
    ///
    /// # Errors
    /// Returns `Error::InvalidEndpoint` if the host does not form a valid
    /// URL.
    pub fn for_host(host: &str) -> Result<Self> {
        let raw = format!("ws://{host}:{ENGINE_PORT}{ENGINE_WS_PATH}");
        let endpoint = Url::parse(&raw).map_err(|e| Error::InvalidEndpoint(format!("{raw}: {e}")))?;
        Ok(Self::new(endpoint))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_host("localhost").unwrap()
    }
}
