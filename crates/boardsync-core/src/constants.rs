//! Core constants for the engine wire protocol and display model.
//!
//! This module centralizes every protocol-level and display-model constant
//! used across the Boardsync workspace: the engine's fixed service address,
//! reconnect and activity-pulse timing, and the seeded peripheral sets the
//! renderer displays by default.
//!
//! # Usage
//!
//! ```
//! use boardsync_core::constants::*;
//! use std::time::Duration;
//!
//! let backoff = Duration::from_millis(RECONNECT_INTERVAL_MS);
//! assert_eq!(backoff.as_secs(), 3);
//! ```

// ============================================================================
// Engine Endpoint
// ============================================================================

/// TCP port of the execution engine's WebSocket service.
///
/// The engine always listens on this port; clients derive the full endpoint
/// from the host name plus this port and [`ENGINE_WS_PATH`].
pub const ENGINE_PORT: u16 = 8000;

/// Well-known WebSocket path of the execution engine.
///
/// # Examples
///
/// ```
/// use boardsync_core::constants::{ENGINE_PORT, ENGINE_WS_PATH};
///
/// let endpoint = format!("ws://localhost:{ENGINE_PORT}{ENGINE_WS_PATH}");
/// assert_eq!(endpoint, "ws://localhost:8000/ws/execute");
/// ```
pub const ENGINE_WS_PATH: &str = "/ws/execute";

// ============================================================================
// Timing
// ============================================================================

/// Fixed reconnect backoff between connection attempts (milliseconds).
///
/// The backoff is deliberately a fixed interval rather than exponential:
/// the emulated engine restarts quickly, so aggressive re-dial with a short
/// constant delay recovers fastest without flooding a dead host.
///
/// # Value: 3000ms (3 seconds)
pub const RECONNECT_INTERVAL_MS: u64 = 3000;

/// Display window for the transient bus-activity flag (milliseconds).
///
/// A bus device's `active` flag is raised on any SPI/I2C traffic and cleared
/// automatically after this window by a per-device timer. A burst of traffic
/// restarts the window rather than stacking timers.
///
/// # Value: 300ms
pub const BUS_ACTIVITY_WINDOW_MS: u64 = 300;

// ============================================================================
// PWM Defaults
// ============================================================================

/// Default PWM frequency when an init event omits one (Hz).
///
/// Matches the engine's PWM shim, which constructs channels at 100 Hz
/// unless user code specifies otherwise.
pub const DEFAULT_PWM_FREQUENCY_HZ: f64 = 100.0;

// ============================================================================
// Display Model
// ============================================================================

/// GPIO pins shown by the renderer by default.
///
/// This is a display filter only: deltas referencing pins outside this set
/// are still applied to the store (the protocol does not constrain pin
/// numbers), the renderer just has nowhere to draw them.
pub const DISPLAY_PINS: &[u8] = &[
    2, 3, 4, 14, 15, 17, 18, 27, 22, 23, 24, 10, 9, 25, 11, 8, 7,
];

/// Capacity of the per-session delta broadcast channel.
///
/// Subscribers that fall further behind than this lose the oldest deltas;
/// the display model is best-effort, so a lagging renderer repaints from
/// the store snapshot rather than replaying every transient.
pub const DELTA_CHANNEL_CAPACITY: usize = 256;
