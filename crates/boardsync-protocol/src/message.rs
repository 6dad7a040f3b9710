//! Inbound engine message shapes.
//!
//! The execution engine sends JSON text frames discriminated by a `type`
//! field. This module mirrors that vocabulary one-to-one; turning a
//! message into state deltas is the normalizer's job
//! ([`crate::EventNormalizer`]), not this module's.
//!
//! # Frame Format
//!
//! ```text
//! {"type": "gpio_state_update", "pin": 17, "state": true, "mode": "output"}
//! {"type": "emu_event", "event": {"type": "i2c_event", "event": "write",
//!                                 "address": 118, "register": 208, "value": 88}}
//! ```
//!
//! # Unknown Types
//!
//! [`EngineMessage::parse`] distinguishes a frame that is not JSON (or is
//! missing fields) from a frame whose `type` is simply newer than this
//! client — the two produce different errors so callers can phrase the
//! warning they surface. Neither is fatal to the stream.

use boardsync_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Message types this client understands.
///
/// A frame whose `type` is not in this list parses to
/// [`Error::UnknownMessageType`] rather than a malformed-frame error.
pub const KNOWN_MESSAGE_TYPES: &[&str] = &[
    "output",
    "error",
    "execution_started",
    "execution_completed",
    "execution_stopped",
    "gpio_state_update",
    "pwm_state_update",
    "motor_state_update",
    "sensor_data_update",
    "emu_event",
];

/// A decoded inbound frame from the execution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineMessage {
    /// Free-text program output. May additionally encode hardware changes
    /// as log lines; the normalizer runs the extractor table over it.
    Output { content: String },

    /// Free-text error output from the engine or the user program.
    Error { content: String },

    /// A fresh program run began.
    ExecutionStarted,

    /// The program run finished.
    ExecutionCompleted,

    /// The program run was stopped on request. Later engine versions emit
    /// this instead of `execution_completed` after a stop command.
    ExecutionStopped,

    /// A pin's level (and usually mode) changed.
    GpioStateUpdate {
        pin: u8,
        state: bool,
        #[serde(default)]
        mode: Option<String>,
    },

    /// A PWM channel's parameters changed.
    PwmStateUpdate {
        pin: u8,
        #[serde(default)]
        duty_cycle: Option<f64>,
        #[serde(default)]
        frequency: Option<f64>,
    },

    /// A DC motor's speed changed.
    MotorStateUpdate {
        name: String,
        speed: f64,
        #[serde(default)]
        direction: Option<String>,
    },

    /// A sensor reported a value.
    SensorDataUpdate {
        sensor: String,
        value: f64,
        #[serde(default)]
        unit: Option<String>,
    },

    /// Envelope for peripheral events the emulation shims emit on stdout
    /// and the engine forwards as structured frames.
    EmuEvent { event: EmuEventPayload },
}

/// The peripheral event inside an `emu_event` envelope.
///
/// Sub-event kinds (`event` field) are kept as strings: the shims grow new
/// kinds faster than clients update, and an unknown kind should degrade to
/// a warning line, not a decode failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmuEventPayload {
    /// PWM shim event: `init`, `start`, `stop`, `duty_change`, `freq_change`.
    PwmEvent {
        event: String,
        pin: u8,
        #[serde(default)]
        frequency: Option<f64>,
        #[serde(default)]
        duty_cycle: Option<f64>,
    },

    /// SPI shim event: `transfer`.
    SpiEvent {
        event: String,
        bus: u8,
        device: u8,
        #[serde(default)]
        data: Vec<u32>,
    },

    /// I2C shim event: `read`, `write`.
    I2cEvent {
        event: String,
        address: u8,
        #[serde(default)]
        register: Option<u8>,
        #[serde(default)]
        value: Option<u32>,
    },
}

impl EngineMessage {
    /// Parse one inbound text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedFrame`] if the frame is not a JSON object, has
    ///   no string `type` field, or a known type fails to decode.
    /// - [`Error::UnknownMessageType`] if the `type` is well-formed but
    ///   not one of [`KNOWN_MESSAGE_TYPES`].
    ///
    /// # Examples
    ///
    /// ```
    /// use boardsync_protocol::EngineMessage;
    ///
    /// let msg = EngineMessage::parse(r#"{"type":"execution_started"}"#).unwrap();
    /// assert_eq!(msg, EngineMessage::ExecutionStarted);
    ///
    /// assert!(EngineMessage::parse("not json").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(input).map_err(|e| Error::MalformedFrame {
                message: e.to_string(),
            })?;

        let type_name = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| Error::MalformedFrame {
                message: "frame has no string `type` field".to_string(),
            })?;

        if !KNOWN_MESSAGE_TYPES.contains(&type_name) {
            return Err(Error::UnknownMessageType(type_name.to_string()));
        }

        serde_json::from_value(value).map_err(|e| Error::MalformedFrame {
            message: e.to_string(),
        })
    }
}
