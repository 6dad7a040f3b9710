//! Per-peripheral state records.
//!
//! These are plain data: the transition rules that mutate them live in
//! [`crate::store::PeripheralStore`]. All fields are public — the renderer
//! reads them directly off a store snapshot.

use boardsync_core::{BusOp, DutyCycle, Frequency, PinLevel, PinMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of one GPIO pin.
///
/// Mode, level and PWM sub-state are independently settable: a pin carrying
/// a PWM channel still has a mode and a level for display purposes, and the
/// engine may set any of the three without mentioning the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PinState {
    pub mode: PinMode,
    pub level: PinLevel,
}

/// State of one PWM channel, keyed by pin.
///
/// Created on the first `init` lifecycle event for the pin; a `stop` marks
/// it stopped but keeps duty and frequency so a later `start` resumes
/// without re-initialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PwmChannelState {
    pub running: bool,
    pub duty: DutyCycle,
    pub frequency: Frequency,
}

/// State of one device on an SPI or I2C bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BusDeviceState {
    /// Human-readable device label for seeded devices ("BMP280 Sensor").
    pub label: Option<String>,

    /// Transient activity pulse. Raised by traffic, cleared by a timer in
    /// the owning session — never by a stream delta from the engine.
    pub active: bool,

    /// Most recent completed operation, if any.
    pub last_operation: Option<BusOperationRecord>,
}

impl BusDeviceState {
    /// A seeded device with a display label and no history.
    #[must_use]
    pub fn labeled(label: &str) -> Self {
        BusDeviceState {
            label: Some(label.to_string()),
            ..Default::default()
        }
    }
}

/// Snapshot of a completed bus operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusOperationRecord {
    pub op: BusOp,
    pub register: Option<u8>,
    pub value: Option<u32>,

    /// Wall-clock time the operation was observed by this client.
    pub timestamp: DateTime<Utc>,
}

impl BusOperationRecord {
    /// Record an operation observed now.
    #[must_use]
    pub fn observed(op: BusOp, register: Option<u8>, value: Option<u32>) -> Self {
        BusOperationRecord {
            op,
            register,
            value,
            timestamp: Utc::now(),
        }
    }

    /// Whether two records describe the same operation, ignoring when each
    /// was observed.
    #[must_use]
    pub fn same_operation(&self, other: &Self) -> bool {
        self.op == other.op && self.register == other.register && self.value == other.value
    }
}

/// State of one DC motor, keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MotorState {
    /// Speed as an absolute percent, 0-100.
    pub speed: f64,
    pub direction: Option<String>,
    pub running: bool,
}

/// Last reported reading of one sensor, keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SensorState {
    pub value: f64,
    pub unit: Option<String>,
}
