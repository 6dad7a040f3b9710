//! The canonical hardware-state delta vocabulary.
//!
//! Every observed change — whether it arrived as a structured JSON
//! notification or was recovered from a log line — is expressed as exactly
//! one [`HardwareDelta`] variant before it reaches the state store. Deltas
//! are immutable and ephemeral: each is applied once and discarded, and
//! every variant is an absolute-value assignment (never a relative
//! adjustment), which is what makes double-reporting across the two input
//! paths safe.

use boardsync_core::{
    BusDeviceId, BusOp, DutyCycle, Frequency, PinLevel, PinMode, RunPhase, Severity,
};
use serde::{Deserialize, Serialize};

/// One observed hardware-state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareDelta {
    /// A pin was configured as input or output.
    PinModeSet { pin: u8, mode: PinMode },

    /// A pin's logic level was set; some engine versions bundle the mode.
    PinLevelSet {
        pin: u8,
        level: PinLevel,
        mode: Option<PinMode>,
    },

    /// A PWM channel changed lifecycle phase.
    PwmLifecycle { pin: u8, event: PwmTransition },

    /// A PWM channel changed parameters; absent fields are untouched.
    PwmParams {
        pin: u8,
        duty: Option<DutyCycle>,
        frequency: Option<Frequency>,
    },

    /// A bus device saw traffic (or its activity pulse expired).
    BusActivity { device: BusDeviceId, active: bool },

    /// A bus device completed a read or write.
    BusOperation {
        device: BusDeviceId,
        op: BusOp,
        register: Option<u8>,
        value: Option<u32>,
    },

    /// A program run started or finished on the engine.
    ExecutionPhase(RunPhase),

    /// A console line for display. Never stored, never dropped.
    ConsoleLine { text: String, severity: Severity },

    /// A DC motor's speed was set (absolute percent, never an increment).
    MotorSpeedSet {
        name: String,
        speed: f64,
        direction: Option<String>,
    },

    /// A sensor reported a reading.
    SensorReading {
        sensor: String,
        value: f64,
        unit: Option<String>,
    },
}

/// Lifecycle phases of a PWM channel.
///
/// `Init` creates the channel stopped; `Start`/`Stop` flip the running
/// flag. Parameters carried alongside a phase change are applied the same
/// way a [`HardwareDelta::PwmParams`] would apply them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PwmTransition {
    Init { frequency: Option<Frequency> },
    Start {
        duty: Option<DutyCycle>,
        frequency: Option<Frequency>,
    },
    Stop,
}

impl HardwareDelta {
    /// Convenience constructor for a console line.
    pub fn console(text: impl Into<String>, severity: Severity) -> Self {
        HardwareDelta::ConsoleLine {
            text: text.into(),
            severity,
        }
    }

    /// Convenience constructor for the warning line emitted when a frame
    /// cannot be understood.
    pub fn warning(text: impl Into<String>) -> Self {
        Self::console(text, Severity::Warning)
    }
}
