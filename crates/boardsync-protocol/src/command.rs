//! Outbound command vocabulary.
//!
//! User intents (run code, toggle an input pin, move a slider) are encoded
//! as self-contained JSON commands: every command names its target and the
//! absolute value to apply, so the engine never needs a follow-up round
//! trip to interpret one. Commands are fire-and-forget — the resulting
//! state change, if any, comes back later through the ordinary inbound
//! path, which is what actually updates the store.

use boardsync_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// A command for the execution engine.
///
/// # Examples
///
/// ```
/// use boardsync_protocol::Command;
///
/// let cmd = Command::pwm_duty(18, 75.0);
/// assert_eq!(
///     cmd.encode().unwrap(),
///     r#"{"type":"pwm_control","pin":18,"action":"duty_change","duty_cycle":75.0}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Run user code on the engine.
    Execute { code: String },

    /// Stop the current run.
    Stop,

    /// Drive an input pin from the UI.
    GpioInput { pin: u8, state: bool },

    /// Set a DC motor's speed (absolute percent).
    MotorControl { name: String, speed: f64 },

    /// Step a stepper motor by a relative count (the engine tracks the
    /// absolute position and reports it back).
    StepperControl { name: String, steps: i64 },

    /// Adjust one PWM parameter.
    PwmControl {
        pin: u8,
        action: PwmAction,
        #[serde(skip_serializing_if = "Option::is_none")]
        duty_cycle: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        frequency: Option<f64>,
    },
}

/// Which PWM parameter a [`Command::PwmControl`] adjusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PwmAction {
    DutyChange,
    FreqChange,
}

impl Command {
    /// Build a duty-cycle change for one PWM channel.
    #[must_use]
    pub fn pwm_duty(pin: u8, duty_cycle: f64) -> Self {
        Command::PwmControl {
            pin,
            action: PwmAction::DutyChange,
            duty_cycle: Some(duty_cycle),
            frequency: None,
        }
    }

    /// Build a frequency change for one PWM channel.
    #[must_use]
    pub fn pwm_frequency(pin: u8, frequency: f64) -> Self {
        Command::PwmControl {
            pin,
            action: PwmAction::FreqChange,
            duty_cycle: None,
            frequency: Some(frequency),
        }
    }

    /// Encode this command as a JSON text frame.
    ///
    /// # Errors
    /// Returns `Error::MalformedFrame` if serialization fails (which only
    /// happens for non-finite floats smuggled into a numeric field).
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::MalformedFrame {
            message: e.to_string(),
        })
    }
}
