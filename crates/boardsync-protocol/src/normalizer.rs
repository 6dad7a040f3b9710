//! Event normalization: two input shapes, one delta stream.
//!
//! The engine reports hardware changes over two independent paths:
//!
//! 1. **Structured** — JSON frames with an explicit `type`
//!    ([`EngineMessage`]). Each known type maps deterministically to zero
//!    or more [`HardwareDelta`] values.
//! 2. **Textual** — `output`/`error` frames carrying free text, which may
//!    *also* encode hardware changes as log lines. Every line runs through
//!    the extraction table ([`crate::extract_line`]) and is always emitted
//!    as a [`HardwareDelta::ConsoleLine`] as well, so text is never lost.
//!
//! Both paths can report the same physical change. Text-derived deltas are
//! treated as equally authoritative; no deduplication window exists because
//! delta application is idempotent — the store applying the same absolute
//! assignment twice is a no-op, never an error.
//!
//! Frames are processed strictly in arrival order, one at a time; the
//! normalizer never reorders or buffers across frames.
//!
//! Malformed frames and unrecognized `type` values become a single visible
//! warning line and the stream continues — nothing here is fatal.

use crate::delta::{HardwareDelta, PwmTransition};
use crate::extract::extract_line;
use crate::message::{EmuEventPayload, EngineMessage};
use boardsync_core::{BusDeviceId, BusOp, DutyCycle, Error, Frequency, RunPhase, Severity};

/// Turns inbound frames into the canonical [`HardwareDelta`] stream.
///
/// Stateless: every frame is normalized on its own. The type exists (rather
/// than free functions) so the session can hold one value per connection and
/// future engine dialects can carry configuration here.
///
/// # Examples
///
/// ```
/// use boardsync_protocol::{EventNormalizer, HardwareDelta};
/// use boardsync_core::Severity;
///
/// let normalizer = EventNormalizer::new();
/// let deltas = normalizer.normalize_frame(r#"{"type":"output","content":"GPIO 17 output: True"}"#);
///
/// // The console line is always present, the extracted delta alongside it.
/// assert_eq!(deltas.len(), 2);
/// assert!(matches!(&deltas[0], HardwareDelta::ConsoleLine { severity: Severity::Info, .. }));
/// assert!(matches!(&deltas[1], HardwareDelta::PinLevelSet { pin: 17, .. }));
/// ```
#[derive(Debug, Default)]
pub struct EventNormalizer;

impl EventNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Normalize one raw text frame.
    ///
    /// Never fails: frames that cannot be understood produce a
    /// [`Severity::Warning`] console line instead.
    #[must_use]
    pub fn normalize_frame(&self, frame: &str) -> Vec<HardwareDelta> {
        match EngineMessage::parse(frame) {
            Ok(message) => self.normalize(message),
            Err(Error::UnknownMessageType(type_name)) => {
                vec![HardwareDelta::warning(format!(
                    "Unknown message type: {type_name}"
                ))]
            }
            Err(e) => {
                vec![HardwareDelta::warning(format!("Dropped malformed frame: {e}"))]
            }
        }
    }

    /// Normalize an already-decoded engine message.
    #[must_use]
    pub fn normalize(&self, message: EngineMessage) -> Vec<HardwareDelta> {
        match message {
            EngineMessage::Output { content } => self.normalize_text(&content, Severity::Info),
            EngineMessage::Error { content } => self.normalize_text(&content, Severity::Error),
            EngineMessage::ExecutionStarted => {
                vec![HardwareDelta::ExecutionPhase(RunPhase::Started)]
            }
            EngineMessage::ExecutionCompleted | EngineMessage::ExecutionStopped => {
                vec![HardwareDelta::ExecutionPhase(RunPhase::Completed)]
            }
            EngineMessage::GpioStateUpdate { pin, state, mode } => {
                vec![HardwareDelta::PinLevelSet {
                    pin,
                    level: boardsync_core::PinLevel::from_bool(state),
                    mode: mode.and_then(|m| m.parse().ok()),
                }]
            }
            EngineMessage::PwmStateUpdate {
                pin,
                duty_cycle,
                frequency,
            } => {
                vec![HardwareDelta::PwmParams {
                    pin,
                    duty: duty_cycle.map(DutyCycle::clamped),
                    frequency: frequency.and_then(|hz| Frequency::new(hz).ok()),
                }]
            }
            EngineMessage::MotorStateUpdate {
                name,
                speed,
                direction,
            } => {
                vec![HardwareDelta::MotorSpeedSet {
                    name,
                    speed,
                    direction,
                }]
            }
            EngineMessage::SensorDataUpdate {
                sensor,
                value,
                unit,
            } => {
                vec![HardwareDelta::SensorReading {
                    sensor,
                    value,
                    unit,
                }]
            }
            EngineMessage::EmuEvent { event } => self.normalize_emu_event(event),
        }
    }

    /// Textual path: console line per line of content, plus whatever the
    /// extraction table recovers.
    fn normalize_text(&self, content: &str, severity: Severity) -> Vec<HardwareDelta> {
        let mut deltas = Vec::new();
        let mut saw_line = false;

        for line in content.lines() {
            saw_line = true;
            deltas.push(HardwareDelta::console(line, severity));
            deltas.extend(extract_line(line));
        }

        // An empty frame is still a (blank) console line.
        if !saw_line {
            deltas.push(HardwareDelta::console("", severity));
        }

        deltas
    }

    fn normalize_emu_event(&self, payload: EmuEventPayload) -> Vec<HardwareDelta> {
        match payload {
            EmuEventPayload::PwmEvent {
                event,
                pin,
                frequency,
                duty_cycle,
            } => {
                let frequency = frequency.and_then(|hz| Frequency::new(hz).ok());
                let duty = duty_cycle.map(DutyCycle::clamped);
                match event.as_str() {
                    "init" => vec![HardwareDelta::PwmLifecycle {
                        pin,
                        event: PwmTransition::Init { frequency },
                    }],
                    "start" => vec![HardwareDelta::PwmLifecycle {
                        pin,
                        event: PwmTransition::Start { duty, frequency },
                    }],
                    "stop" => vec![HardwareDelta::PwmLifecycle {
                        pin,
                        event: PwmTransition::Stop,
                    }],
                    "duty_change" => vec![HardwareDelta::PwmParams {
                        pin,
                        duty,
                        frequency: None,
                    }],
                    "freq_change" => vec![HardwareDelta::PwmParams {
                        pin,
                        duty: None,
                        frequency,
                    }],
                    other => vec![HardwareDelta::warning(format!(
                        "Unknown pwm_event sub-event: {other}"
                    ))],
                }
            }
            // Any SPI traffic pulses the device's activity indicator; the
            // shim only emits `transfer` today, but future sub-events are
            // still traffic.
            EmuEventPayload::SpiEvent {
                bus, device, ..
            } => {
                vec![HardwareDelta::BusActivity {
                    device: BusDeviceId::spi(bus, device),
                    active: true,
                }]
            }
            EmuEventPayload::I2cEvent {
                event,
                address,
                register,
                value,
            } => {
                let device = BusDeviceId::i2c(address);
                let mut deltas = vec![HardwareDelta::BusActivity {
                    device,
                    active: true,
                }];
                let op = match event.as_str() {
                    "read" => Some(BusOp::Read),
                    "write" => Some(BusOp::Write),
                    _ => None,
                };
                if let Some(op) = op {
                    deltas.push(HardwareDelta::BusOperation {
                        device,
                        op,
                        register,
                        value,
                    });
                }
                deltas
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardsync_core::{PinLevel, PinMode};

    fn normalizer() -> EventNormalizer {
        EventNormalizer::new()
    }

    #[test]
    fn output_frame_always_yields_console_line() {
        let deltas = normalizer()
            .normalize_frame(r#"{"type":"output","content":"nothing hardware here"}"#);
        assert_eq!(
            deltas,
            vec![HardwareDelta::console(
                "nothing hardware here",
                Severity::Info
            )]
        );
    }

    #[test]
    fn empty_output_frame_yields_blank_console_line() {
        let deltas = normalizer().normalize_frame(r#"{"type":"output","content":""}"#);
        assert_eq!(deltas, vec![HardwareDelta::console("", Severity::Info)]);
    }

    #[test]
    fn multiline_output_is_processed_per_line() {
        let deltas = normalizer().normalize_frame(
            r#"{"type":"output","content":"GPIO 17 setup as OUT\nGPIO 17 output: True"}"#,
        );
        assert_eq!(
            deltas,
            vec![
                HardwareDelta::console("GPIO 17 setup as OUT", Severity::Info),
                HardwareDelta::PinModeSet {
                    pin: 17,
                    mode: PinMode::Out,
                },
                HardwareDelta::console("GPIO 17 output: True", Severity::Info),
                HardwareDelta::PinLevelSet {
                    pin: 17,
                    level: PinLevel::High,
                    mode: Some(PinMode::Out),
                },
            ]
        );
    }

    #[test]
    fn error_frame_is_error_severity_and_still_extracted() {
        let deltas =
            normalizer().normalize_frame(r#"{"type":"error","content":"GPIO 4 output: False"}"#);
        assert_eq!(deltas.len(), 2);
        assert!(matches!(
            &deltas[0],
            HardwareDelta::ConsoleLine {
                severity: Severity::Error,
                ..
            }
        ));
    }

    #[test]
    fn execution_phase_frames() {
        assert_eq!(
            normalizer().normalize_frame(r#"{"type":"execution_started"}"#),
            vec![HardwareDelta::ExecutionPhase(RunPhase::Started)]
        );
        assert_eq!(
            normalizer().normalize_frame(r#"{"type":"execution_completed"}"#),
            vec![HardwareDelta::ExecutionPhase(RunPhase::Completed)]
        );
        assert_eq!(
            normalizer().normalize_frame(r#"{"type":"execution_stopped"}"#),
            vec![HardwareDelta::ExecutionPhase(RunPhase::Completed)]
        );
    }

    #[test]
    fn gpio_update_with_unparseable_mode_degrades_to_level_only() {
        let deltas = normalizer().normalize_frame(
            r#"{"type":"gpio_state_update","pin":9,"state":true,"mode":"diagonal"}"#,
        );
        assert_eq!(
            deltas,
            vec![HardwareDelta::PinLevelSet {
                pin: 9,
                level: PinLevel::High,
                mode: None,
            }]
        );
    }

    #[test]
    fn pwm_state_update_maps_to_params() {
        let deltas = normalizer().normalize_frame(
            r#"{"type":"pwm_state_update","pin":12,"duty_cycle":30,"frequency":500}"#,
        );
        assert_eq!(
            deltas,
            vec![HardwareDelta::PwmParams {
                pin: 12,
                duty: Some(DutyCycle::clamped(30.0)),
                frequency: Some(Frequency::new(500.0).unwrap()),
            }]
        );
    }

    #[test]
    fn pwm_state_update_invalid_frequency_is_dropped_not_fatal() {
        let deltas = normalizer().normalize_frame(
            r#"{"type":"pwm_state_update","pin":12,"duty_cycle":30,"frequency":0}"#,
        );
        assert_eq!(
            deltas,
            vec![HardwareDelta::PwmParams {
                pin: 12,
                duty: Some(DutyCycle::clamped(30.0)),
                frequency: None,
            }]
        );
    }

    #[test]
    fn i2c_read_event_expands_to_activity_and_operation() {
        let deltas = normalizer().normalize_frame(
            r#"{"type":"emu_event","event":{"type":"i2c_event","event":"read","address":118,"register":208,"value":88}}"#,
        );
        assert_eq!(
            deltas,
            vec![
                HardwareDelta::BusActivity {
                    device: BusDeviceId::i2c(0x76),
                    active: true,
                },
                HardwareDelta::BusOperation {
                    device: BusDeviceId::i2c(0x76),
                    op: BusOp::Read,
                    register: Some(0xD0),
                    value: Some(0x58),
                },
            ]
        );
    }

    #[test]
    fn spi_transfer_event_is_activity_only() {
        let deltas = normalizer().normalize_frame(
            r#"{"type":"emu_event","event":{"type":"spi_event","event":"transfer","bus":0,"device":0,"data":[1,128,0]}}"#,
        );
        assert_eq!(
            deltas,
            vec![HardwareDelta::BusActivity {
                device: BusDeviceId::spi(0, 0),
                active: true,
            }]
        );
    }

    #[test]
    fn pwm_emu_events_map_to_lifecycle() {
        let deltas = normalizer().normalize_frame(
            r#"{"type":"emu_event","event":{"type":"pwm_event","event":"init","pin":18,"frequency":100,"duty_cycle":0}}"#,
        );
        assert_eq!(
            deltas,
            vec![HardwareDelta::PwmLifecycle {
                pin: 18,
                event: PwmTransition::Init {
                    frequency: Some(Frequency::new(100.0).unwrap()),
                },
            }]
        );

        let deltas = normalizer().normalize_frame(
            r#"{"type":"emu_event","event":{"type":"pwm_event","event":"stop","pin":18,"frequency":100,"duty_cycle":0}}"#,
        );
        assert_eq!(
            deltas,
            vec![HardwareDelta::PwmLifecycle {
                pin: 18,
                event: PwmTransition::Stop,
            }]
        );
    }

    #[test]
    fn unknown_pwm_sub_event_becomes_warning() {
        let deltas = normalizer().normalize_frame(
            r#"{"type":"emu_event","event":{"type":"pwm_event","event":"wobble","pin":18}}"#,
        );
        assert_eq!(deltas.len(), 1);
        assert!(matches!(
            &deltas[0],
            HardwareDelta::ConsoleLine {
                severity: Severity::Warning,
                ..
            }
        ));
    }

    #[test]
    fn malformed_and_unknown_frames_become_warnings() {
        let deltas = normalizer().normalize_frame("definitely { not json");
        assert!(matches!(
            &deltas[0],
            HardwareDelta::ConsoleLine {
                severity: Severity::Warning,
                ..
            }
        ));

        let deltas = normalizer().normalize_frame(r#"{"type":"hologram_update"}"#);
        assert_eq!(
            deltas,
            vec![HardwareDelta::warning("Unknown message type: hologram_update")]
        );
    }

    #[test]
    fn motor_and_sensor_updates() {
        let deltas = normalizer().normalize_frame(
            r#"{"type":"motor_state_update","name":"left","speed":60,"direction":"forward"}"#,
        );
        assert_eq!(
            deltas,
            vec![HardwareDelta::MotorSpeedSet {
                name: "left".to_string(),
                speed: 60.0,
                direction: Some("forward".to_string()),
            }]
        );

        let deltas = normalizer().normalize_frame(
            r#"{"type":"sensor_data_update","sensor":"temperature","value":25.3,"unit":"C"}"#,
        );
        assert_eq!(
            deltas,
            vec![HardwareDelta::SensorReading {
                sensor: "temperature".to_string(),
                value: 25.3,
                unit: Some("C".to_string()),
            }]
        );
    }
}
