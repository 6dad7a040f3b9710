//! End-to-end normalization of a realistic frame sequence.
//!
//! The corpus below is the frame-by-frame transcript of a small program
//! run: setup, a blink loop iteration, PWM usage, bus traffic and the
//! completion marker. Verifying the whole sequence at once catches
//! cross-frame ordering mistakes that per-frame unit tests cannot.

use boardsync_core::{BusDeviceId, BusOp, PinLevel, PinMode, RunPhase, Severity};
use boardsync_protocol::{EventNormalizer, HardwareDelta, PwmTransition};

#[test]
fn program_run_transcript_normalizes_in_order() {
    let normalizer = EventNormalizer::new();

    let transcript = [
        r#"{"type":"execution_started"}"#,
        r#"{"type":"output","content":"GPIO 17 setup as OUT"}"#,
        r#"{"type":"output","content":"GPIO 17 output: True"}"#,
        r#"{"type":"gpio_state_update","pin":17,"state":true,"mode":"output"}"#,
        r#"{"type":"emu_event","event":{"type":"pwm_event","event":"init","pin":18,"frequency":100,"duty_cycle":0}}"#,
        r#"{"type":"emu_event","event":{"type":"pwm_event","event":"start","pin":18,"frequency":100,"duty_cycle":50}}"#,
        r#"{"type":"emu_event","event":{"type":"i2c_event","event":"read","address":118,"register":208,"value":88}}"#,
        r#"{"type":"execution_completed"}"#,
    ];

    let deltas: Vec<HardwareDelta> = transcript
        .iter()
        .flat_map(|frame| normalizer.normalize_frame(frame))
        .collect();

    let expected: Vec<HardwareDelta> = vec![
        HardwareDelta::ExecutionPhase(RunPhase::Started),
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
        HardwareDelta::PinLevelSet {
            pin: 17,
            level: PinLevel::High,
            mode: Some(PinMode::Out),
        },
        HardwareDelta::PwmLifecycle {
            pin: 18,
            event: PwmTransition::Init {
                frequency: Some(boardsync_core::Frequency::new(100.0).unwrap()),
            },
        },
        HardwareDelta::PwmLifecycle {
            pin: 18,
            event: PwmTransition::Start {
                duty: Some(boardsync_core::DutyCycle::clamped(50.0)),
                frequency: Some(boardsync_core::Frequency::new(100.0).unwrap()),
            },
        },
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
        HardwareDelta::ExecutionPhase(RunPhase::Completed),
    ];

    assert_eq!(deltas, expected);
}

#[test]
fn hostile_frames_never_panic_and_always_yield_a_delta() {
    let normalizer = EventNormalizer::new();

    let hostile = [
        "",
        "null",
        "[]",
        "42",
        r#""just a string""#,
        r#"{"type":null}"#,
        r#"{"type":17}"#,
        r#"{"type":"output"}"#,
        r#"{"type":"emu_event"}"#,
        r#"{"type":"emu_event","event":{"type":"warp_event"}}"#,
        r#"{"type":"gpio_state_update","pin":-1,"state":true}"#,
        "{\"type\":\"output\",\"content\":\"\\u0000\"}",
    ];

    for frame in hostile {
        let deltas = normalizer.normalize_frame(frame);
        assert!(
            !deltas.is_empty(),
            "frame {frame:?} vanished without a visible trace"
        );
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// No byte sequence, however hostile, makes normalization panic.
        #[test]
        fn arbitrary_frames_never_panic(frame in ".{0,200}") {
            let normalizer = EventNormalizer::new();
            let _ = normalizer.normalize_frame(&frame);
        }

        /// Every output frame surfaces its content: each line of the
        /// payload reappears verbatim as a console delta.
        #[test]
        fn output_content_is_never_lost(content in "[ -~]{0,120}") {
            let normalizer = EventNormalizer::new();
            let frame = serde_json::json!({"type": "output", "content": content}).to_string();
            let deltas = normalizer.normalize_frame(&frame);

            let console: Vec<&str> = deltas
                .iter()
                .filter_map(|d| match d {
                    HardwareDelta::ConsoleLine { text, .. } => Some(text.as_str()),
                    _ => None,
                })
                .collect();

            let expected: Vec<&str> = if content.lines().next().is_none() {
                vec![""]
            } else {
                content.lines().collect()
            };
            prop_assert_eq!(console, expected);
        }
    }
}

#[test]
fn unknown_types_name_themselves_in_the_warning() {
    let normalizer = EventNormalizer::new();
    let deltas = normalizer.normalize_frame(r#"{"type":"stepper_position_update","name":"arm","position":200}"#);

    assert_eq!(deltas.len(), 1);
    let HardwareDelta::ConsoleLine { text, severity } = &deltas[0] else {
        panic!("expected console line, got {:?}", deltas[0]);
    };
    assert_eq!(*severity, Severity::Warning);
    assert!(text.contains("stepper_position_update"));
}
