//! Textual event extraction.
//!
//! The engine narrates hardware activity as human-readable log lines in
//! addition to — and for older engine builds, instead of — structured
//! frames. This module holds the fixed table of `(pattern, constructor)`
//! pairs that recovers [`HardwareDelta`] values from those lines.
//!
//! The table is deliberately separate from any rendering concern so each
//! pattern can be unit-tested against literal log lines. Lines that match
//! nothing are simply display text; lines that match still also reach the
//! console verbatim (the normalizer emits the `ConsoleLine` — extraction
//! never consumes text).
//!
//! # Recognized Lines
//!
//! ```text
//! GPIO 17 output: True
//! GPIO 17 setup as OUT
//! PWM initialized on pin 18 with frequency 100Hz
//! PWM started on pin 18 with duty cycle 50%
//! PWM duty cycle changed to 75% on pin 18
//! PWM frequency changed to 1000Hz on pin 18
//! PWM stopped on pin 18
//! Motor left_wheel speed set to 80%
//! ```

use crate::delta::{HardwareDelta, PwmTransition};
use boardsync_core::{DutyCycle, Frequency, PinLevel, PinMode};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// One entry of the extraction table: a pattern and the delta it builds.
///
/// The constructor returns `None` when a capture does not survive
/// conversion (e.g. a pin number too large for `u8`); such lines degrade
/// to plain console text.
pub struct LineExtractor {
    pattern: Regex,
    build: fn(&Captures) -> Option<HardwareDelta>,
}

impl LineExtractor {
    fn new(pattern: &str, build: fn(&Captures) -> Option<HardwareDelta>) -> Self {
        Self {
            // Table patterns are compile-time literals; a failure here is a
            // programming error, not an input error.
            pattern: Regex::new(pattern).unwrap(),
            build,
        }
    }

    /// Apply this extractor to a line.
    pub fn extract(&self, line: &str) -> Option<HardwareDelta> {
        self.pattern.captures(line).and_then(|caps| (self.build)(&caps))
    }
}

fn capture_u8(caps: &Captures, index: usize) -> Option<u8> {
    caps.get(index)?.as_str().parse().ok()
}

fn capture_f64(caps: &Captures, index: usize) -> Option<f64> {
    caps.get(index)?.as_str().parse().ok()
}

static EXTRACTORS: LazyLock<Vec<LineExtractor>> = LazyLock::new(|| {
    vec![
        // GPIO 17 output: True
        LineExtractor::new(r"(?i)GPIO (\d+) output: (True|False)", |caps| {
            let pin = capture_u8(caps, 1)?;
            let high = caps.get(2)?.as_str().eq_ignore_ascii_case("true");
            Some(HardwareDelta::PinLevelSet {
                pin,
                level: PinLevel::from_bool(high),
                mode: Some(PinMode::Out),
            })
        }),
        // GPIO 17 setup as OUT
        LineExtractor::new(r"(?i)GPIO (\d+) setup as (OUT|IN)\b", |caps| {
            let pin = capture_u8(caps, 1)?;
            let mode = caps.get(2)?.as_str().parse().ok()?;
            Some(HardwareDelta::PinModeSet { pin, mode })
        }),
        // PWM initialized on pin 18 with frequency 100Hz
        LineExtractor::new(
            r"(?i)PWM initialized on pin (\d+) with frequency ([\d.]+)\s*Hz",
            |caps| {
                let pin = capture_u8(caps, 1)?;
                let frequency = capture_f64(caps, 2).and_then(|hz| Frequency::new(hz).ok());
                Some(HardwareDelta::PwmLifecycle {
                    pin,
                    event: PwmTransition::Init { frequency },
                })
            },
        ),
        // PWM started on pin 18 with duty cycle 50%
        LineExtractor::new(
            r"(?i)PWM started on pin (\d+) with duty cycle ([\d.]+)\s*%",
            |caps| {
                let pin = capture_u8(caps, 1)?;
                let duty = capture_f64(caps, 2).map(DutyCycle::clamped);
                Some(HardwareDelta::PwmLifecycle {
                    pin,
                    event: PwmTransition::Start {
                        duty,
                        frequency: None,
                    },
                })
            },
        ),
        // PWM duty cycle changed to 75% on pin 18
        LineExtractor::new(
            r"(?i)PWM duty cycle changed to ([\d.]+)\s*% on pin (\d+)",
            |caps| {
                let duty = capture_f64(caps, 1).map(DutyCycle::clamped);
                let pin = capture_u8(caps, 2)?;
                Some(HardwareDelta::PwmParams {
                    pin,
                    duty,
                    frequency: None,
                })
            },
        ),
        // PWM frequency changed to 1000Hz on pin 18
        LineExtractor::new(
            r"(?i)PWM frequency changed to ([\d.]+)\s*Hz on pin (\d+)",
            |caps| {
                let frequency = capture_f64(caps, 1).and_then(|hz| Frequency::new(hz).ok())?;
                let pin = capture_u8(caps, 2)?;
                Some(HardwareDelta::PwmParams {
                    pin,
                    duty: None,
                    frequency: Some(frequency),
                })
            },
        ),
        // PWM stopped on pin 18
        LineExtractor::new(r"(?i)PWM stopped on pin (\d+)", |caps| {
            let pin = capture_u8(caps, 1)?;
            Some(HardwareDelta::PwmLifecycle {
                pin,
                event: PwmTransition::Stop,
            })
        }),
        // Motor left_wheel speed set to 80%
        LineExtractor::new(r"(?i)Motor (\w+).*speed set to ([\d.]+)\s*%", |caps| {
            let name = caps.get(1)?.as_str().to_string();
            let speed = capture_f64(caps, 2)?;
            Some(HardwareDelta::MotorSpeedSet {
                name,
                speed,
                direction: None,
            })
        }),
    ]
});

/// Run the full extraction table over one log line.
///
/// Every matching extractor contributes, in table order. Most lines match
/// at most one pattern; an empty result means the line is display-only.
///
/// # Examples
///
/// ```
/// use boardsync_protocol::extract_line;
///
/// assert_eq!(extract_line("GPIO 17 output: True").len(), 1);
/// assert!(extract_line("plain program output").is_empty());
/// ```
#[must_use]
pub fn extract_line(line: &str) -> Vec<HardwareDelta> {
    EXTRACTORS
        .iter()
        .filter_map(|extractor| extractor.extract(line))
        .collect()
}
