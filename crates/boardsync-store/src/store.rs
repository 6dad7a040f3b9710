//! The peripheral state store.
//!
//! The store owns every keyed state collection (pins, PWM channels, bus
//! devices, motors, sensors) and applies [`HardwareDelta`] values to them
//! under one algorithmic guarantee — **idempotent application**: every
//! delta is an absolute-value assignment, so applying the same delta twice
//! in a row produces the same observable state as applying it once. That
//! guarantee is what makes the dual structured/textual reporting paths
//! safe without any cross-path deduplication.
//!
//! # Transition Rules
//!
//! - Pin mode: unconditional overwrite. Switching a pin out→in clears the
//!   level previously pushed by output writes — the level is
//!   input-controlled from then on.
//! - Pin level: overwrite; a bundled mode (legacy message shape) is applied
//!   alongside.
//! - PWM lifecycle: `init` (re)creates the channel stopped; `start`/`stop`
//!   flip the running flag; `stop` retains parameters for re-start.
//! - PWM params: partial overwrite — absent fields are preserved, so a
//!   duty-only change never clobbers frequency and vice versa.
//! - Bus activity: flag assignment. Scheduling the clear-after-window
//!   action is the owning session's job, not the store's.
//! - Bus operation: last-operation snapshot overwrite, stamped at
//!   observation time.
//! - Execution started: bulk reset of pin/PWM/motor state to defaults and
//!   clearing of sensor readings — a fresh program run implies a clean
//!   hardware slate. Bus device identities (and their histories) survive.
//! - Console lines: not state; ignored.
//!
//! # Unknown Peripherals
//!
//! A delta referencing a pin, device or name the store has never seen
//! creates the entry lazily. The well-known pin list is a display filter
//! for the renderer, not a validity constraint on the protocol.
//!
//! # Thread Safety
//!
//! Not thread-safe by design: exactly one frame is in flight at a time, so
//! the session applies deltas from a single task. Wrap in
//! `tokio::sync::Mutex` to share snapshots with a renderer task.

use std::collections::HashMap;

use boardsync_core::{BusDeviceId, DutyCycle, Frequency, PinLevel, PinMode, RunPhase};
use boardsync_protocol::{HardwareDelta, PwmTransition};

use crate::peripherals::{
    BusDeviceState, BusOperationRecord, MotorState, PinState, PwmChannelState, SensorState,
};

/// The standard bus devices every session displays, seeded at startup.
///
/// Seeded identities are permanent: execution resets never remove them.
pub const STANDARD_BUS_DEVICES: &[(BusDeviceId, &str)] = &[
    (BusDeviceId::Spi { bus: 0, device: 0 }, "MCP3008 ADC"),
    (BusDeviceId::Spi { bus: 0, device: 1 }, "WS2812 LED Strip"),
    (BusDeviceId::I2c { address: 0x76 }, "BMP280 Sensor"),
    (BusDeviceId::I2c { address: 0x27 }, "LCD Display"),
    (BusDeviceId::I2c { address: 0x68 }, "MPU6050 Gyro"),
];

/// Keyed peripheral state with idempotent delta application.
///
/// # Examples
///
/// ```
/// use boardsync_store::PeripheralStore;
/// use boardsync_protocol::HardwareDelta;
/// use boardsync_core::{PinLevel, PinMode};
///
/// let mut store = PeripheralStore::with_standard_devices();
///
/// let delta = HardwareDelta::PinLevelSet {
///     pin: 17,
///     level: PinLevel::High,
///     mode: Some(PinMode::Out),
/// };
/// assert!(store.apply(&delta));   // state changed
/// assert!(!store.apply(&delta));  // idempotent re-application
///
/// let pin = store.pin(17).unwrap();
/// assert_eq!(pin.level, PinLevel::High);
/// assert_eq!(pin.mode, PinMode::Out);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PeripheralStore {
    pins: HashMap<u8, PinState>,
    pwm_channels: HashMap<u8, PwmChannelState>,
    bus_devices: HashMap<BusDeviceId, BusDeviceState>,
    motors: HashMap<String, MotorState>,
    sensors: HashMap<String, SensorState>,
}

impl PeripheralStore {
    /// An empty store with no seeded devices.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with [`STANDARD_BUS_DEVICES`].
    #[must_use]
    pub fn with_standard_devices() -> Self {
        let mut store = Self::new();
        for (id, label) in STANDARD_BUS_DEVICES {
            store
                .bus_devices
                .insert(*id, BusDeviceState::labeled(label));
        }
        store
    }

    /// Apply one delta.
    ///
    /// Returns `true` if observable state changed, `false` for idempotent
    /// re-applications and display-only deltas. Callers may use the flag
    /// to coalesce renderer notifications; they must not use it to decide
    /// activity-timer scheduling (a repeated activity pulse reports
    /// unchanged state but still restarts the display window).
    pub fn apply(&mut self, delta: &HardwareDelta) -> bool {
        match delta {
            HardwareDelta::PinModeSet { pin, mode } => self.apply_pin_mode(*pin, *mode),
            HardwareDelta::PinLevelSet { pin, level, mode } => {
                self.apply_pin_level(*pin, *level, *mode)
            }
            HardwareDelta::PwmLifecycle { pin, event } => self.apply_pwm_lifecycle(*pin, event),
            HardwareDelta::PwmParams {
                pin,
                duty,
                frequency,
            } => self.apply_pwm_params(*pin, *duty, *frequency),
            HardwareDelta::BusActivity { device, active } => {
                let entry = self.bus_devices.entry(*device).or_default();
                let changed = entry.active != *active;
                entry.active = *active;
                changed
            }
            HardwareDelta::BusOperation {
                device,
                op,
                register,
                value,
            } => {
                let entry = self.bus_devices.entry(*device).or_default();
                entry.last_operation = Some(BusOperationRecord::observed(*op, *register, *value));
                // A repeated identical operation is still a fresh
                // observation (its timestamp advances).
                true
            }
            HardwareDelta::ExecutionPhase(RunPhase::Started) => self.reset_for_run(),
            HardwareDelta::ExecutionPhase(RunPhase::Completed) => false,
            HardwareDelta::ConsoleLine { .. } => false,
            HardwareDelta::MotorSpeedSet {
                name,
                speed,
                direction,
            } => self.apply_motor_speed(name, *speed, direction.as_deref()),
            HardwareDelta::SensorReading {
                sensor,
                value,
                unit,
            } => {
                let next = SensorState {
                    value: *value,
                    unit: unit.clone(),
                };
                let changed = self.sensors.get(sensor) != Some(&next);
                self.sensors.insert(sensor.clone(), next);
                changed
            }
        }
    }

    fn apply_pin_mode(&mut self, pin: u8, mode: PinMode) -> bool {
        let entry = self.pins.entry(pin).or_default();
        let mut changed = entry.mode != mode;

        // Leaving output mode invalidates the engine-driven level; the pin
        // is input-controlled from here until the next output write.
        if mode == PinMode::In && entry.mode == PinMode::Out && entry.level != PinLevel::Low {
            entry.level = PinLevel::Low;
            changed = true;
        }
        entry.mode = mode;
        changed
    }

    fn apply_pin_level(&mut self, pin: u8, level: PinLevel, mode: Option<PinMode>) -> bool {
        let entry = self.pins.entry(pin).or_default();
        let mut changed = entry.level != level;
        entry.level = level;

        if let Some(mode) = mode {
            changed |= entry.mode != mode;
            entry.mode = mode;
        }
        changed
    }

    fn apply_pwm_lifecycle(&mut self, pin: u8, event: &PwmTransition) -> bool {
        match event {
            PwmTransition::Init { frequency } => {
                let next = PwmChannelState {
                    running: false,
                    duty: DutyCycle::default(),
                    frequency: frequency.unwrap_or_default(),
                };
                let changed = self.pwm_channels.get(&pin) != Some(&next);
                self.pwm_channels.insert(pin, next);
                changed
            }
            PwmTransition::Start { duty, frequency } => {
                let entry = self.pwm_channels.entry(pin).or_default();
                let mut changed = !entry.running;
                entry.running = true;
                if let Some(duty) = duty {
                    changed |= entry.duty != *duty;
                    entry.duty = *duty;
                }
                if let Some(frequency) = frequency {
                    changed |= entry.frequency != *frequency;
                    entry.frequency = *frequency;
                }
                changed
            }
            PwmTransition::Stop => {
                let entry = self.pwm_channels.entry(pin).or_default();
                let changed = entry.running;
                entry.running = false;
                changed
            }
        }
    }

    fn apply_pwm_params(
        &mut self,
        pin: u8,
        duty: Option<DutyCycle>,
        frequency: Option<Frequency>,
    ) -> bool {
        let entry = self.pwm_channels.entry(pin).or_default();
        let mut changed = false;
        if let Some(duty) = duty {
            changed |= entry.duty != duty;
            entry.duty = duty;
        }
        if let Some(frequency) = frequency {
            changed |= entry.frequency != frequency;
            entry.frequency = frequency;
        }
        changed
    }

    fn apply_motor_speed(&mut self, name: &str, speed: f64, direction: Option<&str>) -> bool {
        let entry = self.motors.entry(name.to_string()).or_default();
        let mut changed = entry.speed != speed;
        entry.speed = speed;

        let running = speed > 0.0;
        changed |= entry.running != running;
        entry.running = running;

        if let Some(direction) = direction {
            changed |= entry.direction.as_deref() != Some(direction);
            entry.direction = Some(direction.to_string());
        }
        changed
    }

    /// Reset for a fresh program run.
    ///
    /// Pins, PWM channels and motors return to defaults in place (their
    /// identities stay visible); sensor readings are cleared outright. Bus
    /// devices are untouched — seeded identities are permanent and their
    /// operation history belongs to the session, not the run.
    fn reset_for_run(&mut self) -> bool {
        let mut changed = false;

        for pin in self.pins.values_mut() {
            let fresh = PinState::default();
            changed |= *pin != fresh;
            *pin = fresh;
        }
        for channel in self.pwm_channels.values_mut() {
            changed |= channel.running;
            channel.running = false;
        }
        for motor in self.motors.values_mut() {
            let fresh = MotorState::default();
            changed |= *motor != fresh;
            *motor = fresh;
        }
        if !self.sensors.is_empty() {
            self.sensors.clear();
            changed = true;
        }
        changed
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    /// State of one pin, if it has ever been referenced.
    #[must_use]
    pub fn pin(&self, pin: u8) -> Option<&PinState> {
        self.pins.get(&pin)
    }

    /// State of one PWM channel, if it has ever been referenced.
    #[must_use]
    pub fn pwm_channel(&self, pin: u8) -> Option<&PwmChannelState> {
        self.pwm_channels.get(&pin)
    }

    /// State of one bus device, if seeded or ever referenced.
    #[must_use]
    pub fn bus_device(&self, device: &BusDeviceId) -> Option<&BusDeviceState> {
        self.bus_devices.get(device)
    }

    #[must_use]
    pub fn motor(&self, name: &str) -> Option<&MotorState> {
        self.motors.get(name)
    }

    #[must_use]
    pub fn sensor(&self, name: &str) -> Option<&SensorState> {
        self.sensors.get(name)
    }

    #[must_use]
    pub fn pins(&self) -> &HashMap<u8, PinState> {
        &self.pins
    }

    #[must_use]
    pub fn pwm_channels(&self) -> &HashMap<u8, PwmChannelState> {
        &self.pwm_channels
    }

    #[must_use]
    pub fn bus_devices(&self) -> &HashMap<BusDeviceId, BusDeviceState> {
        &self.bus_devices
    }

    #[must_use]
    pub fn motors(&self) -> &HashMap<String, MotorState> {
        &self.motors
    }

    #[must_use]
    pub fn sensors(&self) -> &HashMap<String, SensorState> {
        &self.sensors
    }
}
