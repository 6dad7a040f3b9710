use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction a GPIO pin is configured for.
///
/// `Unset` is the state of a pin the engine has never mentioned; it is what
/// every pin returns to when a fresh program run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PinMode {
    /// Pin drives a level (engine-controlled).
    Out,

    /// Pin reads a level (user/input-controlled).
    In,

    /// Pin has not been configured since the last reset.
    #[default]
    Unset,
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinMode::Out => write!(f, "out"),
            PinMode::In => write!(f, "in"),
            PinMode::Unset => write!(f, "unset"),
        }
    }
}

impl std::str::FromStr for PinMode {
    type Err = Error;

    /// Parse a pin mode from any of the spellings the engine uses.
    ///
    /// Structured messages say `"output"`/`"input"`, log lines say
    /// `"OUT"`/`"IN"`; both map onto the same two modes.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "out" | "output" => Ok(PinMode::Out),
            "in" | "input" => Ok(PinMode::In),
            "unset" => Ok(PinMode::Unset),
            other => Err(Error::MalformedFrame {
                message: format!("unrecognized pin mode: {other}"),
            }),
        }
    }
}

/// Logic level of a GPIO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PinLevel {
    #[default]
    Low,
    High,
}

impl PinLevel {
    #[must_use]
    pub fn from_bool(high: bool) -> Self {
        if high { PinLevel::High } else { PinLevel::Low }
    }

    #[must_use]
    pub fn is_high(&self) -> bool {
        matches!(self, PinLevel::High)
    }
}

impl fmt::Display for PinLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinLevel::Low => write!(f, "low"),
            PinLevel::High => write!(f, "high"),
        }
    }
}

/// The two peripheral buses the engine emulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusKind {
    Spi,
    I2c,
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusKind::Spi => write!(f, "SPI"),
            BusKind::I2c => write!(f, "I2C"),
        }
    }
}

/// Identity of a device on a peripheral bus.
///
/// SPI devices are addressed by `(bus, chip-select)` pair, I2C devices by
/// their 7-bit address. The identity doubles as the key for per-device
/// state and activity timers.
///
/// # Examples
///
/// ```
/// use boardsync_core::{BusDeviceId, BusKind};
///
/// let adc = BusDeviceId::spi(0, 0);
/// let bmp = BusDeviceId::i2c(0x76);
///
/// assert_eq!(adc.kind(), BusKind::Spi);
/// assert_eq!(bmp.to_string(), "I2C 0x76");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusDeviceId {
    /// SPI device addressed by bus number and chip-select line.
    Spi { bus: u8, device: u8 },

    /// I2C device addressed by its 7-bit address.
    I2c { address: u8 },
}

impl BusDeviceId {
    #[must_use]
    pub fn spi(bus: u8, device: u8) -> Self {
        BusDeviceId::Spi { bus, device }
    }

    #[must_use]
    pub fn i2c(address: u8) -> Self {
        BusDeviceId::I2c { address }
    }

    /// Which bus this device sits on.
    #[must_use]
    pub fn kind(&self) -> BusKind {
        match self {
            BusDeviceId::Spi { .. } => BusKind::Spi,
            BusDeviceId::I2c { .. } => BusKind::I2c,
        }
    }
}

impl fmt::Display for BusDeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusDeviceId::Spi { bus, device } => write!(f, "SPI {bus}.{device}"),
            BusDeviceId::I2c { address } => write!(f, "I2C 0x{address:02X}"),
        }
    }
}

/// Direction of a bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusOp {
    Read,
    Write,
}

impl fmt::Display for BusOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusOp::Read => write!(f, "read"),
            BusOp::Write => write!(f, "write"),
        }
    }
}

/// Severity of a console line surfaced to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

/// Phase markers for a program run on the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// A fresh run began; all per-run peripheral state is stale.
    Started,

    /// The run finished (normally or stopped); state is left as-is.
    Completed,
}

/// PWM duty cycle, 0-100 percent.
///
/// # Examples
///
/// ```
/// use boardsync_core::DutyCycle;
///
/// let duty = DutyCycle::new(42.5).unwrap();
/// assert_eq!(duty.percent(), 42.5);
///
/// // Out-of-range engine values are clamped rather than dropped
/// assert_eq!(DutyCycle::clamped(140.0).percent(), 100.0);
/// assert!(DutyCycle::new(140.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DutyCycle(f64);

impl DutyCycle {
    /// Create a duty cycle with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidDutyCycle` if the value is not a finite
    /// number in `0.0..=100.0`.
    pub fn new(percent: f64) -> Result<Self> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(Error::InvalidDutyCycle(percent));
        }
        Ok(DutyCycle(percent))
    }

    /// Create a duty cycle, clamping out-of-range input into `0..=100`.
    ///
    /// Used on the inbound path: a duty reported by the engine is display
    /// data, so a bad value degrades to the nearest legal one instead of
    /// killing the frame.
    #[must_use]
    pub fn clamped(percent: f64) -> Self {
        if percent.is_nan() {
            return DutyCycle(0.0);
        }
        DutyCycle(percent.clamp(0.0, 100.0))
    }

    #[must_use]
    pub fn percent(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for DutyCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// PWM frequency in hertz. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frequency(f64);

impl Frequency {
    /// Create a frequency with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidFrequency` if the value is not positive
    /// and finite.
    pub fn new(hz: f64) -> Result<Self> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(Error::InvalidFrequency(hz));
        }
        Ok(Frequency(hz))
    }

    #[must_use]
    pub fn hz(&self) -> f64 {
        self.0
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency(crate::constants::DEFAULT_PWM_FREQUENCY_HZ)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Hz", self.0)
    }
}
