//! Peripheral state store for the Boardsync client.
//!
//! This crate holds the per-peripheral state machines the synchronization
//! layer maintains: pin mode/level, PWM channel parameters, per-device bus
//! activity and operation history, motor speeds and sensor readings. The
//! store applies the canonical delta stream produced by
//! `boardsync-protocol` and guarantees idempotent application.

pub mod peripherals;
pub mod store;

pub use peripherals::{
    BusDeviceState, BusOperationRecord, MotorState, PinState, PwmChannelState, SensorState,
};
pub use store::{PeripheralStore, STANDARD_BUS_DEVICES};
