//! Our error types for the Tenma PSUs.

use thiserror::Error;

use crate::model::Capability;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for Tenma PSU communications.
///
/// `I` is the error type of the underlying serial interface.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Could not open serial port {port}: {reason}")]
    Connection { port: String, reason: String },
    #[error("Serial communication error")]
    SerialError(I),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("Set {requested}{unit}, but read {read}{unit}", unit = .quantity.unit())]
    Verification {
        quantity: Quantity,
        requested: u32,
        read: u32,
    },
    #[error("{capability} is not supported by the {model}")]
    Unsupported {
        capability: Capability,
        model: &'static str,
    },
    #[error("Invalid response received")]
    InvalidResponse,
    #[error("Command does not fit the command buffer")]
    BufferError,
    #[error("Command contains non-ASCII characters")]
    InvalidCommand,
}

/// A value fell outside of what the connected model accepts.
///
/// These are always raised before anything is written to the device.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    #[error("Channel CH{channel} not in range ({channels} channels supported)")]
    Channel { channel: u8, channels: u8 },
    #[error("Trying to set CH{channel} voltage to {millivolts}mV, the maximum is {max}mV")]
    Voltage { channel: u8, millivolts: u32, max: u32 },
    #[error("Trying to set CH{channel} current to {milliamps}mA, the maximum is {max}mA")]
    Current { channel: u8, milliamps: u32, max: u32 },
    #[error("Trying to use slot M{slot} with only {slots} slots")]
    MemorySlot { slot: u8, slots: u8 },
    #[error("CH{channel} step {step}{unit} higher than stop {stop}{unit}", unit = .quantity.unit())]
    Step {
        channel: u8,
        quantity: Quantity,
        step: u32,
        stop: u32,
    },
    #[error("Tracking mode {0} not valid. Use one of: 0 (Independent), 1 (Series), 2 (Parallel)")]
    TrackingMode(u8),
    #[error("CH{channel} can only be set to one of {presets:?} mV")]
    VoltagePreset {
        channel: u8,
        presets: &'static [u32],
    },
    #[error("CH{channel} does not support setting or reading current")]
    NoCurrent { channel: u8 },
}

/// Which of the two regulated quantities an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Voltage,
    Current,
}

impl Quantity {
    /// Unit suffix of the milli-unit values we carry around.
    pub fn unit(&self) -> &'static str {
        match self {
            Quantity::Voltage => "mV",
            Quantity::Current => "mA",
        }
    }
}
