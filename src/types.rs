//! This module contains the value types exchanged with the PSUs.

use strum_macros::EnumIter;

use crate::error::RangeError;

/// Used to be less ambiguous about whether something is on or off.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    /// Disabled.
    #[default]
    Off = 0,
    /// Enabled.
    On = 1,
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        match value {
            State::Off => false,
            State::On => true,
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        match value {
            true => State::On,
            false => State::Off,
        }
    }
}

/// Represents the two possible power supply regulation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegulationMode {
    /// Constant voltage regulation mode.
    Cv,
    /// Constant current regulation mode.
    Cc,
}

impl From<bool> for RegulationMode {
    /// The status byte sets the mode bit for CV and clears it for CC.
    fn from(cv: bool) -> Self {
        if cv { RegulationMode::Cv } else { RegulationMode::Cc }
    }
}

/// Output coupling of multi channel supplies.
#[derive(Debug, EnumIter, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TrackingMode {
    /// Every channel is set on its own.
    Independent = 0,
    /// CH1 and CH2 are wired in series.
    Series = 1,
    /// CH1 and CH2 are wired in parallel.
    Parallel = 2,
}

impl TryFrom<u8> for TrackingMode {
    type Error = RangeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TrackingMode::Independent),
            1 => Ok(TrackingMode::Series),
            2 => Ok(TrackingMode::Parallel),
            other => Err(RangeError::TrackingMode(other)),
        }
    }
}

/// Tracking as reported by the status byte.
///
/// The raw value is kept for bit patterns the layout does not define.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStatus {
    Mode(TrackingMode),
    Unknown(u8),
}

/// Which setting the 72-13360 regulates first.
#[derive(Debug, EnumIter, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Priority {
    Voltage = 0,
    Current = 1,
}

impl From<bool> for Priority {
    fn from(current_priority: bool) -> Self {
        if current_priority { Priority::Current } else { Priority::Voltage }
    }
}

/// Decoded `STATUS?` byte.
///
/// Fields a model's status byte does not carry are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub ch1_mode: RegulationMode,
    pub ch2_mode: Option<RegulationMode>,
    pub tracking: Option<TrackingStatus>,
    pub beep_enabled: Option<bool>,
    pub lock_enabled: Option<bool>,
    /// The global output, or CH1 on per-channel models.
    pub output_enabled: bool,
    pub output2_enabled: Option<bool>,
    pub priority: Option<Priority>,
}
