//! Decoding of the `STATUS?` byte.
//!
//! Every model family packs its status into a single byte, but the bit positions differ. Each layout is
//! described with a [`bitfield`] struct, bit 0 being the least significant bit.

use modular_bitfield::prelude::*;

use crate::types::{Priority, RegulationMode, Status, TrackingMode, TrackingStatus};

/// Which bit layout a model's status byte uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLayout {
    /// Single channel 72-25xx/27xx/29xx units.
    Classic,
    /// 72-13320 and 72-13330.
    TripleChannel,
    /// 72-13360.
    Rs485,
}

impl StatusLayout {
    /// Decode a raw status byte.
    pub fn decode(self, byte: u8) -> Status {
        match self {
            StatusLayout::Classic => {
                let bits = ClassicStatus::from_bytes([byte]);
                let tracking = match bits.tracking() {
                    0 => TrackingStatus::Mode(TrackingMode::Independent),
                    1 => TrackingStatus::Mode(TrackingMode::Series),
                    3 => TrackingStatus::Mode(TrackingMode::Parallel),
                    other => TrackingStatus::Unknown(other),
                };
                Status {
                    ch1_mode: bits.ch1_cv().into(),
                    ch2_mode: Some(bits.ch2_cv().into()),
                    tracking: Some(tracking),
                    beep_enabled: Some(bits.beep()),
                    lock_enabled: Some(bits.lock()),
                    output_enabled: bits.output(),
                    output2_enabled: None,
                    priority: None,
                }
            }
            StatusLayout::TripleChannel => {
                let bits = TripleChannelStatus::from_bytes([byte]);
                let tracking = match bits.tracking() {
                    0 => TrackingStatus::Mode(TrackingMode::Independent),
                    1 => TrackingStatus::Mode(TrackingMode::Series),
                    2 => TrackingStatus::Mode(TrackingMode::Parallel),
                    other => TrackingStatus::Unknown(other),
                };
                Status {
                    ch1_mode: bits.ch1_cv().into(),
                    ch2_mode: Some(bits.ch2_cv().into()),
                    tracking: Some(tracking),
                    beep_enabled: None,
                    lock_enabled: None,
                    output_enabled: bits.output1(),
                    output2_enabled: Some(bits.output2()),
                    priority: None,
                }
            }
            StatusLayout::Rs485 => {
                let bits = Rs485Status::from_bytes([byte]);
                Status {
                    ch1_mode: RegulationMode::from(bits.cv()),
                    ch2_mode: None,
                    tracking: None,
                    beep_enabled: Some(bits.beep()),
                    lock_enabled: Some(bits.lock()),
                    output_enabled: bits.output(),
                    output2_enabled: None,
                    priority: Some(Priority::from(bits.current_priority())),
                }
            }
        }
    }
}

/// Tracking: `00` independent, `01` series, `11` parallel.
#[bitfield(bits = 8)]
struct ClassicStatus {
    ch1_cv: bool,
    ch2_cv: bool,
    tracking: B2,
    beep: bool,
    lock: bool,
    output: bool,
    #[skip]
    __: B1,
}

/// Tracking: `00` independent, `01` series, `10` parallel.
#[bitfield(bits = 8)]
struct TripleChannelStatus {
    ch1_cv: bool,
    ch2_cv: bool,
    tracking: B2,
    #[skip]
    __: B2,
    output1: bool,
    output2: bool,
}

// The firmware sends a trailing '\n' after this byte.
#[bitfield(bits = 8)]
struct Rs485Status {
    cv: bool,
    output: bool,
    current_priority: bool,
    #[skip]
    __: B1,
    beep: bool,
    lock: bool,
    #[skip]
    reserved: B2,
}
