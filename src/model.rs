//! Static descriptions of every supported PSU model.
//!
//! The 72-series units all speak the same ASCII protocol, but differ in limits, channel count and a handful
//! of syntax details. Each model is described by a [`Model`] and registered in [`MODELS`]. The resolver walks
//! that table in order when matching an identity string, so the order is part of the behaviour.
//!
//! | Model    | Channels | Slots | Max V | Max A | Syntax       | Status layout |
//! |----------|----------|-------|-------|-------|--------------|---------------|
//! | 72-2540  | 1        | 5     | 31    | 5.1   | concatenated | classic       |
//! | 72-2535  | 1        | 5     | 30    | 3     | concatenated | classic       |
//! | 72-2545  | 1        | 5     | 60    | 2     | concatenated | classic       |
//! | 72-2550  | 1        | 5     | 60    | 3     | concatenated | classic       |
//! | 72-2930  | 1        | 5     | 30    | 10    | concatenated | classic       |
//! | 72-2705  | 1        | 5     | 31    | 3.1   | concatenated | classic       |
//! | 72-2940  | 1        | 5     | 60    | 5     | concatenated | classic       |
//! | 72-13320 | 3        | 0     | 30    | 3     | concatenated | triple        |
//! | 72-13330 | 3        | 0     | 30    | 5     | concatenated | triple        |
//! | 72-13360 | 1        | 5     | 60    | 15    | colon        | RS485         |

use strum_macros::{Display, EnumIter};

use crate::status::StatusLayout;
use crate::transport::LineEnding;

/// Static model definition for a Tenma power supply.
#[derive(Debug, PartialEq, Eq)]
pub struct Model {
    /// Human-readable model name (e.g. "72-2540").
    pub name: &'static str,
    /// Substrings of the `*IDN?` response which identify this model.
    pub match_strings: &'static [&'static str],
    /// Number of output channels.
    pub channels: u8,
    /// Number of memory slots reachable from the front panel.
    ///
    /// `0` means slots are not exposed at all, even if the firmware has some.
    pub memory_slots: u8,
    pub max_voltage_mv: u32,
    pub max_current_ma: u32,
    /// How commands are spelled on the wire.
    pub dialect: Dialect,
    /// Terminator appended to every command.
    pub line_ending: LineEnding,
    /// Bit layout of the `STATUS?` byte.
    pub status_layout: StatusLayout,
    /// How outputs are switched on and off.
    pub output_switch: OutputSwitch,
    pub save_strategy: SaveStrategy,
    /// A channel with restricted settings, if the model has one.
    pub restricted_channel: Option<RestrictedChannel>,
    pub capabilities: Capabilities,
}

impl Model {
    /// Returns the first of this model's match strings contained in `identity`, if any.
    pub fn matches(&self, identity: &str) -> Option<&'static str> {
        self.match_strings
            .iter()
            .copied()
            .find(|needle| identity.contains(needle))
    }

    /// Check whether this model supports `capability`.
    pub fn supports(&self, capability: Capability) -> bool {
        let caps = &self.capabilities;
        match capability {
            Capability::Ocp => caps.ocp,
            Capability::Ovp => caps.ovp,
            Capability::Beep => caps.beep,
            Capability::Lock => caps.lock,
            Capability::Tracking => caps.tracking,
            Capability::Stepping => caps.stepping,
            Capability::Priority => caps.priority,
        }
    }

    /// Returns the restriction for `channel`, if there is one.
    pub fn restriction(&self, channel: u8) -> Option<&RestrictedChannel> {
        self.restricted_channel
            .as_ref()
            .filter(|restricted| restricted.channel == channel)
    }
}

/// Spelling of commands on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Channel number directly follows the mnemonic and flags are appended without a separator.
    ///
    /// `VSET1:5.00`, `VSET1?`, `OCP1`, `SAV2`.
    Concatenated,
    /// Single channel units which never send a channel number and separate every argument with `:`.
    ///
    /// `VSET:5.00`, `VSET?`, `BEEP:1`, `SAV:2`.
    Colon,
}

/// How the output enable command is formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSwitch {
    /// A single global output. `OUT1` / `OUT:1` depending on the dialect.
    Global,
    /// Individually switched channels, `OUT2:1`.
    ///
    /// `all` is the token which addresses every channel at once, e.g. `OUT12:1`.
    PerChannel { all: &'static str },
}

/// How a memory slot gets written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStrategy {
    /// `SAV` alone does not store the panel settings into the chosen slot. The slot has to be recalled and the
    /// settings re-applied before saving.
    RecallAndSave,
    /// `SAV` stores the active settings directly.
    Direct,
}

/// A channel which only accepts a handful of fixed voltages and has no current control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestrictedChannel {
    pub channel: u8,
    /// The only voltages this channel accepts, in millivolts.
    pub voltage_presets_mv: &'static [u32],
}

/// Optional features which only some models have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub ocp: bool,
    pub ovp: bool,
    pub beep: bool,
    pub lock: bool,
    pub tracking: bool,
    pub stepping: bool,
    pub priority: bool,
}

impl Capabilities {
    /// The feature set of the original single channel 72-25xx/27xx/29xx units.
    pub const CLASSIC: Capabilities = Capabilities {
        ocp: true,
        ovp: true,
        beep: true,
        lock: false,
        tracking: false,
        stepping: false,
        priority: false,
    };

    /// 72-13320 and 72-13330.
    pub const TRIPLE_CHANNEL: Capabilities = Capabilities {
        ocp: false,
        ovp: false,
        beep: true,
        lock: true,
        tracking: true,
        stepping: true,
        priority: false,
    };

    /// 72-13360.
    pub const RS485: Capabilities = Capabilities {
        ocp: false,
        ovp: false,
        beep: true,
        lock: true,
        tracking: false,
        stepping: true,
        priority: true,
    };
}

/// Names of the optional features, used when reporting unsupported operations.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    #[strum(to_string = "Over-current protection")]
    Ocp,
    #[strum(to_string = "Over-voltage protection")]
    Ovp,
    #[strum(to_string = "Beep")]
    Beep,
    #[strum(to_string = "Front panel lock")]
    Lock,
    #[strum(to_string = "Output tracking")]
    Tracking,
    #[strum(to_string = "Voltage/current stepping")]
    Stepping,
    #[strum(to_string = "Voltage/current priority")]
    Priority,
}

const CH3_PRESETS_MV: &[u32] = &[2500, 3300, 5000];

/// Builds a descriptor for a classic single channel model. Only the limits differ between these.
const fn classic(
    name: &'static str,
    match_strings: &'static [&'static str],
    max_voltage_mv: u32,
    max_current_ma: u32,
) -> Model {
    Model {
        name,
        match_strings,
        channels: 1,
        memory_slots: 5,
        max_voltage_mv,
        max_current_ma,
        dialect: Dialect::Concatenated,
        line_ending: LineEnding::Newline,
        status_layout: StatusLayout::Classic,
        output_switch: OutputSwitch::Global,
        save_strategy: SaveStrategy::RecallAndSave,
        restricted_channel: None,
        capabilities: Capabilities::CLASSIC,
    }
}

/// Three channel models. Channel 3 is a fixed 2.5/3.3/5V rail.
const fn triple(
    name: &'static str,
    match_strings: &'static [&'static str],
    max_current_ma: u32,
) -> Model {
    Model {
        name,
        match_strings,
        channels: 3,
        // The unit has 10 slots (0-9) but they are not reachable from the front panel.
        memory_slots: 0,
        max_voltage_mv: 30000,
        max_current_ma,
        dialect: Dialect::Concatenated,
        line_ending: LineEnding::Newline,
        status_layout: StatusLayout::TripleChannel,
        output_switch: OutputSwitch::PerChannel { all: "12" },
        save_strategy: SaveStrategy::RecallAndSave,
        restricted_channel: Some(RestrictedChannel {
            channel: 3,
            voltage_presets_mv: CH3_PRESETS_MV,
        }),
        capabilities: Capabilities::TRIPLE_CHANNEL,
    }
}

/// Descriptor used to talk to a unit before we know what it is.
///
/// Not part of [`MODELS`], it never matches an identity. Commands go out bare, the resolver retries with a
/// newline if that gets no answer.
pub static GENERIC: Model = Model {
    line_ending: LineEnding::None,
    ..classic("72-series (generic)", &[], 30000, 5000)
};

/// Only 4 physical buttons, but 5 memories are available.
pub static TENMA_72_2540: Model = classic("72-2540", &["72-2540"], 31000, 5100);
pub static TENMA_72_2535: Model = classic("72-2535", &["72-2535"], 30000, 3000);
pub static TENMA_72_2545: Model = classic("72-2545", &["72-2545"], 60000, 2000);
/// Also manufactured as the Korad KA6003P.
pub static TENMA_72_2550: Model = classic("72-2550", &["72-2550", "KORADKA6003P"], 60000, 3000);
pub static TENMA_72_2930: Model = classic("72-2930", &["72-2930"], 30000, 10000);
pub static TENMA_72_2705: Model = classic("72-2705", &["72-2705"], 31000, 3100);
pub static TENMA_72_2940: Model = classic("72-2940", &["72-2940"], 60000, 5000);
pub static TENMA_72_13320: Model = triple("72-13320", &["72-13320"], 3000);
pub static TENMA_72_13330: Model = triple("72-13330", &["72-13330"], 5000);

/// Single channel RS485 unit with its own command spelling.
pub static TENMA_72_13360: Model = Model {
    name: "72-13360",
    match_strings: &["72-13360"],
    channels: 1,
    memory_slots: 5,
    max_voltage_mv: 60000,
    max_current_ma: 15000,
    dialect: Dialect::Colon,
    line_ending: LineEnding::Newline,
    status_layout: StatusLayout::Rs485,
    output_switch: OutputSwitch::Global,
    save_strategy: SaveStrategy::Direct,
    restricted_channel: None,
    capabilities: Capabilities::RS485,
};

/// Model assumed when an identity string matches nothing in [`MODELS`].
pub static DEFAULT_MODEL: &Model = &TENMA_72_2545;

/// Every model the resolver knows about, in matching order.
pub static MODELS: [&Model; 10] = [
    &TENMA_72_2540,
    &TENMA_72_2535,
    &TENMA_72_2545,
    &TENMA_72_2550,
    &TENMA_72_2930,
    &TENMA_72_2705,
    &TENMA_72_2940,
    &TENMA_72_13320,
    &TENMA_72_13330,
    &TENMA_72_13360,
];
