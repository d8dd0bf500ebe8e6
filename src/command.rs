//! Command line building and conversion between milli-units and the decimal text the firmware speaks.

use core::fmt::{self, Display, Write};

use crate::model::Dialect;
use crate::transport::LINE_CAPACITY;

/// A single command line, without terminator.
pub(crate) type Line = heapless::String<LINE_CAPACITY>;

/// Build a line with `write!`, failing if it overflows the buffer.
pub(crate) fn line(args: fmt::Arguments<'_>) -> Result<Line, fmt::Error> {
    let mut line = Line::new();
    line.write_fmt(args)?;
    Ok(line)
}

/// Channel number as written after a mnemonic. Colon dialect units never address a channel.
fn channel(dialect: Dialect, channel: u8) -> impl Display {
    Channel(match dialect {
        Dialect::Concatenated => Some(channel),
        Dialect::Colon => None,
    })
}

struct Channel(Option<u8>);

impl Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(channel) => write!(f, "{channel}"),
            None => Ok(()),
        }
    }
}

/// `VSET1?` / `VSET?`
pub(crate) fn query(dialect: Dialect, mnemonic: &str, ch: u8) -> Result<Line, fmt::Error> {
    line(format_args!("{mnemonic}{}?", channel(dialect, ch)))
}

/// `VSET1:5.00` / `VSET:5.00`
pub(crate) fn setting(
    dialect: Dialect,
    mnemonic: &str,
    ch: u8,
    value: impl Display,
) -> Result<Line, fmt::Error> {
    line(format_args!("{mnemonic}{}:{value}", channel(dialect, ch)))
}

/// Channel-less command with a single argument. `OCP1` / `BEEP:1` / `SAV3` / `RCL:3`.
pub(crate) fn flag(dialect: Dialect, mnemonic: &str, value: impl Display) -> Result<Line, fmt::Error> {
    match dialect {
        Dialect::Concatenated => line(format_args!("{mnemonic}{value}")),
        Dialect::Colon => line(format_args!("{mnemonic}:{value}")),
    }
}

/// Argument-less command addressing a channel. `VUP1` / `VUP`.
pub(crate) fn action(dialect: Dialect, mnemonic: &str, ch: u8) -> Result<Line, fmt::Error> {
    line(format_args!("{mnemonic}{}", channel(dialect, ch)))
}

/// Millivolts as volts with 2 decimal places, rounded half up. 5000 => `5.00`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Volts(pub u32);

impl Display for Volts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let centivolts = (self.0 + 5) / 10;
        write!(f, "{}.{:02}", centivolts / 100, centivolts % 100)
    }
}

/// Milliamps as amps with 3 decimal places. 1500 => `1.500`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Amps(pub u32);

impl Display for Amps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.0 / 1000, self.0 % 1000)
    }
}

/// Milli-units in the shortest decimal form with at least one fractional digit.
///
/// Used for stepping arguments. 1000 => `1.0`, 250 => `0.25`, 1234 => `1.234`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Decimal(pub u32);

impl Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fraction = self.0 % 1000;
        let mut digits = 3;
        while digits > 1 && fraction % 10 == 0 {
            fraction /= 10;
            digits -= 1;
        }
        write!(f, "{}.{:0width$}", self.0 / 1000, fraction, width = digits)
    }
}

/// Parse a decimal response such as `05.00` or `1.500\n`.
pub(crate) fn parse_decimal(text: &str) -> Option<f32> {
    let text = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    if text.is_empty() {
        return None;
    }
    text.parse::<f32>().ok().filter(|value| value.is_finite())
}

/// Convert volts/amps to the nearest milli-unit.
pub(crate) fn to_milli(value: f32) -> u32 {
    (value * 1000.0).round().max(0.0) as u32
}
