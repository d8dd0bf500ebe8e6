//! This crate provides an interface for communicating with and controlling the Tenma 72-series of programmable DC
//! power supplies. Several of these are rebadged Korad units and speak the same protocol.
//!
//! Models supported:
//! * 72-2535, 72-2540, 72-2545, 72-2550 (also reports as KORADKA6003P)
//! * 72-2705, 72-2930, 72-2940
//! * 72-13320, 72-13330 (three channel)
//! * 72-13360 (RS485 interface)
//!
//! Anything else identifying itself over the serial port is treated as a 72-2545.
//!
//! The protocol is plain ASCII commands such as `VSET1:5.00` with no acknowledgement. The firmware needs a
//! moment after each command, see [`transport`]. Setting a voltage or current is verified by reading it back.
//!
//! The serial port used for PSU comms should be configured like so (the defaults of [`port::SerialConfig`]):
//! * Baud rate: 9600
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//!
//! [`psu::Tenma`] works over any [embedded_io] interface, [`port`] opens real serial ports and
//! [`resolver`] detects which model is connected.

pub mod error;
pub mod model;
pub mod port;
pub mod psu;
pub mod resolver;
pub mod status;
pub mod transport;
pub mod types;

mod command;

#[cfg(test)]
mod mock_serial;

pub use model::Model;
pub use psu::Tenma;
