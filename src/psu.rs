use core::fmt;

use embedded_io::{Read, ReadReady, Write};
use fugit::MillisDurationU32;
use log::debug;

use crate::{
    command::{self, Amps, Decimal, Line, Volts},
    error::{Error, Quantity, RangeError, Result},
    model::{Capability, Model, OutputSwitch, SaveStrategy},
    transport::{LineEnding, Transport},
    types::{Priority, State, Status, TrackingMode},
};

/// You can create a Tenma using any interface which implements [embedded_io::Read], [embedded_io::Write] &
/// [embedded_io::ReadReady], together with the [`Model`] on the other end of it.
///
/// For its methods, "set" means to write a configuration and "read" means to get the configured value back.
/// "running" values are the measured output.
///
/// Every method validates its arguments against the model before anything is sent, so a [`RangeError`] or
/// [`Error::Unsupported`] always leaves the device untouched.
pub struct Tenma<S: Read + Write + ReadReady> {
    transport: Transport<S>,
    model: &'static Model,
}

impl<S: Read + Write + ReadReady> Tenma<S> {
    /// Create a new Tenma instance with the given interface and model.
    pub fn new(interface: S, model: &'static Model) -> Self {
        Self {
            transport: Transport::new(interface, model.line_ending),
            model,
        }
    }

    /// Change the pause after each command. See [`crate::transport::DEFAULT_SETTLE_DELAY`].
    pub fn with_settle_delay(mut self, settle_delay: MillisDurationU32) -> Self {
        self.transport = self.transport.with_settle_delay(settle_delay);
        self
    }

    /// The model this session was opened for.
    pub fn model(&self) -> &'static Model {
        self.model
    }

    /// Close the session and give back the interface.
    pub fn close(self) -> S {
        self.transport.close()
    }

    /// Return the identity/version string of the unit.
    pub fn identity(&mut self) -> Result<String, S::Error> {
        self.identity_with(self.model.line_ending)
    }

    /// Query the identity with a specific line ending. Some units only answer a newline terminated probe.
    pub(crate) fn identity_with(&mut self, line_ending: LineEnding) -> Result<String, S::Error> {
        self.transport.send_with("*IDN?", line_ending)?;
        let text = self.transport.read_text()?;
        Ok(text
            .trim_end_matches(|c: char| c.is_whitespace() || c == '\0')
            .to_owned())
    }

    /// Read and decode the status byte.
    pub fn status(&mut self) -> Result<Status, S::Error> {
        self.transport.send("STATUS?")?;
        // Some units send a trailing '\n' after the status byte.
        let bytes = self.transport.read_bytes()?;
        let byte = bytes.first().copied().ok_or(Error::InvalidResponse)?;
        Ok(self.model.status_layout.decode(byte))
    }

    /// Return the configured voltage of `channel` in volts.
    pub fn read_voltage(&mut self, channel: u8) -> Result<f32, S::Error> {
        self.check_channel(channel)?;
        self.query_decimal("VSET", channel, None)
    }

    /// Return the configured current limit of `channel` in amps.
    pub fn read_current(&mut self, channel: u8) -> Result<f32, S::Error> {
        self.check_channel(channel)?;
        self.check_current_available(channel)?;
        // 72-2550 appends the sixth byte of its identity to current readings.
        self.query_decimal("ISET", channel, Some(5))
    }

    /// Return the measured output voltage of `channel` in volts.
    pub fn running_voltage(&mut self, channel: u8) -> Result<f32, S::Error> {
        self.check_channel(channel)?;
        self.query_decimal("VOUT", channel, None)
    }

    /// Return the measured output current of `channel` in amps.
    pub fn running_current(&mut self, channel: u8) -> Result<f32, S::Error> {
        self.check_channel(channel)?;
        self.check_current_available(channel)?;
        self.query_decimal("IOUT", channel, None)
    }

    /// Set the output voltage of `channel`. Value supplied in millivolts.
    ///
    /// The value is read back after writing. Returns the read back voltage in volts, or
    /// [`Error::Verification`] if the unit did not take the value. In that case the write has already happened.
    pub fn set_voltage(&mut self, channel: u8, voltage_mv: u32) -> Result<f32, S::Error> {
        self.check_channel(channel)?;
        self.check_magnitude(Quantity::Voltage, channel, voltage_mv)?;
        if let Some(restricted) = self.model.restriction(channel) {
            if !restricted.voltage_presets_mv.contains(&voltage_mv) {
                return Err(RangeError::VoltagePreset {
                    channel,
                    presets: restricted.voltage_presets_mv,
                }
                .into());
            }
        }

        let line = Self::encoded(command::setting(self.model.dialect, "VSET", channel, Volts(voltage_mv)))?;
        self.transport.send(&line)?;

        let volts = self.read_voltage(channel)?;
        Self::verify(Quantity::Voltage, voltage_mv, volts)?;
        Ok(volts)
    }

    /// Set the current limit of `channel`. Value supplied in milliamps.
    ///
    /// Verified by reading back, like [`Self::set_voltage`]. Returns the read back current in amps.
    pub fn set_current(&mut self, channel: u8, current_ma: u32) -> Result<f32, S::Error> {
        self.check_channel(channel)?;
        self.check_current_available(channel)?;
        self.check_magnitude(Quantity::Current, channel, current_ma)?;

        let line = Self::encoded(command::setting(self.model.dialect, "ISET", channel, Amps(current_ma)))?;
        self.transport.send(&line)?;

        let amps = self.read_current(channel)?;
        Self::verify(Quantity::Current, current_ma, amps)?;
        Ok(amps)
    }

    /// Load a memory slot. Same as pressing one of the M buttons on the unit.
    pub fn recall_conf(&mut self, slot: u8) -> Result<(), S::Error> {
        self.check_slot(slot)?;
        let line = Self::encoded(command::flag(self.model.dialect, "RCL", slot))?;
        self.transport.send(&line)
    }

    /// Send the raw save command for a memory slot.
    ///
    /// On most models this does not store the active settings into `slot`. Use [`Self::save_conf_flow`].
    pub fn save_conf(&mut self, slot: u8) -> Result<(), S::Error> {
        self.check_slot(slot)?;
        let line = Self::encoded(command::flag(self.model.dialect, "SAV", slot))?;
        self.transport.send(&line)
    }

    /// Store the settings of `channel` into memory `slot`.
    ///
    /// Most units only save into the slot which is currently recalled, so this turns the output off, reads
    /// the voltage and current, recalls the slot, re-applies both and then saves. Models with a working
    /// direct save just save.
    pub fn save_conf_flow(&mut self, slot: u8, channel: u8) -> Result<(), S::Error> {
        self.check_slot(slot)?;
        self.check_channel(channel)?;

        if self.model.save_strategy == SaveStrategy::Direct {
            return self.save_conf(slot);
        }

        self.off(None)?;

        let volts = self.read_voltage(channel)?;
        let amps = self.read_current(channel)?;

        // Make sure we're on the target slot.
        self.recall_conf(slot)?;

        self.set_voltage(channel, command::to_milli(volts))?;
        self.set_current(channel, command::to_milli(amps))?;

        self.save_conf(slot)?;
        debug!("Saved CH{} to M{}: {}V {}A", channel, slot, volts, amps);
        Ok(())
    }

    /// Enable/disable over-current protection.
    ///
    /// The unit gives no feedback, so this cannot be verified.
    pub fn set_ocp(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        self.toggle(Capability::Ocp, "OCP", state.into())
    }

    /// Enable/disable over-voltage protection.
    ///
    /// The unit gives no feedback, so this cannot be verified.
    pub fn set_ovp(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        self.toggle(Capability::Ovp, "OVP", state.into())
    }

    /// Enable/disable the beeper.
    pub fn set_beep(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        self.toggle(Capability::Beep, "BEEP", state.into())
    }

    /// Enable/disable the front panel lock.
    pub fn set_lock(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        self.toggle(Capability::Lock, "LOCK", state.into())
    }

    /// Turn an output on. `None` addresses every output.
    pub fn on(&mut self, channel: Option<u8>) -> Result<(), S::Error> {
        self.set_output(channel, State::On)
    }

    /// Turn an output off. `None` addresses every output.
    pub fn off(&mut self, channel: Option<u8>) -> Result<(), S::Error> {
        self.set_output(channel, State::Off)
    }

    /// Enable/disable an output.
    ///
    /// Units with a single global output only check `channel`, it is never sent.
    pub fn set_output(&mut self, channel: Option<u8>, state: impl Into<State>) -> Result<(), S::Error> {
        if let Some(channel) = channel {
            self.check_channel(channel)?;
        }
        let state = state.into() as u8;

        let line = match (self.model.output_switch, channel) {
            (OutputSwitch::Global, _) => command::flag(self.model.dialect, "OUT", state),
            (OutputSwitch::PerChannel { all }, None) => command::line(format_args!("OUT{all}:{state}")),
            (OutputSwitch::PerChannel { .. }, Some(channel)) => {
                command::line(format_args!("OUT{channel}:{state}"))
            }
        };
        self.transport.send(&Self::encoded(line)?)
    }

    /// Set the output tracking mode.
    ///
    /// Raw mode numbers can be converted with [`TrackingMode::try_from`], which rejects anything but 0, 1 or 2.
    pub fn set_tracking(&mut self, mode: TrackingMode) -> Result<(), S::Error> {
        self.require(Capability::Tracking)?;
        let line = Self::encoded(command::flag(self.model.dialect, "TRACK", mode as u8))?;
        self.transport.send(&line)
    }

    /// Choose whether voltage or current is regulated first.
    pub fn set_priority(&mut self, priority: Priority) -> Result<(), S::Error> {
        self.require(Capability::Priority)?;
        let line = Self::encoded(command::flag(self.model.dialect, "PRIORITY", priority as u8))?;
        self.transport.send(&line)
    }

    /// Step the voltage from `start_mv` to `stop_mv` in increments of `step_mv`, waiting `step_time` between
    /// steps.
    pub fn start_auto_voltage_step(
        &mut self,
        channel: u8,
        start_mv: u32,
        stop_mv: u32,
        step_mv: u32,
        step_time: MillisDurationU32,
    ) -> Result<(), S::Error> {
        self.start_auto_step(Quantity::Voltage, channel, start_mv, stop_mv, step_mv, step_time)
    }

    pub fn stop_auto_voltage_step(&mut self, channel: u8) -> Result<(), S::Error> {
        self.step_action("VASTOP", channel)
    }

    /// Step the current from `start_ma` to `stop_ma` in increments of `step_ma`, waiting `step_time` between
    /// steps.
    pub fn start_auto_current_step(
        &mut self,
        channel: u8,
        start_ma: u32,
        stop_ma: u32,
        step_ma: u32,
        step_time: MillisDurationU32,
    ) -> Result<(), S::Error> {
        self.start_auto_step(Quantity::Current, channel, start_ma, stop_ma, step_ma, step_time)
    }

    pub fn stop_auto_current_step(&mut self, channel: u8) -> Result<(), S::Error> {
        self.step_action("IASTOP", channel)
    }

    /// Set how far [`Self::step_voltage_up`] and [`Self::step_voltage_down`] move the voltage.
    pub fn set_manual_voltage_step(&mut self, channel: u8, step_mv: u32) -> Result<(), S::Error> {
        self.set_manual_step(Quantity::Voltage, channel, step_mv)
    }

    pub fn step_voltage_up(&mut self, channel: u8) -> Result<(), S::Error> {
        self.step_action("VUP", channel)
    }

    pub fn step_voltage_down(&mut self, channel: u8) -> Result<(), S::Error> {
        self.step_action("VDOWN", channel)
    }

    /// Set how far [`Self::step_current_up`] and [`Self::step_current_down`] move the current.
    pub fn set_manual_current_step(&mut self, channel: u8, step_ma: u32) -> Result<(), S::Error> {
        self.set_manual_step(Quantity::Current, channel, step_ma)
    }

    pub fn step_current_up(&mut self, channel: u8) -> Result<(), S::Error> {
        self.step_action("IUP", channel)
    }

    pub fn step_current_down(&mut self, channel: u8) -> Result<(), S::Error> {
        self.step_action("IDOWN", channel)
    }

    fn start_auto_step(
        &mut self,
        quantity: Quantity,
        channel: u8,
        start: u32,
        stop: u32,
        step: u32,
        step_time: MillisDurationU32,
    ) -> Result<(), S::Error> {
        self.require(Capability::Stepping)?;
        self.check_channel(channel)?;
        self.check_magnitude(quantity, channel, start)?;
        self.check_magnitude(quantity, channel, stop)?;
        if step > stop {
            return Err(RangeError::Step {
                channel,
                quantity,
                step,
                stop,
            }
            .into());
        }

        let mnemonic = match quantity {
            Quantity::Voltage => "VASTEP",
            Quantity::Current => "IASTEP",
        };
        let line = Self::encoded(command::setting(
            self.model.dialect,
            mnemonic,
            channel,
            format_args!(
                "{},{},{},{}",
                Decimal(start),
                Decimal(stop),
                Decimal(step),
                Decimal(step_time.to_millis())
            ),
        ))?;
        self.transport.send(&line)
    }

    fn set_manual_step(&mut self, quantity: Quantity, channel: u8, step: u32) -> Result<(), S::Error> {
        self.require(Capability::Stepping)?;
        self.check_channel(channel)?;
        self.check_magnitude(quantity, channel, step)?;

        let mnemonic = match quantity {
            Quantity::Voltage => "VSTEP",
            Quantity::Current => "ISTEP",
        };
        let line = Self::encoded(command::setting(self.model.dialect, mnemonic, channel, Decimal(step)))?;
        self.transport.send(&line)
    }

    fn step_action(&mut self, mnemonic: &str, channel: u8) -> Result<(), S::Error> {
        self.require(Capability::Stepping)?;
        self.check_channel(channel)?;
        let line = Self::encoded(command::action(self.model.dialect, mnemonic, channel))?;
        self.transport.send(&line)
    }

    fn toggle(&mut self, capability: Capability, mnemonic: &str, state: State) -> Result<(), S::Error> {
        self.require(capability)?;
        let line = Self::encoded(command::flag(self.model.dialect, mnemonic, state as u8))?;
        self.transport.send(&line)
    }

    /// Send a query and parse the decimal answer, optionally only looking at the first `max_chars`.
    fn query_decimal(
        &mut self,
        mnemonic: &str,
        channel: u8,
        max_chars: Option<usize>,
    ) -> Result<f32, S::Error> {
        let line = Self::encoded(command::query(self.model.dialect, mnemonic, channel))?;
        self.transport.send(&line)?;
        let text = self.transport.read_text()?;
        let text: String = match max_chars {
            Some(max_chars) => text.chars().take(max_chars).collect(),
            None => text,
        };
        command::parse_decimal(&text).ok_or(Error::InvalidResponse)
    }

    fn require(&self, capability: Capability) -> Result<(), S::Error> {
        if self.model.supports(capability) {
            Ok(())
        } else {
            Err(Error::Unsupported {
                capability,
                model: self.model.name,
            })
        }
    }

    fn check_channel(&self, channel: u8) -> core::result::Result<(), RangeError> {
        if channel < 1 || channel > self.model.channels {
            return Err(RangeError::Channel {
                channel,
                channels: self.model.channels,
            });
        }
        Ok(())
    }

    fn check_magnitude(
        &self,
        quantity: Quantity,
        channel: u8,
        value: u32,
    ) -> core::result::Result<(), RangeError> {
        match quantity {
            Quantity::Voltage if value > self.model.max_voltage_mv => Err(RangeError::Voltage {
                channel,
                millivolts: value,
                max: self.model.max_voltage_mv,
            }),
            Quantity::Current if value > self.model.max_current_ma => Err(RangeError::Current {
                channel,
                milliamps: value,
                max: self.model.max_current_ma,
            }),
            _ => Ok(()),
        }
    }

    fn check_current_available(&self, channel: u8) -> core::result::Result<(), RangeError> {
        match self.model.restriction(channel) {
            Some(_) => Err(RangeError::NoCurrent { channel }),
            None => Ok(()),
        }
    }

    fn check_slot(&self, slot: u8) -> core::result::Result<(), RangeError> {
        if slot < 1 || slot > self.model.memory_slots {
            return Err(RangeError::MemorySlot {
                slot,
                slots: self.model.memory_slots,
            });
        }
        Ok(())
    }

    fn encoded(line: core::result::Result<Line, fmt::Error>) -> Result<Line, S::Error> {
        line.map_err(|_| Error::BufferError)
    }

    /// Compare a read back value against what was requested, to the nearest milli-unit.
    fn verify(quantity: Quantity, requested: u32, read_back: f32) -> Result<(), S::Error> {
        let read = command::to_milli(read_back);
        if read != requested {
            return Err(Error::Verification {
                quantity,
                requested,
                read,
            });
        }
        Ok(())
    }
}
