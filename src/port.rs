//! Opening Tenma sessions on real serial ports, using the [serialport] crate.
//!
//! ```no_run
//! use tenma_psu::port::{self, SerialConfig};
//!
//! let (mut psu, found) = port::connect("/dev/ttyACM0", &SerialConfig::default())?;
//! println!("{} ({})", found.identity, psu.model().name);
//! psu.set_voltage(1, 5000)?;
//! psu.on(None)?;
//! # Ok::<(), tenma_psu::error::Error<tenma_psu::port::IoError>>(())
//! ```

use std::time::Duration;

use fugit::{ExtU32, MillisDurationU32};
use log::debug;
use serialport::{DataBits, Parity, SerialPort, StopBits};

use crate::{
    error::{Error, Result},
    model::Model,
    psu::Tenma,
    resolver::{self, ModelMatch},
    transport::DEFAULT_SETTLE_DELAY,
};

/// Serial line settings. The defaults match every 72-series unit: 9600 baud, 8N1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// How long a single read or write may block.
    pub timeout: MillisDurationU32,
    /// Pause after each command.
    pub settle_delay: MillisDurationU32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: 300.millis(),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl SerialConfig {
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_timeout(mut self, timeout: MillisDurationU32) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: MillisDurationU32) -> Self {
        self.settle_delay = settle_delay;
        self
    }
}

/// A [serialport] port exposed through the [embedded_io] traits.
pub struct SerialPortIo(Box<dyn SerialPort>);

impl SerialPortIo {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self(port)
    }
}

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<serialport::Error> for IoError {
    fn from(err: serialport::Error) -> Self {
        IoError(err.into())
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind;
        use std::io::ErrorKind as StdKind;

        match self.0.kind() {
            StdKind::NotFound => ErrorKind::NotFound,
            StdKind::PermissionDenied => ErrorKind::PermissionDenied,
            StdKind::BrokenPipe => ErrorKind::BrokenPipe,
            StdKind::InvalidInput => ErrorKind::InvalidInput,
            StdKind::InvalidData => ErrorKind::InvalidData,
            StdKind::TimedOut => ErrorKind::TimedOut,
            StdKind::Interrupted => ErrorKind::Interrupted,
            StdKind::Unsupported => ErrorKind::Unsupported,
            StdKind::OutOfMemory => ErrorKind::OutOfMemory,
            _ => ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for SerialPortIo {
    type Error = IoError;
}

impl embedded_io::Read for SerialPortIo {
    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::ReadReady for SerialPortIo {
    fn read_ready(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(self.0.bytes_to_read()? > 0)
    }
}

impl embedded_io::Write for SerialPortIo {
    fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> core::result::Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

/// Open `path` for a known model.
pub fn open(
    path: &str,
    model: &'static Model,
    config: &SerialConfig,
) -> Result<Tenma<SerialPortIo>, IoError> {
    let port = serialport::new(path, config.baud_rate)
        .data_bits(config.data_bits)
        .parity(config.parity)
        .stop_bits(config.stop_bits)
        .timeout(Duration::from_millis(config.timeout.to_millis() as u64))
        .open()
        .map_err(|err| Error::Connection {
            port: path.to_owned(),
            reason: err.to_string(),
        })?;

    debug!("Opened {} for {}", path, model.name);
    Ok(Tenma::new(SerialPortIo::new(port), model).with_settle_delay(config.settle_delay))
}

/// Open `path`, detect which model is connected and return a session configured for it.
pub fn connect(path: &str, config: &SerialConfig) -> Result<(Tenma<SerialPortIo>, ModelMatch), IoError> {
    resolver::connect(|model| open(path, model, config))
}
