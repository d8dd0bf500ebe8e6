//! Line based ASCII transport shared by every model.
//!
//! Commands are written in one go followed by the model's terminator. The firmware is slow to process
//! commands and gives no indication of when it is done, so every write is followed by a fixed settle delay.
//! Reads then drain whatever the device has put in the receive buffer by that time, without waiting for more.

use embedded_io::{Read, ReadReady, Write};
use fugit::MillisDurationU32;
use log::debug;

use crate::error::{Error, Result};

/// Default pause after each command.
pub const DEFAULT_SETTLE_DELAY: MillisDurationU32 = MillisDurationU32::millis(200);

/// Largest command line we ever build, terminator included.
pub(crate) const LINE_CAPACITY: usize = 64;

/// Terminator appended to commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Commands are sent bare.
    #[default]
    None,
    /// `\n`
    Newline,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::None => "",
            LineEnding::Newline => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Wraps any interface which implements [embedded_io::Read], [embedded_io::Write] & [embedded_io::ReadReady].
pub struct Transport<S: Read + Write + ReadReady> {
    interface: S,
    line_ending: LineEnding,
    settle_delay: MillisDurationU32,
}

impl<S: Read + Write + ReadReady> Transport<S> {
    pub fn new(interface: S, line_ending: LineEnding) -> Self {
        Self {
            interface,
            line_ending,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Change the pause after each command. Zero disables it.
    pub fn with_settle_delay(mut self, settle_delay: MillisDurationU32) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn settle_delay(&self) -> MillisDurationU32 {
        self.settle_delay
    }

    /// Send a command with the configured terminator, then wait for the settle delay.
    pub fn send(&mut self, line: &str) -> Result<(), S::Error> {
        self.send_with(line, self.line_ending)
    }

    /// Send a command with a specific terminator, then wait for the settle delay.
    pub fn send_with(&mut self, line: &str, line_ending: LineEnding) -> Result<(), S::Error> {
        debug!(">> {}", line);

        let mut buff: heapless::Vec<u8, LINE_CAPACITY> = heapless::Vec::new();
        buff.extend_from_slice(line.as_bytes())
            .and_then(|_| buff.extend_from_slice(line_ending.as_str().as_bytes()))
            .map_err(|_| Error::BufferError)?;
        if !buff.is_ascii() {
            return Err(Error::InvalidCommand);
        }

        self.interface.write_all(&buff).map_err(Error::SerialError)?;
        self.interface.flush().map_err(Error::SerialError)?;

        // Give it time to process.
        if self.settle_delay.to_millis() > 0 {
            std::thread::sleep(std::time::Duration::from_millis(
                self.settle_delay.to_millis() as u64,
            ));
        }
        Ok(())
    }

    /// Drain the receive buffer as raw bytes.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, S::Error> {
        let bytes = self.drain()?;
        debug!("<< {:02x?}", bytes);
        Ok(bytes)
    }

    /// Drain the receive buffer as text.
    pub fn read_text(&mut self) -> Result<String, S::Error> {
        let bytes = self.drain()?;
        // The firmware only ever sends ASCII. Anything else is mapped byte for byte rather than rejected, the
        // 72-2550 is known to leak stray bytes into its responses.
        let text: String = bytes.iter().map(|&b| b as char).collect();
        debug!("<< {}", text.trim());
        Ok(text)
    }

    /// Release the underlying interface.
    pub fn close(self) -> S {
        self.interface
    }

    fn drain(&mut self) -> Result<Vec<u8>, S::Error> {
        let mut out = Vec::new();
        let mut temp_buf = [0u8; 32];
        while self.interface.read_ready().map_err(Error::SerialError)? {
            let bytes_read = self
                .interface
                .read(&mut temp_buf)
                .map_err(Error::SerialError)?;
            if bytes_read == 0 {
                break;
            }
            out.extend_from_slice(&temp_buf[..bytes_read]);
        }
        Ok(out)
    }
}
