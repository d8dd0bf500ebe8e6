//! We use this mocking module in unit tests to emulate a serial port with a PSU on the other end.

use std::collections::{HashMap, VecDeque};

/// Our mock type used to emulate a serial port.
///
/// Every `write` call is recorded as one command. Queries (commands ending in `?`) release the next queued
/// response into the read buffer. With echo enabled, setters such as `VSET1:5.00` are remembered and a later
/// `VSET1?` without a queued response answers `5.00`, like a device which accepted the value.
#[derive(Default)]
pub struct MockSerial {
    /// Every write, one entry per call.
    sent: Vec<Vec<u8>>,
    /// Responses waiting for a query.
    responses: VecDeque<Vec<u8>>,
    /// Data available to be read.
    read_buffer: VecDeque<u8>,
    /// Last value written with each setter, keyed by mnemonic and channel.
    echo: Option<HashMap<String, String>>,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
}

#[derive(Debug)]
pub enum MockSerialError {
    /// Generic simulated error for testing
    SimulatedError,
}

impl core::fmt::Display for MockSerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MockSerialError::SimulatedError => write!(f, "Simulated serial error"),
        }
    }
}

impl core::error::Error for MockSerialError {}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }

        self.sent.push(buf.to_vec());
        let line = String::from_utf8_lossy(buf);
        self.handle_command(line.trim_end());

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        let bytes_to_read = core::cmp::min(buf.len(), self.read_buffer.len());
        for (slot, byte) in buf.iter_mut().zip(self.read_buffer.drain(..bytes_to_read)) {
            *slot = byte;
        }
        Ok(bytes_to_read)
    }
}

impl embedded_io::ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(!self.read_buffer.is_empty())
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock which remembers setter values and answers queries with them.
    pub fn echoing() -> Self {
        Self {
            echo: Some(HashMap::new()),
            ..Self::default()
        }
    }

    /// Queue a response, released into the read buffer by the next query.
    pub fn push_response(&mut self, data: &[u8]) {
        self.responses.push_back(data.to_vec());
    }

    /// Make data readable right away, without waiting for a query.
    pub fn set_read_data(&mut self, data: &[u8]) {
        self.read_buffer.extend(data.iter().copied());
    }

    /// Every write as a string, terminators included.
    pub fn sent(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    /// Every write with its terminator stripped.
    pub fn commands(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|line| line.trim_end().to_owned())
            .collect()
    }

    /// Responses which were queued but never asked for.
    pub fn pending_responses(&self) -> usize {
        self.responses.len()
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    fn handle_command(&mut self, line: &str) {
        if let Some(key) = line.strip_suffix('?') {
            if let Some(response) = self.responses.pop_front() {
                self.read_buffer.extend(response);
            } else if let Some(value) = self.echo.as_ref().and_then(|echo| echo.get(key)) {
                self.read_buffer.extend(value.bytes());
            }
        } else if let Some((key, value)) = line.split_once(':') {
            if let Some(echo) = self.echo.as_mut() {
                echo.insert(key.to_owned(), value.to_owned());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, ReadReady, Write};

    #[test]
    fn test_new_mock_serial() {
        let mock = MockSerial::new();
        assert!(mock.sent().is_empty());
        assert_eq!(mock.pending_responses(), 0);
        assert!(!mock.should_error_on_write);
        assert!(!mock.should_error_on_read);
    }

    #[test]
    fn test_write_multiple_times() {
        let mut mock = MockSerial::new();
        mock.write(b"OUT1").unwrap();
        mock.write(b"VSET1?\n").unwrap();

        assert_eq!(mock.sent(), vec!["OUT1", "VSET1?\n"]);
        assert_eq!(mock.commands(), vec!["OUT1", "VSET1?"]);
    }

    #[test]
    fn test_response_released_by_query_only() {
        let mut mock = MockSerial::new();
        mock.push_response(b"5.00");

        mock.write(b"OUT1").unwrap();
        assert!(!mock.read_ready().unwrap());

        mock.write(b"VSET1?").unwrap();
        assert!(mock.read_ready().unwrap());

        let mut buffer = [0u8; 10];
        let read = mock.read(&mut buffer).unwrap();
        assert_eq!(&buffer[..read], b"5.00");
        assert!(!mock.read_ready().unwrap());
    }

    #[test]
    fn test_read_partial_data() {
        let mut mock = MockSerial::new();
        mock.set_read_data(b"Long response data");

        let mut buffer = [0u8; 5];
        assert_eq!(mock.read(&mut buffer).unwrap(), 5);
        assert_eq!(&buffer, b"Long ");
        assert!(mock.read_ready().unwrap());
    }

    #[test]
    fn test_echo() {
        let mut mock = MockSerial::echoing();
        mock.write(b"VSET2:12.34\n").unwrap();
        mock.write(b"VSET2?\n").unwrap();

        let mut buffer = [0u8; 10];
        let read = mock.read(&mut buffer).unwrap();
        assert_eq!(&buffer[..read], b"12.34");
    }

    #[test]
    fn test_queued_response_wins_over_echo() {
        let mut mock = MockSerial::echoing();
        mock.push_response(b"1.00");
        mock.write(b"VSET1:2.00").unwrap();
        mock.write(b"VSET1?").unwrap();

        let mut buffer = [0u8; 10];
        let read = mock.read(&mut buffer).unwrap();
        assert_eq!(&buffer[..read], b"1.00");
    }

    #[test]
    fn test_error_simulation() {
        let mut mock = MockSerial::new();
        mock.set_write_error(true);
        assert!(mock.write(b"test").is_err());
        assert!(mock.flush().is_err());
        assert!(mock.sent().is_empty());

        mock.set_read_error(true);
        let mut buffer = [0u8; 10];
        assert!(mock.read(&mut buffer).is_err());
        assert!(mock.read_ready().is_err());
        assert!(matches!(
            MockSerialError::SimulatedError.kind(),
            embedded_io::ErrorKind::Other
        ));
        assert_eq!(MockSerialError::SimulatedError.to_string(), "Simulated serial error");
    }
}
