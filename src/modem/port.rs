//! Byte-level access to the modem's serial line.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Result, VoxcallError};

/// Read timeout on the raw port. Short so `read_available` drains whatever
/// has arrived and returns promptly when the line is quiet.
const PORT_READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Raw byte transport to the modem.
///
/// Implementations never interpret the bytes; framing and decoding live in
/// [`super::channel::ModemChannel`].
pub trait ModemPort: Send {
    /// Write all bytes to the line.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read every byte currently available, returning an empty vector when
    /// the line is quiet.
    fn read_available(&mut self) -> Result<Vec<u8>>;
}

/// Production port over a real serial device.
pub struct SerialModemPort {
    inner: Box<dyn serialport::SerialPort>,
}

impl SerialModemPort {
    /// Opens the serial device at the given baud rate.
    pub fn open(port: &str, baud: u32) -> Result<Self> {
        let inner = serialport::new(port, baud)
            .timeout(PORT_READ_TIMEOUT)
            .open()
            .map_err(|e| VoxcallError::SerialOpen {
                port: port.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { inner })
    }
}

impl ModemPort for SerialModemPort {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).map_err(|e| VoxcallError::Modem {
            message: format!("serial write failed: {e}"),
        })?;
        self.inner.flush().map_err(|e| VoxcallError::Modem {
            message: format!("serial flush failed: {e}"),
        })?;
        Ok(())
    }

    fn read_available(&mut self) -> Result<Vec<u8>> {
        let mut collected = Vec::new();
        let mut scratch = [0u8; 256];
        loop {
            match self.inner.read(&mut scratch) {
                Ok(0) => break,
                Ok(n) => {
                    collected.extend_from_slice(&scratch[..n]);
                    // Keep draining only while the module is still talking
                    if self.inner.bytes_to_read().unwrap_or(0) == 0 {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                    break;
                }
                Err(e) => {
                    return Err(VoxcallError::Modem {
                        message: format!("serial read failed: {e}"),
                    });
                }
            }
        }
        Ok(collected)
    }
}

/// In-memory port with canned responses. Test double, also used by the
/// integration tests.
///
/// Every write is recorded; each write pops the next scripted response,
/// which becomes available to the following read. Unsolicited bytes can be
/// injected at any time to simulate RING bursts.
#[derive(Clone, Default)]
pub struct ScriptedModemPort {
    state: Arc<Mutex<ScriptState>>,
}

#[derive(Default)]
struct ScriptState {
    written: Vec<String>,
    responses: VecDeque<Vec<u8>>,
    pending: Vec<u8>,
    fail_reads: bool,
}

impl ScriptedModemPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the response returned after the next unanswered write.
    pub fn push_response(&self, response: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.responses.push_back(response.as_bytes().to_vec());
        }
    }

    /// Queue a raw byte response, for exercising lenient decoding.
    pub fn push_response_bytes(&self, response: &[u8]) {
        if let Ok(mut state) = self.state.lock() {
            state.responses.push_back(response.to_vec());
        }
    }

    /// Inject bytes that arrive outside any command exchange.
    pub fn inject_unsolicited(&self, line: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.pending.extend_from_slice(line.as_bytes());
            state.pending.extend_from_slice(b"\r\n");
        }
    }

    /// Make every subsequent read fail, simulating a dead line.
    pub fn fail_reads(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_reads = true;
        }
    }

    /// Commands written so far, line endings stripped.
    pub fn written_commands(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.written.clone())
            .unwrap_or_default()
    }
}

impl ModemPort for ScriptedModemPort {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.state.lock().map_err(|_| VoxcallError::Modem {
            message: "scripted port lock poisoned".to_string(),
        })?;
        let text = String::from_utf8_lossy(bytes).trim().to_string();
        state.written.push(text);
        if let Some(response) = state.responses.pop_front() {
            state.pending.extend_from_slice(&response);
        }
        Ok(())
    }

    fn read_available(&mut self) -> Result<Vec<u8>> {
        let mut state = self.state.lock().map_err(|_| VoxcallError::Modem {
            message: "scripted port lock poisoned".to_string(),
        })?;
        if state.fail_reads {
            return Err(VoxcallError::Modem {
                message: "scripted read failure".to_string(),
            });
        }
        Ok(std::mem::take(&mut state.pending))
    }
}
