//! Serialized AT command/response exchanges.

use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::error::{Result, VoxcallError};
use crate::modem::port::ModemPort;

/// Half-duplex AT command channel.
///
/// The port lives behind a mutex and a full exchange (write, wait, drain)
/// holds it for the entire response window. That single discipline keeps
/// commands from different threads from interleaving and keeps the
/// unsolicited-line reader from stealing bytes out of an in-flight
/// response.
pub struct ModemChannel {
    port: Mutex<Box<dyn ModemPort>>,
    response_window: Duration,
    call_window: Duration,
}

impl ModemChannel {
    pub fn new(port: Box<dyn ModemPort>, response_window: Duration, call_window: Duration) -> Self {
        Self {
            port: Mutex::new(port),
            response_window,
            call_window,
        }
    }

    /// Send one AT command and return whatever the modem said within the
    /// window, decoded leniently (invalid bytes dropped, never fatal).
    pub fn send(&self, command: &str, window: Duration) -> Result<String> {
        let mut port = self.port.lock().map_err(|_| VoxcallError::Modem {
            message: "modem port lock poisoned".to_string(),
        })?;
        port.write_all(format!("{command}\r\n").as_bytes())?;
        thread::sleep(window);
        let bytes = port.read_available()?;
        Ok(String::from_utf8_lossy(&bytes).trim().to_string())
    }

    /// Send with the default response window.
    pub fn command(&self, command: &str) -> Result<String> {
        self.send(command, self.response_window)
    }

    /// Liveness probe. A modem that does not answer `AT` with `OK` is a
    /// fatal precondition failure — the controller refuses to start.
    pub fn probe(&self, port_name: &str) -> Result<()> {
        let response = self.command("AT")?;
        if response.contains("OK") {
            Ok(())
        } else {
            Err(VoxcallError::ModemUnresponsive {
                port: port_name.to_string(),
            })
        }
    }

    /// SIM card status query (`AT+CPIN?`). Informational only.
    pub fn sim_status(&self) -> Result<String> {
        self.command("AT+CPIN?")
    }

    /// Dial a voice call. The trailing semicolon selects voice mode.
    ///
    /// The response is returned as-is; a missing `OK`/`CONNECT` token is a
    /// soft uncertainty the caller tolerates, not an error.
    pub fn dial(&self, number: &str) -> Result<String> {
        self.send(&format!("ATD{number};"), self.call_window)
    }

    /// Hang up the active call.
    pub fn hangup(&self) -> Result<String> {
        self.send("ATH", self.call_window)
    }

    /// Answer an incoming call.
    pub fn answer(&self) -> Result<String> {
        self.send("ATA", self.call_window)
    }

    /// Send a DTMF tone for a single digit during an active call.
    pub fn send_dtmf(&self, digit: char) -> Result<String> {
        self.send(&format!("AT+VTS={digit}"), self.response_window)
    }

    /// Drain any bytes the modem sent outside a command exchange.
    ///
    /// Returns `None` when the line is quiet. Blocks only for the lock, so
    /// the reader waits out in-flight commands instead of consuming their
    /// response bytes.
    pub fn read_unsolicited(&self) -> Result<Option<String>> {
        let mut port = self.port.lock().map_err(|_| VoxcallError::Modem {
            message: "modem port lock poisoned".to_string(),
        })?;
        let bytes = port.read_available()?;
        if bytes.is_empty() {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&bytes).trim().to_string();
        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }
}
