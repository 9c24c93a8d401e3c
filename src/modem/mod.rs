//! Serial channel to the SIM800L modem.
//!
//! Half-duplex AT command/response exchanges plus an unsolicited-line
//! reader for incoming call notifications.

pub mod channel;
pub mod monitor;
pub mod port;

pub use channel::ModemChannel;
pub use monitor::IncomingCallMonitor;
pub use port::{ModemPort, ScriptedModemPort, SerialModemPort};
