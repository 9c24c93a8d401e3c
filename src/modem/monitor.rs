//! Background monitor for unsolicited incoming-call notifications.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::controller::state::CallFlags;
use crate::modem::channel::ModemChannel;

/// How long the monitor sleeps between drains of the unsolicited stream.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Watches the modem's unsolicited line stream and raises the shared ring
/// flag when a `RING` burst arrives.
///
/// The loop exits on channel failure or shutdown; its death only stops
/// incoming-call detection, never the rest of the controller.
pub struct IncomingCallMonitor;

impl IncomingCallMonitor {
    pub fn spawn(
        channel: Arc<ModemChannel>,
        flags: Arc<CallFlags>,
        running: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                match channel.read_unsolicited() {
                    Ok(Some(burst)) => {
                        if burst.contains("RING") && !flags.ring() {
                            eprintln!("voxcall: incoming call detected");
                            flags.set_ring(true);
                        }
                        // Best-effort remote disconnect detection; the
                        // worker stops polling once the flag clears
                        if burst.contains("NO CARRIER") && flags.in_call() {
                            eprintln!("voxcall: remote end disconnected");
                            flags.set_in_call(false);
                            flags.set_cancelled(true);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        eprintln!("voxcall: incoming call monitor stopped: {e}");
                        break;
                    }
                }
                thread::sleep(IDLE_POLL);
            }
        })
    }
}
