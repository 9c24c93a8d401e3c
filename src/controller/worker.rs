//! Call-lifetime worker: one thread per outbound dial.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::audio_route::CallAudioRouter;
use crate::controller::state::CallFlags;
use crate::defaults;
use crate::modem::channel::ModemChannel;
use crate::speech::Speaker;

/// Timing knobs for the worker. Tests shrink both to milliseconds.
#[derive(Debug, Clone)]
pub struct CallWorkerConfig {
    /// Maximum call duration before the worker hangs up on its own.
    pub ceiling: Duration,
    /// How often the cancellation flag is polled.
    pub poll: Duration,
}

impl Default for CallWorkerConfig {
    fn default() -> Self {
        Self {
            ceiling: Duration::from_secs(defaults::CALL_CEILING_SECS),
            poll: Duration::from_millis(defaults::CALL_POLL_MS),
        }
    }
}

/// Handle to an outstanding call-lifetime worker.
///
/// At most one exists at a time; the state machine checks `is_finished()`
/// before spawning another.
pub struct CallWorker {
    handle: JoinHandle<()>,
}

impl CallWorker {
    /// Issue the dial and supervise the call until hang-up or the ceiling.
    ///
    /// Audio routing is enabled before dialing so the local path is live
    /// when the far end picks up. A dial response without `OK`/`CONNECT`
    /// is logged and tolerated — the call may still be connecting and the
    /// voice interface has no better recourse than proceeding.
    pub fn spawn(
        channel: Arc<ModemChannel>,
        router: Arc<dyn CallAudioRouter>,
        speaker: Arc<dyn Speaker>,
        flags: Arc<CallFlags>,
        number: String,
        config: CallWorkerConfig,
    ) -> Self {
        let handle = thread::spawn(move || {
            if let Err(e) = router.enable_call_audio() {
                eprintln!("voxcall: {e}");
            }

            match channel.dial(&number) {
                Ok(response) if response.contains("OK") || response.contains("CONNECT") => {}
                Ok(_) => {
                    eprintln!("voxcall: dial response missing OK/CONNECT, proceeding anyway");
                }
                Err(e) => {
                    eprintln!("voxcall: dial command failed: {e}");
                }
            }

            flags.set_cancelled(false);
            flags.set_in_call(true);

            let steps = (config.ceiling.as_millis() / config.poll.as_millis().max(1)).max(1);
            for _ in 0..steps {
                if flags.cancelled() || !flags.in_call() {
                    break;
                }
                thread::sleep(config.poll);
            }

            // Ceiling reached with the call still up: hang up ourselves
            if flags.in_call() && !flags.cancelled() {
                if let Err(e) = channel.hangup() {
                    eprintln!("voxcall: automatic hangup failed: {e}");
                }
                if let Err(e) = router.disable_call_audio() {
                    eprintln!("voxcall: {e}");
                }
                flags.set_in_call(false);
                speaker.say("Call ended");
                eprintln!("voxcall: call ended automatically after timeout");
            }
        });

        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Join the worker, reporting a panic instead of propagating it.
    pub fn join(self) {
        if self.handle.join().is_err() {
            eprintln!("voxcall: call worker thread panicked");
        }
    }
}
