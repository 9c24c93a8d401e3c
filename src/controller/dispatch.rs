//! Recognition dispatch loop and controller lifecycle.
//!
//! The dispatch loop is the program's single control thread: it pulls
//! utterances, parses them, and applies transitions. Call-duration waits
//! live in the worker thread, so "hang up" spoken mid-call is dispatched
//! promptly instead of queuing behind a 30-second sleep.

use crossbeam_channel::{RecvTimeoutError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::controller::machine::CallStateMachine;
use crate::controller::state::CallFlags;
use crate::intent;
use crate::modem::channel::ModemChannel;
use crate::modem::monitor::IncomingCallMonitor;
use crate::speech::UtteranceSource;

/// Utterances buffered between the reader and the dispatch loop.
const UTTERANCE_BUFFER: usize = 8;

/// Composition root for the running controller.
pub struct Controller {
    machine: CallStateMachine,
    channel: Arc<ModemChannel>,
    flags: Arc<CallFlags>,
}

impl Controller {
    pub fn new(
        machine: CallStateMachine,
        channel: Arc<ModemChannel>,
        flags: Arc<CallFlags>,
    ) -> Self {
        Self {
            machine,
            channel,
            flags,
        }
    }

    /// Start the reader, dispatch loop and incoming-call monitor.
    ///
    /// The utterance source feeds a bounded channel from its own thread;
    /// the dispatch thread owns the state machine and drains that channel
    /// with a timeout so shutdown is never stuck behind a blocking read.
    /// The monitor only touches the shared ring/call flags.
    pub fn start(self, mut source: Box<dyn UtteranceSource>) -> ControllerHandle {
        let running = Arc::new(AtomicBool::new(true));

        let monitor_handle =
            IncomingCallMonitor::spawn(self.channel.clone(), self.flags.clone(), running.clone());

        let (utterance_tx, utterance_rx) = bounded::<String>(UTTERANCE_BUFFER);
        let reader_running = running.clone();
        let reader_handle = thread::spawn(move || {
            while reader_running.load(Ordering::SeqCst) {
                let Some(utterance) = source.next_utterance() else {
                    break;
                };
                if utterance_tx.send(utterance).is_err() {
                    break;
                }
            }
            // Dropping the sender ends the dispatch loop
        });

        let dispatch_running = running.clone();
        let mut machine = self.machine;
        let dispatch_handle = thread::spawn(move || {
            loop {
                match utterance_rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(utterance) => {
                        let ctx = machine.parse_context();
                        machine.apply(intent::parse(&utterance, ctx));
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if !dispatch_running.load(Ordering::SeqCst) {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            machine.shutdown();
            dispatch_running.store(false, Ordering::SeqCst);
        });

        ControllerHandle {
            running,
            dispatch: Some(dispatch_handle),
            reader: Some(reader_handle),
            monitor: Some(monitor_handle),
        }
    }
}

/// Handle to a running controller.
pub struct ControllerHandle {
    running: Arc<AtomicBool>,
    dispatch: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
    monitor: Option<JoinHandle<()>>,
}

impl ControllerHandle {
    /// Returns true while the dispatch loop is alive.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Block until the utterance stream ends, then shut down the monitor.
    pub fn wait(mut self) {
        if let Some(dispatch) = self.dispatch.take()
            && dispatch.join().is_err()
        {
            eprintln!("voxcall: dispatch thread panicked");
        }
        self.stop();
    }

    /// Signal shutdown and join the remaining threads with a deadline.
    ///
    /// After the deadline, stragglers are detached — they die with the
    /// process.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);

        let deadline = Instant::now() + Duration::from_secs(2);
        let poll_interval = Duration::from_millis(50);

        let mut pending: Vec<JoinHandle<()>> = self
            .dispatch
            .take()
            .into_iter()
            .chain(self.reader.take())
            .chain(self.monitor.take())
            .collect();

        loop {
            let mut remaining = Vec::new();
            for handle in pending.drain(..) {
                if handle.is_finished() {
                    if handle.join().is_err() {
                        eprintln!("voxcall: controller thread panicked");
                    }
                } else {
                    remaining.push(handle);
                }
            }
            pending = remaining;

            if pending.is_empty() {
                break;
            }
            if Instant::now() >= deadline {
                eprintln!(
                    "voxcall: shutdown timeout — {} thread(s) still running, detaching",
                    pending.len()
                );
                break;
            }
            thread::sleep(poll_interval);
        }
    }
}
