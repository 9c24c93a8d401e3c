//! The central call state machine.
//!
//! Every intent has a defined outcome in every state — a missed
//! transition here is a dropped phone call, so no-ops speak their reason
//! rather than silently ignoring the user.

use std::sync::Arc;

use crate::audio_route::CallAudioRouter;
use crate::contacts::ContactStore;
use crate::controller::state::{CallFlags, CallState, CollectPurpose, PhoneNumber};
use crate::controller::worker::{CallWorker, CallWorkerConfig};
use crate::intent::{Intent, ParseContext};
use crate::modem::channel::ModemChannel;
use crate::speech::Speaker;

pub struct CallStateMachine {
    state: CallState,
    channel: Arc<ModemChannel>,
    router: Arc<dyn CallAudioRouter>,
    store: Arc<dyn ContactStore>,
    speaker: Arc<dyn Speaker>,
    flags: Arc<CallFlags>,
    worker: Option<CallWorker>,
    country_code: String,
    worker_config: CallWorkerConfig,
}

impl CallStateMachine {
    pub fn new(
        channel: Arc<ModemChannel>,
        router: Arc<dyn CallAudioRouter>,
        store: Arc<dyn ContactStore>,
        speaker: Arc<dyn Speaker>,
        flags: Arc<CallFlags>,
        country_code: String,
        worker_config: CallWorkerConfig,
    ) -> Self {
        Self {
            state: CallState::Idle,
            channel,
            router,
            store,
            speaker,
            flags,
            worker: None,
            country_code,
            worker_config,
        }
    }

    /// Snapshot for the intent parser.
    pub fn parse_context(&self) -> ParseContext {
        ParseContext {
            name_entry: matches!(self.state, CallState::CollectingName { .. }),
            save_flow: matches!(
                self.state,
                CallState::CollectingName { .. }
                    | CallState::CollectingNumber {
                        purpose: CollectPurpose::Save,
                        ..
                    }
            ),
        }
    }

    pub fn state(&self) -> &CallState {
        &self.state
    }

    /// True while a call session exists: dialing, ringing out, or up.
    pub fn session_active(&mut self) -> bool {
        self.reap_worker();
        self.flags.in_call() || self.worker.is_some()
    }

    /// Drop the worker handle once its thread has exited.
    fn reap_worker(&mut self) {
        if self.worker.as_ref().is_some_and(|w| w.is_finished())
            && let Some(worker) = self.worker.take()
        {
            worker.join();
        }
    }

    /// Join any outstanding worker. Called on controller shutdown.
    pub fn shutdown(&mut self) {
        if self.flags.in_call() {
            self.hang_up_call();
        }
        if let Some(worker) = self.worker.take() {
            worker.join();
        }
    }

    /// Apply one parsed intent to the current state.
    pub fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::None => {}
            Intent::StartCall => self.on_start_call(),
            Intent::StartSave => self.on_start_save(),
            Intent::Digits(digits) => self.on_digits(&digits),
            Intent::Letter(ch) => self.on_letter(ch),
            Intent::FinishName => self.on_finish_name(),
            Intent::Affirm => self.on_affirm(),
            Intent::HangUp => self.on_hang_up(),
        }
    }

    fn on_start_call(&mut self) {
        if self.session_active() {
            self.speaker.say("A call is already in progress");
            return;
        }
        self.state = CallState::CollectingNumber {
            purpose: CollectPurpose::Call,
            digits: PhoneNumber::new(),
        };
        self.speaker.say("Tell me number");
    }

    fn on_start_save(&mut self) {
        self.state = CallState::CollectingNumber {
            purpose: CollectPurpose::Save,
            digits: PhoneNumber::new(),
        };
        self.speaker.say("Please say the 9 digit number");
    }

    fn on_digits(&mut self, spoken: &str) {
        let CallState::CollectingNumber { purpose, digits } = &mut self.state else {
            // Digits spoken mid-call drive the far end's menus via DTMF
            if self.state.is_idle() && self.session_active() {
                for digit in spoken.chars() {
                    if let Err(e) = self.channel.send_dtmf(digit) {
                        eprintln!("voxcall: DTMF send failed: {e}");
                    }
                }
            }
            return;
        };

        digits.push_digits(spoken);
        eprintln!("voxcall: accumulated digits: {}", digits.as_str());
        if !digits.is_complete() {
            return;
        }

        let purpose = *purpose;
        let number = digits.clone();
        match purpose {
            CollectPurpose::Call => {
                self.state = CallState::Idle;
                self.start_dial(number);
            }
            CollectPurpose::Save => {
                self.speaker.say(
                    "Number recorded. Now please spell the name letter by letter. \
                     Say done when finished.",
                );
                self.state = CallState::CollectingName {
                    letters: String::new(),
                    number,
                };
            }
        }
    }

    fn start_dial(&mut self, number: PhoneNumber) {
        if self.session_active() {
            self.speaker.say("A call is already in progress");
            return;
        }
        self.speaker.say(&format!("Calling number {}", number.spoken()));
        let dialable = number.dialable(&self.country_code);
        eprintln!("voxcall: dialing {dialable}");
        self.worker = Some(CallWorker::spawn(
            self.channel.clone(),
            self.router.clone(),
            self.speaker.clone(),
            self.flags.clone(),
            dialable,
            self.worker_config.clone(),
        ));
    }

    fn on_letter(&mut self, ch: char) {
        if let CallState::CollectingName { letters, .. } = &mut self.state {
            letters.push(ch);
            let spaced: Vec<String> = letters.chars().map(|c| c.to_string()).collect();
            self.speaker
                .say(&format!("Accumulated letters: {}", spaced.join(" ")));
        }
    }

    fn on_finish_name(&mut self) {
        let CallState::CollectingName { letters, number } = &self.state else {
            return;
        };
        if letters.is_empty() {
            self.speaker.say("No letters were detected. Please try again.");
        } else {
            match self.store.store(letters, number.as_str()) {
                Ok(()) => self.speaker.say("Number saved successfully."),
                Err(e) => {
                    eprintln!("voxcall: {e}");
                    self.speaker.say("Saving the number failed");
                }
            }
        }
        // Draft discarded on completion and abandonment alike
        self.state = CallState::Idle;
    }

    fn on_affirm(&mut self) {
        // Only meaningful at rest; during digit or name entry "yes" is
        // most likely recognition noise.
        if !self.state.is_idle() {
            return;
        }
        if !self.flags.ring() {
            self.speaker.say("No incoming call to answer");
            return;
        }
        if self.session_active() {
            self.speaker.say("A call is already in progress");
            return;
        }
        if let Err(e) = self.router.enable_call_audio() {
            eprintln!("voxcall: {e}");
        }
        match self.channel.answer() {
            Ok(_) => {}
            Err(e) => eprintln!("voxcall: answer command failed: {e}"),
        }
        self.flags.set_ring(false);
        self.flags.set_in_call(true);
        self.speaker.say("Call answered");
    }

    fn on_hang_up(&mut self) {
        if self.flags.in_call() {
            self.hang_up_call();
        } else {
            self.speaker.say("No active call to hang up");
        }
        // Collection state survives a stray "hang up"
    }

    /// Forward hang-up: issue ATH, tear down audio, signal the worker.
    fn hang_up_call(&mut self) {
        if let Err(e) = self.channel.hangup() {
            eprintln!("voxcall: hangup command failed: {e}");
        }
        if let Err(e) = self.router.disable_call_audio() {
            eprintln!("voxcall: {e}");
        }
        self.flags.set_in_call(false);
        self.flags.set_cancelled(true);
        self.speaker.say("Call ended");
        self.reap_worker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_route::NoopAudioRouter;
    use crate::contacts::MemoryContactStore;
    use crate::intent;
    use crate::modem::port::ScriptedModemPort;
    use crate::speech::CollectorSpeaker;
    use std::time::Duration;

    struct Harness {
        machine: CallStateMachine,
        port: ScriptedModemPort,
        router: Arc<NoopAudioRouter>,
        store: Arc<MemoryContactStore>,
        speaker: Arc<CollectorSpeaker>,
        flags: Arc<CallFlags>,
    }

    impl Harness {
        fn new() -> Self {
            Self::build(
                CallWorkerConfig {
                    ceiling: Duration::from_millis(40),
                    poll: Duration::from_millis(5),
                },
                Duration::from_millis(1),
            )
        }

        fn build(worker_config: CallWorkerConfig, call_window: Duration) -> Self {
            let port = ScriptedModemPort::new();
            let channel = Arc::new(ModemChannel::new(
                Box::new(port.clone()),
                Duration::from_millis(1),
                call_window,
            ));
            let router = Arc::new(NoopAudioRouter::new());
            let store = Arc::new(MemoryContactStore::new());
            let speaker = Arc::new(CollectorSpeaker::new());
            let flags = Arc::new(CallFlags::new());
            let machine = CallStateMachine::new(
                channel,
                router.clone(),
                store.clone(),
                speaker.clone(),
                flags.clone(),
                "+995".to_string(),
                worker_config,
            );
            Self {
                machine,
                port,
                router,
                store,
                speaker,
                flags,
            }
        }

        fn say(&mut self, utterance: &str) {
            let ctx = self.machine.parse_context();
            self.machine.apply(intent::parse(utterance, ctx));
        }

        fn wait_for_call(&self) {
            let deadline = std::time::Instant::now() + Duration::from_secs(2);
            while !self.flags.in_call() && std::time::Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(2));
            }
        }

        fn wait_for_idle(&mut self) {
            let deadline = std::time::Instant::now() + Duration::from_secs(2);
            while self.machine.session_active() && std::time::Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(5));
            }
        }
    }

    #[test]
    fn test_call_flow_accumulates_until_nine_digits() {
        // Scenario 1: fewer than 9 digits keeps collecting
        let mut h = Harness::new();
        h.say("call");
        h.say("five two five");
        h.say("three zero zero");

        match h.machine.state() {
            CallState::CollectingNumber { digits, .. } => {
                assert_eq!(digits.as_str(), "525300");
            }
            other => panic!("expected CollectingNumber, got {other:?}"),
        }
        assert!(h.port.written_commands().is_empty(), "no dial before 9 digits");

        h.say("one two three");
        h.wait_for_call();
        h.wait_for_idle();
        assert_eq!(h.port.written_commands()[0], "ATD+995525300123;");
    }

    #[test]
    fn test_save_flow_persists_contact() {
        // Scenario 2
        let mut h = Harness::new();
        h.say("save number");
        h.say("one two three four five six seven eight nine");
        h.say("j");
        h.say("o");
        h.say("h");
        h.say("n");
        h.say("done");

        assert_eq!(
            h.store.records(),
            vec![("JOHN".to_string(), "123456789".to_string())]
        );
        assert!(h.machine.state().is_idle());
        assert!(
            h.speaker
                .prompts()
                .iter()
                .any(|p| p == "Number saved successfully."),
        );
    }

    #[test]
    fn test_save_flow_without_letters_reprompts() {
        let mut h = Harness::new();
        h.say("save number");
        h.say("one two three four five six seven eight nine");
        h.say("done");

        assert!(h.store.records().is_empty());
        assert!(h.machine.state().is_idle());
        assert!(
            h.speaker
                .prompts()
                .iter()
                .any(|p| p.contains("No letters were detected")),
        );
    }

    #[test]
    fn test_multi_letter_words_do_not_spell() {
        let mut h = Harness::new();
        h.say("save number");
        h.say("one two three four five six seven eight nine");
        h.say("cat");
        h.say("j");
        h.say("done");

        assert_eq!(
            h.store.records(),
            vec![("J".to_string(), "123456789".to_string())]
        );
    }

    #[test]
    fn test_ring_then_yes_answers() {
        // Scenario 3
        let mut h = Harness::new();
        h.flags.set_ring(true);
        h.say("yes");

        assert_eq!(h.port.written_commands(), vec!["ATA"]);
        assert!(h.flags.in_call());
        assert!(!h.flags.ring(), "ring flag cleared after answering");
        assert_eq!(h.router.enable_count(), 1);
        assert!(h.speaker.prompts().iter().any(|p| p == "Call answered"));
    }

    #[test]
    fn test_yes_without_ring_explains() {
        let mut h = Harness::new();
        h.say("yes");
        assert!(h.port.written_commands().is_empty());
        assert!(
            h.speaker
                .prompts()
                .iter()
                .any(|p| p == "No incoming call to answer"),
        );
    }

    #[test]
    fn test_hang_up_before_digits_keeps_collecting() {
        // Scenario 4
        let mut h = Harness::new();
        h.say("call");
        h.say("hang up");

        assert!(
            h.speaker
                .prompts()
                .iter()
                .any(|p| p == "No active call to hang up"),
        );
        assert!(matches!(
            h.machine.state(),
            CallState::CollectingNumber { .. }
        ));
    }

    #[test]
    fn test_hang_up_ends_active_call() {
        let mut h = Harness::new();
        h.flags.set_in_call(true);
        h.say("hang up");

        assert_eq!(h.port.written_commands(), vec!["ATH"]);
        assert!(!h.flags.in_call());
        assert!(h.flags.cancelled());
        assert_eq!(h.router.disable_count(), 1);
        assert!(h.speaker.prompts().iter().any(|p| p == "Call ended"));
    }

    #[test]
    fn test_automatic_hangup_at_ceiling() {
        // Scenario 5: nobody says "hang up" within the ceiling
        let mut h = Harness::new();
        h.say("call");
        h.say("one two three four five six seven eight nine");
        h.wait_for_call();
        h.wait_for_idle();

        let commands = h.port.written_commands();
        assert_eq!(commands[0], "ATD+995123456789;");
        assert_eq!(commands[1], "ATH");
        assert!(!h.flags.in_call());
        assert!(h.speaker.prompts().iter().any(|p| p == "Call ended"));
    }

    #[test]
    fn test_second_dial_refused_while_call_active() {
        let mut h = Harness::new();
        h.flags.set_in_call(true);
        h.say("call");

        assert!(
            h.speaker
                .prompts()
                .iter()
                .any(|p| p == "A call is already in progress"),
        );
        assert!(h.machine.state().is_idle(), "no digit collection started");
        assert!(h.port.written_commands().is_empty());
    }

    #[test]
    fn test_second_dial_refused_while_worker_outstanding() {
        // The first worker is still inside its ATD exchange (long dial
        // window), so the call flag is not set yet; the outstanding
        // worker handle alone must be enough to refuse a second dial.
        let mut h = Harness::build(
            CallWorkerConfig {
                ceiling: Duration::from_secs(10),
                poll: Duration::from_millis(5),
            },
            Duration::from_millis(500),
        );
        h.say("call");
        h.say("one two three four five six seven eight nine");
        assert!(!h.flags.in_call(), "dial still in flight");

        h.say("call");
        assert!(
            h.speaker
                .prompts()
                .iter()
                .any(|p| p == "A call is already in progress"),
        );
        assert!(h.machine.state().is_idle(), "no second digit collection");

        h.wait_for_call();
        h.machine.shutdown();
        let dials = h
            .port
            .written_commands()
            .iter()
            .filter(|c| c.starts_with("ATD"))
            .count();
        assert_eq!(dials, 1, "only the first dial was issued");
    }

    #[test]
    fn test_answer_refused_while_call_active() {
        let mut h = Harness::new();
        h.flags.set_in_call(true);
        h.flags.set_ring(true);
        h.say("yes");

        assert!(h.port.written_commands().is_empty());
        assert!(
            h.speaker
                .prompts()
                .iter()
                .any(|p| p == "A call is already in progress"),
        );
    }

    #[test]
    fn test_digits_during_call_forward_dtmf() {
        let mut h = Harness::new();
        h.flags.set_in_call(true);
        h.say("five two");

        assert_eq!(h.port.written_commands(), vec!["AT+VTS=5", "AT+VTS=2"]);
    }

    #[test]
    fn test_digits_while_idle_without_call_are_ignored() {
        let mut h = Harness::new();
        h.say("five two");
        assert!(h.port.written_commands().is_empty());
        assert!(h.speaker.prompts().is_empty());
    }

    #[test]
    fn test_non_digit_tokens_never_enter_accumulator() {
        let mut h = Harness::new();
        h.say("call");
        h.say("banana five two");

        match h.machine.state() {
            CallState::CollectingNumber { digits, .. } => {
                assert_eq!(digits.as_str(), "52");
            }
            other => panic!("expected CollectingNumber, got {other:?}"),
        }
    }

    #[test]
    fn test_extra_digits_beyond_ninth_are_discarded() {
        let mut h = Harness::new();
        h.say("call");
        h.say("one two three four five six seven eight nine zero one");
        h.wait_for_call();
        h.wait_for_idle();

        assert_eq!(h.port.written_commands()[0], "ATD+995123456789;");
    }

    #[test]
    fn test_call_trigger_suppressed_during_save() {
        let mut h = Harness::new();
        h.say("save number");
        h.say("call");

        // Still collecting the save-flow number; no dial state started
        assert!(matches!(
            h.machine.state(),
            CallState::CollectingNumber {
                purpose: CollectPurpose::Save,
                ..
            }
        ));
    }

    #[test]
    fn test_shutdown_hangs_up_active_call() {
        let mut h = Harness::new();
        h.flags.set_in_call(true);
        h.machine.shutdown();

        assert_eq!(h.port.written_commands(), vec!["ATH"]);
        assert!(!h.flags.in_call());
    }
}
