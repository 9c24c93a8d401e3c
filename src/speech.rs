//! Speech boundaries: utterance input and spoken prompts.
//!
//! The recognition engine itself lives outside this process; it pipes one
//! lower-cased utterance per line into stdin. Prompts go out through a
//! best-effort `Speaker` — a failed prompt never affects call state.

use std::io::{BufRead, BufReader, Stdin};
use std::process::Command;
use std::sync::Mutex;

use crate::defaults;

/// Source of recognized utterances. Blocking; `None` means the stream ended.
pub trait UtteranceSource: Send {
    fn next_utterance(&mut self) -> Option<String>;
}

/// Reads utterances line by line from stdin.
///
/// Lines are trimmed and lower-cased; empty lines are skipped.
pub struct StdinUtteranceSource {
    reader: BufReader<Stdin>,
}

impl StdinUtteranceSource {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(std::io::stdin()),
        }
    }
}

impl Default for StdinUtteranceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl UtteranceSource for StdinUtteranceSource {
    fn next_utterance(&mut self) -> Option<String> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {
                    let text = line.trim().to_lowercase();
                    if !text.is_empty() {
                        return Some(text);
                    }
                }
                Err(e) => {
                    eprintln!("voxcall: failed to read utterance: {e}");
                    return None;
                }
            }
        }
    }
}

/// Speaks prompts back to the user. Best-effort: implementations log
/// failures and return.
pub trait Speaker: Send + Sync {
    fn say(&self, text: &str);
}

/// Speaks through the `espeak` command-line synthesizer.
pub struct EspeakSpeaker {
    rate: u32,
}

impl EspeakSpeaker {
    pub fn new() -> Self {
        Self {
            rate: defaults::SPEECH_RATE,
        }
    }

    pub fn with_rate(mut self, rate: u32) -> Self {
        self.rate = rate;
        self
    }
}

impl Default for EspeakSpeaker {
    fn default() -> Self {
        Self::new()
    }
}

impl Speaker for EspeakSpeaker {
    fn say(&self, text: &str) {
        let result = Command::new("espeak")
            .arg("-s")
            .arg(self.rate.to_string())
            .arg(text)
            .status();
        match result {
            Ok(status) if status.success() => {}
            Ok(status) => eprintln!("voxcall: espeak exited with {status}"),
            Err(e) => eprintln!("voxcall: failed to run espeak: {e}"),
        }
    }
}

/// Discards all prompts. Used with `--quiet`.
pub struct NullSpeaker;

impl Speaker for NullSpeaker {
    fn say(&self, _text: &str) {}
}

/// Records every prompt for inspection. Test double.
#[derive(Default)]
pub struct CollectorSpeaker {
    prompts: Mutex<Vec<String>>,
}

impl CollectorSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Speaker for CollectorSpeaker {
    fn say(&self, text: &str) {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(text.to_string());
        }
    }
}
