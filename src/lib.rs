//! voxcall - Voice-driven call control for SIM800L cellular modems
//!
//! Turns recognized speech into phone calls: dial by spoken digits,
//! answer incoming rings, save contacts letter by letter.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio_route;
pub mod cli;
pub mod config;
pub mod contacts;
pub mod controller;
pub mod defaults;
pub mod error;
pub mod intent;
pub mod modem;
pub mod speech;

// Core traits (speech → intent → modem / audio / contacts)
pub use audio_route::{CallAudioRouter, NoopAudioRouter, PactlAudioRouter};
pub use contacts::{ContactStore, FileContactStore, MemoryContactStore};
pub use speech::{
    CollectorSpeaker, EspeakSpeaker, NullSpeaker, Speaker, StdinUtteranceSource, UtteranceSource,
};

// Modem channel
pub use modem::channel::ModemChannel;
pub use modem::port::{ModemPort, ScriptedModemPort, SerialModemPort};

// Controller
pub use controller::dispatch::{Controller, ControllerHandle};
pub use controller::state::{CallFlags, CallState, PhoneNumber};

// Error handling
pub use error::{Result, VoxcallError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.1+abc1234"` when git hash is available, `"0.3.1"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }
}
