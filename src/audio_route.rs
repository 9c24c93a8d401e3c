//! Call audio routing: loopback bridges between the cellular audio path
//! and a local audio device.
//!
//! Routing failures are always non-fatal to the call itself — the modem
//! carries the call whether or not local audio is bridged.

use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::AudioConfig;
use crate::error::{Result, VoxcallError};

/// Enable/disable the audio path for an active call. Both operations are
/// idempotent.
pub trait CallAudioRouter: Send + Sync {
    fn enable_call_audio(&self) -> Result<()>;
    fn disable_call_audio(&self) -> Result<()>;
}

/// Routes call audio through PulseAudio loopback modules via `pactl`.
///
/// Enable loads two `module-loopback` instances (downlink and uplink);
/// disable unloads every loaded loopback module, which makes it idempotent
/// and also cleans up loopbacks left behind by a previous crash.
pub struct PactlAudioRouter {
    config: AudioConfig,
}

impl PactlAudioRouter {
    pub fn new(config: AudioConfig) -> Self {
        Self { config }
    }

    fn load_loopback(&self, source: &str, sink: &str) -> Result<()> {
        let output = Command::new("pactl")
            .args([
                "load-module",
                "module-loopback",
                &format!("source={source}"),
                &format!("sink={sink}"),
                &format!("latency_msec={}", self.config.latency_msec),
            ])
            .output()
            .map_err(|e| VoxcallError::AudioRouting {
                message: format!("failed to run pactl: {e}"),
            })?;
        if !output.status.success() {
            return Err(VoxcallError::AudioRouting {
                message: format!(
                    "pactl load-module exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }
}

impl CallAudioRouter for PactlAudioRouter {
    fn enable_call_audio(&self) -> Result<()> {
        self.load_loopback(&self.config.downlink_source, &self.config.downlink_sink)?;
        self.load_loopback(&self.config.uplink_source, &self.config.uplink_sink)?;
        Ok(())
    }

    fn disable_call_audio(&self) -> Result<()> {
        let output = Command::new("pactl")
            .args(["list", "short", "modules"])
            .output()
            .map_err(|e| VoxcallError::AudioRouting {
                message: format!("failed to run pactl: {e}"),
            })?;
        if !output.status.success() {
            return Err(VoxcallError::AudioRouting {
                message: format!("pactl list exited with {}", output.status),
            });
        }

        // "<index>\tmodule-loopback\t..." per loaded module
        let listing = String::from_utf8_lossy(&output.stdout);
        for line in listing.lines() {
            if !line.contains("module-loopback") {
                continue;
            }
            let Some(index) = line.split_whitespace().next() else {
                continue;
            };
            let status = Command::new("pactl")
                .args(["unload-module", index])
                .status()
                .map_err(|e| VoxcallError::AudioRouting {
                    message: format!("failed to run pactl: {e}"),
                })?;
            if !status.success() {
                eprintln!("voxcall: failed to unload loopback module {index}");
            }
        }
        Ok(())
    }
}

/// Performs no routing. Used with `--no-audio-routing` and in tests that
/// only care about telephony state.
#[derive(Default)]
pub struct NoopAudioRouter {
    enables: AtomicUsize,
    disables: AtomicUsize,
}

impl NoopAudioRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable_count(&self) -> usize {
        self.enables.load(Ordering::SeqCst)
    }

    pub fn disable_count(&self) -> usize {
        self.disables.load(Ordering::SeqCst)
    }
}

impl CallAudioRouter for NoopAudioRouter {
    fn enable_call_audio(&self) -> Result<()> {
        self.enables.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn disable_call_audio(&self) -> Result<()> {
        self.disables.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_router_counts_calls() {
        let router = NoopAudioRouter::new();
        router.enable_call_audio().unwrap();
        router.disable_call_audio().unwrap();
        router.disable_call_audio().unwrap();
        assert_eq!(router.enable_count(), 1);
        assert_eq!(router.disable_count(), 2);
    }

    #[test]
    fn test_disable_twice_is_idempotent() {
        // Disabling with nothing routed must not error
        let router = NoopAudioRouter::new();
        assert!(router.disable_call_audio().is_ok());
        assert!(router.disable_call_audio().is_ok());
    }
}
