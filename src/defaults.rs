//! Default configuration constants for voxcall.
//!
//! Shared constants used across configuration types to keep the serial,
//! call and audio defaults in one place.

/// Default serial device for the SIM800L module.
///
/// `/dev/ttyS0` is the primary UART on a Raspberry Pi; some setups expose
/// the module on `/dev/serial0` instead.
pub const SERIAL_PORT: &str = "/dev/ttyS0";

/// Default baud rate for SIM800L modules.
pub const BAUD_RATE: u32 = 9600;

/// Default response window for ordinary AT commands, in milliseconds.
///
/// The SIM800L answers simple queries well within a second; the window is
/// a fixed wait, not a deadline, so keeping it short keeps the channel
/// responsive for the unsolicited-line reader.
pub const RESPONSE_WINDOW_MS: u64 = 1000;

/// Response window for call-control commands (dial, answer, hang up).
///
/// Call setup takes longer than a plain query before the module emits
/// anything useful, so these commands wait twice as long.
pub const CALL_WINDOW_MS: u64 = 2000;

/// Number of digits in a local phone number.
pub const NUMBER_LEN: usize = 9;

/// Default country code prefixed to a completed 9-digit number.
pub const COUNTRY_CODE: &str = "+995";

/// Maximum call duration in seconds.
///
/// The call-lifetime worker hangs up automatically once this ceiling is
/// reached, whether or not the user said "hang up".
pub const CALL_CEILING_SECS: u64 = 30;

/// Interval at which the call-lifetime worker polls its cancellation flag.
pub const CALL_POLL_MS: u64 = 1000;

/// Default contacts file, relative to the working directory.
pub const CONTACTS_PATH: &str = "saved_numbers.txt";

/// Loopback latency passed to pactl, in milliseconds.
pub const LOOPBACK_LATENCY_MS: u32 = 30;

/// Speech rate passed to espeak, in words per minute.
pub const SPEECH_RATE: u32 = 125;
