//! Call state owned by the dispatch loop, and the flags shared across
//! threads.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::defaults;

/// Why digits are being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectPurpose {
    /// Dial the number once complete.
    Call,
    /// Continue to name entry and persist as a contact.
    Save,
}

/// The dispatch loop's exclusive sub-state. Transitions in
/// [`super::machine::CallStateMachine`] are the only legal mutator.
///
/// Whether a call is actually up lives in [`CallFlags`], because the
/// call-lifetime worker owns that fact across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallState {
    Idle,
    CollectingNumber {
        purpose: CollectPurpose,
        digits: PhoneNumber,
    },
    CollectingName {
        letters: String,
        number: PhoneNumber,
    },
}

impl CallState {
    pub fn is_idle(&self) -> bool {
        matches!(self, CallState::Idle)
    }
}

/// A local phone number being accumulated toward exactly 9 digits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhoneNumber {
    digits: String,
}

impl PhoneNumber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append digit characters, silently capping at 9. Non-digit input
    /// was already dropped by the parser.
    pub fn push_digits(&mut self, digits: &str) {
        for ch in digits.chars() {
            if self.digits.len() >= defaults::NUMBER_LEN {
                break;
            }
            if ch.is_ascii_digit() {
                self.digits.push(ch);
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.digits.len() == defaults::NUMBER_LEN
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// The dialable string: country code plus the 9 local digits.
    pub fn dialable(&self, country_code: &str) -> String {
        format!("{country_code}{}", self.digits)
    }

    /// Digits separated by spaces, for speaking back to the user.
    pub fn spoken(&self) -> String {
        let spaced: Vec<String> = self.digits.chars().map(|c| c.to_string()).collect();
        spaced.join(" ")
    }
}

/// Flags crossing thread boundaries.
///
/// One container, atomics throughout: the dispatch loop, the call-lifetime
/// worker and the incoming-call monitor each touch a disjoint write set,
/// and no flag ever needs to change together with another atomically.
#[derive(Debug, Default)]
pub struct CallFlags {
    in_call: AtomicBool,
    ring: AtomicBool,
    cancel: AtomicBool,
}

impl CallFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_call(&self) -> bool {
        self.in_call.load(Ordering::SeqCst)
    }

    pub fn set_in_call(&self, value: bool) {
        self.in_call.store(value, Ordering::SeqCst);
    }

    pub fn ring(&self) -> bool {
        self.ring.load(Ordering::SeqCst)
    }

    pub fn set_ring(&self, value: bool) {
        self.ring.store(value, Ordering::SeqCst);
    }

    pub fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn set_cancelled(&self, value: bool) {
        self.cancel.store(value, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_number_accumulates_and_caps_at_nine() {
        let mut number = PhoneNumber::new();
        number.push_digits("12345");
        assert!(!number.is_complete());
        number.push_digits("6789012");
        assert!(number.is_complete());
        assert_eq!(number.as_str(), "123456789");
    }

    #[test]
    fn test_phone_number_ignores_non_digits() {
        let mut number = PhoneNumber::new();
        number.push_digits("1a2b3");
        assert_eq!(number.as_str(), "123");
    }

    #[test]
    fn test_dialable_prefixes_country_code() {
        let mut number = PhoneNumber::new();
        number.push_digits("557598200");
        assert_eq!(number.dialable("+995"), "+995557598200");
    }

    #[test]
    fn test_spoken_spaces_digits() {
        let mut number = PhoneNumber::new();
        number.push_digits("525");
        assert_eq!(number.spoken(), "5 2 5");
    }

    #[test]
    fn test_flags_default_clear() {
        let flags = CallFlags::new();
        assert!(!flags.in_call());
        assert!(!flags.ring());
        assert!(!flags.cancelled());
    }

    #[test]
    fn test_flags_round_trip() {
        let flags = CallFlags::new();
        flags.set_in_call(true);
        flags.set_ring(true);
        flags.set_cancelled(true);
        assert!(flags.in_call() && flags.ring() && flags.cancelled());
        flags.set_in_call(false);
        assert!(!flags.in_call());
    }
}
