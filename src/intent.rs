//! Utterance parsing: raw recognized text → typed intent.
//!
//! Pure functions only; the state machine decides what each intent means
//! in the current call state.

/// What a spoken utterance means to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// "call" — begin collecting digits to dial.
    StartCall,
    /// "save number" — begin collecting digits for a new contact.
    StartSave,
    /// Digits extracted from the utterance, already mapped to characters.
    Digits(String),
    /// A single spelled letter, upper-cased.
    Letter(char),
    /// "done" or "save" while spelling a contact name.
    FinishName,
    /// "yes" — answer a pending incoming call.
    Affirm,
    /// "hang up" — end the active call.
    HangUp,
    /// Nothing recognized; ambient speech is ignored silently.
    None,
}

/// Snapshot of the state machine facts the parser needs.
///
/// Kept separate from `CallState` so `parse` stays a pure function over
/// two booleans rather than borrowing the machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseContext {
    /// Currently spelling a contact name letter by letter.
    pub name_entry: bool,
    /// Anywhere in the save-a-contact flow (number or name step).
    pub save_flow: bool,
}

/// Spoken digit vocabulary. Closed set; anything else is not a digit word.
const DIGIT_WORDS: [(&str, char); 10] = [
    ("zero", '0'),
    ("one", '1'),
    ("two", '2'),
    ("three", '3'),
    ("four", '4'),
    ("five", '5'),
    ("six", '6'),
    ("seven", '7'),
    ("eight", '8'),
    ("nine", '9'),
];

/// Parse one lower-cased utterance against the current state snapshot.
///
/// Trigger phrases win over digit/letter extraction. Within name entry,
/// "done"/"save" is checked before letter extraction so the trigger word
/// is never captured as spelling input.
pub fn parse(utterance: &str, ctx: ParseContext) -> Intent {
    let text = utterance.trim();
    if text.is_empty() {
        return Intent::None;
    }

    if ctx.name_entry {
        if text.contains("done") || text.contains("save") {
            return Intent::FinishName;
        }
        if let Some(ch) = single_letter(text) {
            return Intent::Letter(ch);
        }
        return Intent::None;
    }

    // "call" is suppressed during the save flow so digit words like
    // "call" fragments in noisy recognition can't restart dialing mid-save.
    if text.contains("call") && !ctx.save_flow {
        return Intent::StartCall;
    }
    if text.contains("save number") {
        return Intent::StartSave;
    }
    if text.contains("hang up") {
        return Intent::HangUp;
    }
    if text.contains("yes") {
        return Intent::Affirm;
    }

    let digits = extract_digits(text);
    if !digits.is_empty() {
        return Intent::Digits(digits);
    }

    Intent::None
}

/// Convert spoken digit words and literal digit runs to characters.
///
/// Tokens are stripped of punctuation; anything that is neither a digit
/// word nor all-numeric contributes nothing.
pub fn extract_digits(text: &str) -> String {
    let mut result = String::new();
    for token in text.split_whitespace() {
        let clean: String = token.chars().filter(|c| c.is_alphanumeric()).collect();
        if clean.is_empty() {
            continue;
        }
        if let Some(&(_, digit)) = DIGIT_WORDS.iter().find(|(word, _)| *word == clean) {
            result.push(digit);
        } else if clean.chars().all(|c| c.is_ascii_digit()) {
            result.push_str(&clean);
        }
    }
    result
}

/// Returns the upper-cased letter when the utterance is exactly one
/// single-character alphabetic token. Multi-letter words are not spelling.
fn single_letter(text: &str) -> Option<char> {
    let mut tokens = text.split_whitespace();
    let token = tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }
    let clean: String = token.chars().filter(|c| c.is_alphanumeric()).collect();
    let mut chars = clean.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if ch.is_alphabetic() => Some(ch.to_ascii_uppercase()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle() -> ParseContext {
        ParseContext::default()
    }

    fn name_entry() -> ParseContext {
        ParseContext {
            name_entry: true,
            save_flow: true,
        }
    }

    fn save_number() -> ParseContext {
        ParseContext {
            name_entry: false,
            save_flow: true,
        }
    }

    #[test]
    fn test_call_trigger() {
        assert_eq!(parse("call", idle()), Intent::StartCall);
        assert_eq!(parse("please call now", idle()), Intent::StartCall);
    }

    #[test]
    fn test_call_suppressed_during_save_flow() {
        // "call" mid-save must not restart dialing
        assert_eq!(parse("call", save_number()), Intent::None);
    }

    #[test]
    fn test_save_number_trigger() {
        assert_eq!(parse("save number", idle()), Intent::StartSave);
        assert_eq!(parse("save number please", idle()), Intent::StartSave);
    }

    #[test]
    fn test_hang_up_trigger() {
        assert_eq!(parse("hang up", idle()), Intent::HangUp);
    }

    #[test]
    fn test_affirm_trigger() {
        assert_eq!(parse("yes", idle()), Intent::Affirm);
    }

    #[test]
    fn test_digit_words() {
        assert_eq!(
            parse("five two five", idle()),
            Intent::Digits("525".to_string())
        );
    }

    #[test]
    fn test_literal_digits() {
        assert_eq!(parse("52 300", idle()), Intent::Digits("52300".to_string()));
    }

    #[test]
    fn test_mixed_digit_words_and_noise() {
        // non-digit tokens are dropped, never fatal
        assert_eq!(
            parse("banana five two", idle()),
            Intent::Digits("52".to_string())
        );
    }

    #[test]
    fn test_punctuation_stripped_from_tokens() {
        assert_eq!(parse("five, two.", idle()), Intent::Digits("52".to_string()));
    }

    #[test]
    fn test_no_digits_is_none() {
        assert_eq!(parse("banana", idle()), Intent::None);
        assert_eq!(parse("", idle()), Intent::None);
        assert_eq!(parse("   ", idle()), Intent::None);
    }

    #[test]
    fn test_letter_in_name_entry() {
        assert_eq!(parse("j", name_entry()), Intent::Letter('J'));
        assert_eq!(parse("o", name_entry()), Intent::Letter('O'));
    }

    #[test]
    fn test_multi_letter_word_is_not_spelling() {
        // "cat" contributes nothing even though it is alphabetic
        assert_eq!(parse("cat", name_entry()), Intent::None);
    }

    #[test]
    fn test_done_finishes_name_before_letter_extraction() {
        assert_eq!(parse("done", name_entry()), Intent::FinishName);
        assert_eq!(parse("save", name_entry()), Intent::FinishName);
    }

    #[test]
    fn test_digit_token_is_not_a_letter() {
        assert_eq!(parse("5", name_entry()), Intent::None);
    }

    #[test]
    fn test_extract_digits_full_vocabulary() {
        assert_eq!(
            extract_digits("zero one two three four five six seven eight nine"),
            "0123456789"
        );
    }

    #[test]
    fn test_trigger_wins_over_digits() {
        // "call one two" starts a call; the digits come in later utterances
        assert_eq!(parse("call one two", idle()), Intent::StartCall);
    }
}
