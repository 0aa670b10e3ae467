//! Captcha inline keyboard
//!
//! A 3×3 digit pad with a final `[refresh, 0, backspace]` row. Every button
//! carries `captcha-keyboard:<token>` as callback data; the tokens are
//! stable wire identifiers and must never change.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

pub const KEYBOARD_NAMESPACE: &str = "captcha-keyboard";

const DIGIT_TOKENS: [(&str, char, &str); 10] = [
    ("captcha-zero", '0', "0\u{fe0f}\u{20e3}"),
    ("captcha-one", '1', "1\u{fe0f}\u{20e3}"),
    ("captcha-two", '2', "2\u{fe0f}\u{20e3}"),
    ("captcha-three", '3', "3\u{fe0f}\u{20e3}"),
    ("captcha-four", '4', "4\u{fe0f}\u{20e3}"),
    ("captcha-five", '5', "5\u{fe0f}\u{20e3}"),
    ("captcha-six", '6', "6\u{fe0f}\u{20e3}"),
    ("captcha-seven", '7', "7\u{fe0f}\u{20e3}"),
    ("captcha-eight", '8', "8\u{fe0f}\u{20e3}"),
    ("captcha-nine", '9', "9\u{fe0f}\u{20e3}"),
];

const TOKEN_REFRESH: &str = "captcha-refresh";
const TOKEN_BACKSPACE: &str = "captcha-backspace";

/// Decoded keypad button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypadAction {
    Digit(char),
    Backspace,
    Refresh,
}

/// Wire callback data for one token.
fn callback_data(token: &str) -> String {
    format!("{KEYBOARD_NAMESPACE}:{token}")
}

/// Decode callback data; `None` when the data belongs to another keyboard.
pub fn parse_callback_data(data: &str) -> Option<KeypadAction> {
    let token = data.strip_prefix(KEYBOARD_NAMESPACE)?.strip_prefix(':')?;

    match token {
        TOKEN_REFRESH => Some(KeypadAction::Refresh),
        TOKEN_BACKSPACE => Some(KeypadAction::Backspace),
        _ => DIGIT_TOKENS
            .iter()
            .find(|(t, _, _)| *t == token)
            .map(|(_, digit, _)| KeypadAction::Digit(*digit)),
    }
}

/// Build the captcha keypad.
pub fn captcha_keyboard() -> InlineKeyboardMarkup {
    let digit = |index: usize| {
        let (token, _, label) = DIGIT_TOKENS[index];
        InlineKeyboardButton::callback(label, callback_data(token))
    };

    InlineKeyboardMarkup::new([
        vec![digit(1), digit(2), digit(3)],
        vec![digit(4), digit(5), digit(6)],
        vec![digit(7), digit(8), digit(9)],
        vec![
            InlineKeyboardButton::callback("\u{1f504}", callback_data(TOKEN_REFRESH)),
            digit(0),
            InlineKeyboardButton::callback("\u{21a9}\u{fe0f}", callback_data(TOKEN_BACKSPACE)),
        ],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn button_data(button: &InlineKeyboardButton) -> &str {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => data,
            other => panic!("unexpected button kind: {other:?}"),
        }
    }

    #[test]
    fn test_layout_is_three_by_three_plus_controls() {
        let keyboard = captcha_keyboard();
        let rows = &keyboard.inline_keyboard;

        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|row| row.len() == 3));

        assert_eq!(button_data(&rows[0][0]), "captcha-keyboard:captcha-one");
        assert_eq!(button_data(&rows[2][2]), "captcha-keyboard:captcha-nine");
        assert_eq!(button_data(&rows[3][0]), "captcha-keyboard:captcha-refresh");
        assert_eq!(button_data(&rows[3][1]), "captcha-keyboard:captcha-zero");
        assert_eq!(button_data(&rows[3][2]), "captcha-keyboard:captcha-backspace");
    }

    #[test]
    fn test_every_button_parses_back() {
        let keyboard = captcha_keyboard();
        for row in &keyboard.inline_keyboard {
            for button in row {
                assert!(parse_callback_data(button_data(button)).is_some());
            }
        }
    }

    #[test]
    fn test_parse_digit_tokens() {
        assert_eq!(
            parse_callback_data("captcha-keyboard:captcha-zero"),
            Some(KeypadAction::Digit('0'))
        );
        assert_eq!(
            parse_callback_data("captcha-keyboard:captcha-nine"),
            Some(KeypadAction::Digit('9'))
        );
        assert_eq!(
            parse_callback_data("captcha-keyboard:captcha-refresh"),
            Some(KeypadAction::Refresh)
        );
        assert_eq!(
            parse_callback_data("captcha-keyboard:captcha-backspace"),
            Some(KeypadAction::Backspace)
        );
    }

    #[test]
    fn test_foreign_namespace_is_ignored() {
        assert_eq!(parse_callback_data("other-keyboard:captcha-one"), None);
        assert_eq!(parse_callback_data("captcha-one"), None);
        assert_eq!(parse_callback_data("captcha-keyboard:unknown"), None);
    }
}
