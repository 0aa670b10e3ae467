//! Captcha challenge model
//!
//! A challenge is a PNG of random decimal digits plus the partial input the
//! user has tapped so far. The row in the `captchas` table is the single
//! source of truth for the challenge state: every keypad tap is persisted
//! before the visible message is edited.

use std::time::Duration;

use captcha::filters::{Dots, Noise, Wave};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::CaptchaConfig;
use crate::utils::errors::{ChatWardenError, Result};
use crate::utils::hash::{ContentHash, FieldDigest};

const DIGIT_CHARSET: &[char] = &['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

const DIGIT_EMOJIS: &[(char, &str)] = &[
    ('0', "0\u{fe0f}\u{20e3}"),
    ('1', "1\u{fe0f}\u{20e3}"),
    ('2', "2\u{fe0f}\u{20e3}"),
    ('3', "3\u{fe0f}\u{20e3}"),
    ('4', "4\u{fe0f}\u{20e3}"),
    ('5', "5\u{fe0f}\u{20e3}"),
    ('6', "6\u{fe0f}\u{20e3}"),
    ('7', "7\u{fe0f}\u{20e3}"),
    ('8', "8\u{fe0f}\u{20e3}"),
    ('9', "9\u{fe0f}\u{20e3}"),
];

/// Result of applying one keypad tap to a pending challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Input changed; the caption must be re-rendered.
    Edited,
    /// Nothing changed (backspace on empty input, non-digit token).
    Ignored,
    /// Input matched the digits; the user is verified.
    Solved,
    /// Input reached full length without matching; input was cleared.
    Failed,
}

/// A captcha challenge with its rendered geometry and expiry window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Captcha {
    pub id: i64,
    /// The user being challenged.
    pub user_id: i64,
    /// The chat the prompt was posted in.
    pub chat_id: i64,
    /// Message id of the rendered prompt.
    pub message_id: i64,
    /// Target code; kept as a string so leading zeroes survive.
    pub digits: String,
    /// Partial user entry, always a decimal prefix of at most `length`.
    pub input: String,
    pub length: usize,
    pub width: u32,
    pub height: u32,
    /// Sliding expiry window, refreshed by every accepted tap.
    pub expiration: Duration,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Captcha {
    pub const TABLE: &'static str = "captchas";

    /// Generate a fresh challenge and its PNG rendering.
    pub fn generate(config: &CaptchaConfig) -> Result<(Self, Vec<u8>)> {
        let (digits, png) = render_digits(config)?;
        let now = Utc::now();
        let expiration = config.expiration();

        let captcha = Self {
            id: rand::thread_rng().gen_range(1..i64::MAX),
            user_id: 0,
            chat_id: 0,
            message_id: 0,
            digits,
            input: String::new(),
            length: config.length,
            width: config.width,
            height: config.height,
            expiration,
            expires_at: now + expiration,
            updated_at: now,
        };

        Ok((captcha, png))
    }

    /// Replace the code and image while keeping identity and placement.
    /// Clears the input and restarts the expiry window.
    pub fn refresh(&mut self, config: &CaptchaConfig) -> Result<Vec<u8>> {
        let (digits, png) = render_digits(config)?;

        self.digits = digits;
        self.input.clear();
        self.length = config.length;
        self.width = config.width;
        self.height = config.height;
        self.expiration = config.expiration();
        self.touch();

        Ok(png)
    }

    /// Restart the expiry window after an accepted interaction.
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = now;
        self.expires_at = now
            + chrono::Duration::from_std(self.expiration).unwrap_or_else(|_| chrono::Duration::seconds(0));
    }

    pub fn expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Whether the accumulated input matches the code. Byte equality over
    /// the decimal characters; expired challenges never validate.
    pub fn solved(&self) -> bool {
        self.input == self.digits && !self.expired()
    }

    /// Apply a digit tap.
    pub fn tap_digit(&mut self, digit: char) -> TapOutcome {
        if !digit.is_ascii_digit() {
            return TapOutcome::Ignored;
        }

        if self.input.len() < self.length {
            self.input.push(digit);
        }

        if self.solved() {
            return TapOutcome::Solved;
        }

        if self.input.len() >= self.digits.len() {
            self.input.clear();
            return TapOutcome::Failed;
        }

        TapOutcome::Edited
    }

    /// Apply a backspace tap.
    pub fn tap_backspace(&mut self) -> TapOutcome {
        match self.input.pop() {
            Some(_) => TapOutcome::Edited,
            None => TapOutcome::Ignored,
        }
    }

    /// Caption for the prompt message, embedding the current input as
    /// spaced digit emoji.
    pub fn caption(&self, username: &str) -> String {
        let mut caption = if username.is_empty() {
            "Please solve the captcha.".to_string()
        } else {
            format!("@{username}, please solve the captcha.")
        };

        if self.input.is_empty() {
            caption.push_str("\n\nTap the buttons below to enter the code from the image.");
        } else {
            let entered: Vec<&str> = self
                .input
                .chars()
                .filter_map(|c| DIGIT_EMOJIS.iter().find(|(d, _)| *d == c).map(|(_, e)| *e))
                .collect();
            caption.push_str("\n\n");
            caption.push_str(&entered.join(" "));
        }

        caption
    }
}

impl ContentHash for Captcha {
    fn digest_fields(&self, digest: &mut FieldDigest) {
        digest.push_i64("id", self.id);
        digest.push_i64("user_id", self.user_id);
        digest.push_i64("chat_id", self.chat_id);
        digest.push_i64("message_id", self.message_id);
        digest.push_str("digits", &self.digits);
        digest.push_str("input", &self.input);
        digest.push_i64("length", self.length as i64);
        digest.push_u32("width", self.width);
        digest.push_u32("height", self.height);
        digest.push_i64("expiration", self.expiration.as_secs() as i64);
        digest.push_i64("expires_at", self.expires_at.timestamp());
    }
}

fn render_digits(config: &CaptchaConfig) -> Result<(String, Vec<u8>)> {
    let mut image = captcha::Captcha::new();
    image
        .set_chars(DIGIT_CHARSET)
        .add_chars(config.length as u32)
        .apply_filter(Noise::new(0.2))
        .apply_filter(Wave::new(2.0, 8.0))
        .apply_filter(Dots::new(8))
        .view(config.width, config.height);

    let digits = image.chars_as_string();
    let png = image
        .as_png()
        .ok_or_else(|| ChatWardenError::CaptchaRender("PNG encoding failed".to_string()))?;

    Ok((digits, png))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_captcha(digits: &str) -> Captcha {
        let now = Utc::now();
        Captcha {
            id: 1,
            user_id: 222,
            chat_id: -1001,
            message_id: 10,
            digits: digits.to_string(),
            input: String::new(),
            length: digits.len(),
            width: 480,
            height: 180,
            expiration: Duration::from_secs(600),
            expires_at: now + chrono::Duration::seconds(600),
            updated_at: now,
        }
    }

    #[test]
    fn test_generate_matches_config() {
        let config = CaptchaConfig::default();
        let (captcha, png) = Captcha::generate(&config).unwrap();

        assert_eq!(captcha.digits.len(), config.length);
        assert!(captcha.digits.chars().all(|c| c.is_ascii_digit()));
        assert!(captcha.input.is_empty());
        assert!(!captcha.expired());
        assert!(!png.is_empty());
    }

    #[test]
    fn test_correct_sequence_solves() {
        let mut captcha = pending_captcha("123456");
        for digit in ['1', '2', '3', '4', '5'] {
            assert_eq!(captcha.tap_digit(digit), TapOutcome::Edited);
        }
        assert_eq!(captcha.tap_digit('6'), TapOutcome::Solved);
        assert_eq!(captcha.input, "123456");
    }

    #[test]
    fn test_wrong_sequence_fails_and_clears() {
        let mut captcha = pending_captcha("654321");
        for digit in ['1', '2', '3', '4', '5'] {
            assert_eq!(captcha.tap_digit(digit), TapOutcome::Edited);
        }
        assert_eq!(captcha.tap_digit('6'), TapOutcome::Failed);
        assert!(captcha.input.is_empty());
    }

    #[test]
    fn test_leading_zeroes_are_significant() {
        let mut captcha = pending_captcha("012");
        assert_eq!(captcha.tap_digit('0'), TapOutcome::Edited);
        assert_eq!(captcha.tap_digit('1'), TapOutcome::Edited);
        assert_eq!(captcha.tap_digit('2'), TapOutcome::Solved);
    }

    #[test]
    fn test_backspace_drops_last_digit() {
        let mut captcha = pending_captcha("123456");
        captcha.tap_digit('1');
        captcha.tap_digit('9');
        assert_eq!(captcha.tap_backspace(), TapOutcome::Edited);
        assert_eq!(captcha.input, "1");
    }

    #[test]
    fn test_backspace_on_empty_is_ignored() {
        let mut captcha = pending_captcha("123456");
        assert_eq!(captcha.tap_backspace(), TapOutcome::Ignored);
    }

    #[test]
    fn test_input_never_exceeds_length() {
        let mut captcha = pending_captcha("654321");
        for digit in "1234567890".chars() {
            captcha.tap_digit(digit);
            assert!(captcha.input.len() <= captcha.length);
            assert!(captcha.input.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_expired_challenge_never_solves() {
        let mut captcha = pending_captcha("11");
        captcha.expires_at = Utc::now() - chrono::Duration::seconds(1);
        captcha.tap_digit('1');
        assert_ne!(captcha.tap_digit('1'), TapOutcome::Solved);
    }

    #[test]
    fn test_touch_extends_expiry() {
        let mut captcha = pending_captcha("123456");
        captcha.expires_at = Utc::now() + chrono::Duration::seconds(1);
        captcha.touch();
        assert!(captcha.expires_at > Utc::now() + chrono::Duration::seconds(500));
    }

    #[test]
    fn test_refresh_clears_input_and_regenerates() {
        let config = CaptchaConfig::default();
        let mut captcha = pending_captcha("123456");
        captcha.tap_digit('1');

        let png = captcha.refresh(&config).unwrap();
        assert!(!png.is_empty());
        assert!(captcha.input.is_empty());
        assert_eq!(captcha.digits.len(), config.length);
    }

    #[test]
    fn test_caption_mentions_username() {
        let captcha = pending_captcha("123456");
        let caption = captcha.caption("johndoe");
        assert!(caption.starts_with("@johndoe"));
        assert!(caption.contains("Tap the buttons"));
    }

    #[test]
    fn test_caption_embeds_input_as_emoji() {
        let mut captcha = pending_captcha("123456");
        captcha.tap_digit('1');
        captcha.tap_digit('2');
        let caption = captcha.caption("");
        assert!(caption.contains("1\u{fe0f}\u{20e3} 2\u{fe0f}\u{20e3}"));
    }
}
