//! Treasure code input handling
//!
//! Codes are entered as text. Every keystroke is sanitised (digits only, at
//! most seven), and submission separately requires exactly seven digits.

use std::fmt;
use std::str::FromStr;

/// Number of digits in a treasure code
pub const CODE_LENGTH: usize = 7;

/// Strip non-digit characters and cap the result at [`CODE_LENGTH`]
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(CODE_LENGTH)
        .collect()
}

/// A validated seven-digit treasure code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreasureCode {
    digits: String,
}

/// The input was not exactly seven ASCII digits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("treasure code must be 7 digits, got {0:?}")]
pub struct InvalidCode(pub String);

impl TreasureCode {
    /// The digits as typed, leading zeros included
    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// Numeric value used for the backend comparison
    pub fn value(&self) -> u32 {
        // Seven ASCII digits always fit
        self.digits
            .bytes()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'))
    }
}

impl FromStr for TreasureCode {
    type Err = InvalidCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == CODE_LENGTH && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self {
                digits: s.to_string(),
            })
        } else {
            Err(InvalidCode(s.to_string()))
        }
    }
}

impl fmt::Display for TreasureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_and_caps() {
        assert_eq!(sanitize("12a3456xyz89"), "1234568");
        assert_eq!(sanitize("12-34"), "1234");
        assert_eq!(sanitize("abc"), "");
        assert_eq!(sanitize("０１２"), "");
        assert_eq!(sanitize(" 7654321 "), "7654321");
    }

    #[test]
    fn test_parse_requires_seven_digits() {
        assert!("1234568".parse::<TreasureCode>().is_ok());
        assert!("123456".parse::<TreasureCode>().is_err());
        assert!("12345678".parse::<TreasureCode>().is_err());
        assert!("12345a7".parse::<TreasureCode>().is_err());
        assert!("".parse::<TreasureCode>().is_err());
    }

    #[test]
    fn test_value_is_numeric() {
        let code: TreasureCode = "1234568".parse().unwrap();
        assert_eq!(code.value(), 1_234_568);

        let code: TreasureCode = "0000042".parse().unwrap();
        assert_eq!(code.value(), 42);
        assert_eq!(code.to_string(), "0000042");
    }
}
