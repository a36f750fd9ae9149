//! Promo code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PromoCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PromoCodeError {
    /// The input is empty or only whitespace.
    #[error("please enter a promo code")]
    Empty,
    /// The input is too long.
    #[error("promo code must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A customer-entered promo code.
///
/// Surrounding whitespace is trimmed; the code is otherwise passed to the
/// remote validator exactly as typed.
///
/// ## Examples
///
/// ```
/// use bazaar_core::PromoCode;
///
/// assert_eq!(PromoCode::parse("  DIWALI10 ").unwrap().as_str(), "DIWALI10");
/// assert!(PromoCode::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PromoCode(String);

impl PromoCode {
    /// Maximum length of a promo code.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `PromoCode` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than
    /// [`Self::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, PromoCodeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PromoCodeError::Empty);
        }

        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(PromoCodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PromoCode {
    type Err = PromoCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let code = PromoCode::parse("\tWELCOME50\n").unwrap();
        assert_eq!(code.as_str(), "WELCOME50");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(PromoCode::parse(""), Err(PromoCodeError::Empty));
        assert_eq!(PromoCode::parse("   "), Err(PromoCodeError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "A".repeat(PromoCode::MAX_LENGTH + 1);
        assert!(matches!(
            PromoCode::parse(&long),
            Err(PromoCodeError::TooLong { max: 64 })
        ));
    }

    #[test]
    fn test_case_is_preserved() {
        let code: PromoCode = "summer-Sale".parse().unwrap();
        assert_eq!(code.to_string(), "summer-Sale");
    }
}
