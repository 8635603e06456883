//! Public profile identifiers.
//!
//! A slug is made of lowercase ASCII letters, digits and hyphens and is
//! between [`MIN_SLUG_LENGTH`] and [`MAX_SLUG_LENGTH`] characters long.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

pub const MIN_SLUG_LENGTH: usize = 3;
pub const MAX_SLUG_LENGTH: usize = 50;

/// A syntactically valid slug. Holding one says nothing about whether
/// the server considers it available.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        validate(value)?;
        Ok(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Check `value` against the slug rules without sanitising it first.
pub fn validate(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::SlugEmpty);
    }
    if !value.chars().all(is_slug_char) {
        return Err(ValidationError::SlugInvalidChars);
    }
    let len = value.len();
    if len < MIN_SLUG_LENGTH {
        return Err(ValidationError::SlugTooShort {
            min: MIN_SLUG_LENGTH,
        });
    }
    if len > MAX_SLUG_LENGTH {
        return Err(ValidationError::SlugTooLong {
            max: MAX_SLUG_LENGTH,
        });
    }
    Ok(())
}

/// Normalise raw keyboard input: uppercase letters are folded, anything
/// else that cannot appear in a slug (whitespace included) is dropped.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| is_slug_char(*c))
        .collect()
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Slug {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Slug {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value)?;
        Ok(Self(value))
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abc")]
    #[case("alice-smith")]
    #[case("0-9")]
    #[case("---")]
    fn accepts_valid_slugs(#[case] value: &str) {
        assert!(Slug::parse(value).is_ok());
    }

    #[rstest]
    #[case("", ValidationError::SlugEmpty)]
    #[case("ab", ValidationError::SlugTooShort { min: 3 })]
    #[case("Alice", ValidationError::SlugInvalidChars)]
    #[case("al ice", ValidationError::SlugInvalidChars)]
    #[case("al_ice", ValidationError::SlugInvalidChars)]
    fn rejects_invalid_slugs(
        #[case] value: &str,
        #[case] expected: ValidationError,
    ) {
        assert_eq!(Slug::parse(value), Err(expected));
    }

    #[test]
    fn length_is_bounded() {
        assert!(Slug::parse(&"a".repeat(MAX_SLUG_LENGTH)).is_ok());
        assert_eq!(
            Slug::parse(&"a".repeat(MAX_SLUG_LENGTH + 1)),
            Err(ValidationError::SlugTooLong { max: 50 })
        );
    }

    #[test]
    fn sanitize_strips_and_lowercases() {
        assert_eq!(sanitize(" Alice Smith! "), "alicesmith");
        assert_eq!(sanitize("john_doe-42"), "johndoe-42");
        assert_eq!(sanitize("   "), "");
    }

    #[test]
    fn deserializing_validates() {
        let slug: Slug = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(slug.as_str(), "alice");
        assert!(serde_json::from_str::<Slug>("\"A!\"").is_err());
    }
}
