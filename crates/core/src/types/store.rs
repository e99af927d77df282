//! Store display names and tags.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`StoreName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreNameError {
    /// Nothing left after trimming.
    #[error("Please enter a store name!")]
    Empty,
    /// The name is longer than [`StoreName::MAX_LENGTH`].
    #[error("store name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A trimmed, non-empty store name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct StoreName(String);

impl StoreName {
    /// Maximum number of characters in a store name.
    pub const MAX_LENGTH: usize = 200;

    /// Parse a store name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed name is empty or too long.
    pub fn parse(s: &str) -> Result<Self, StoreNameError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(StoreNameError::Empty);
        }
        if s.chars().count() > Self::MAX_LENGTH {
            return Err(StoreNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StoreName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Tags offered on the store form.
pub const TAG_CHOICES: &[&str] = &[
    "Wifi",
    "Open Late",
    "Family Friendly",
    "Vegetarian",
    "Licensed",
];

/// Trim tags, drop blanks and keep the first occurrence of each.
#[must_use]
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_owned());
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let name = StoreName::parse("  Bob's Burgers  ").unwrap();
        assert_eq!(name.as_str(), "Bob's Burgers");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert_eq!(StoreName::parse(""), Err(StoreNameError::Empty));
        assert_eq!(StoreName::parse(" \t "), Err(StoreNameError::Empty));
    }

    #[test]
    fn test_parse_rejects_long() {
        let long = "x".repeat(StoreName::MAX_LENGTH + 1);
        assert!(matches!(
            StoreName::parse(&long),
            Err(StoreNameError::TooLong { .. })
        ));
    }

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(["Wifi", " Open Late ", "", "Wifi", "  "]);
        assert_eq!(tags, vec!["Wifi".to_string(), "Open Late".to_string()]);
    }
}
