//! URL slugs derived from store names.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A URL-safe store identifier.
///
/// Slugs only ever contain lowercase ASCII letters, digits and single
/// hyphens between them, so they can be embedded in a regular expression
/// without escaping.
///
/// ```
/// use tastemap_core::Slug;
///
/// let base = Slug::from_name("Bob's Burgers!");
/// assert_eq!(base.as_str(), "bobs-burgers");
/// assert_eq!(base.numbered(0).as_str(), "bobs-burgers");
/// assert_eq!(base.numbered(2).as_str(), "bobs-burgers-3");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Base slug used when a name has no ASCII letters or digits at all.
    pub const FALLBACK: &'static str = "store";

    /// Derive the base slug for a display name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let slug = slugify(name);
        if slug.is_empty() {
            Self(Self::FALLBACK.to_owned())
        } else {
            Self(slug)
        }
    }

    /// Wrap a slug that was previously persisted.
    #[must_use]
    pub const fn from_persisted(slug: String) -> Self {
        Self(slug)
    }

    /// The slug to use when `conflicts` existing stores already share this base.
    ///
    /// Zero conflicts keeps the base; `n` conflicts yields `base-(n+1)`.
    #[must_use]
    pub fn numbered(&self, conflicts: usize) -> Self {
        if conflicts == 0 {
            self.clone()
        } else {
            Self(format!("{}-{}", self.0, conflicts + 1))
        }
    }

    /// Case-insensitive pattern matching this base and any numbered variant.
    ///
    /// Intended for `PostgreSQL`'s `~*` operator or a `(?i)` regex.
    #[must_use]
    pub fn conflict_pattern(&self) -> String {
        format!("^{}(-[0-9]+)?$", self.0)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the slug and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
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

/// Lowercase `input`, drop apostrophes and collapse every other run of
/// non-alphanumeric characters into a single hyphen.
///
/// Leading and trailing hyphens are trimmed; the result may be empty.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch.to_ascii_lowercase());
            pending_dash = false;
        } else if matches!(ch, '\'' | '\u{2019}') {
            // "Bob's" -> "bobs"
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
