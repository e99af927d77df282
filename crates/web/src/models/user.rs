//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use tastemap_core::{Email, StoreId, UserId};

/// A registered user.
///
/// The password hash and reset token never leave the repository, so this
/// type is safe to serialize back to the browser.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login email, normalized to lowercase.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Stores this user has hearted, oldest first.
    pub hearts: Vec<StoreId>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Avatar URL for this user.
    #[must_use]
    pub fn gravatar_url(&self) -> String {
        gravatar_url(&self.email)
    }

    /// Whether `store` is among this user's hearts.
    #[must_use]
    pub fn has_hearted(&self, store: StoreId) -> bool {
        self.hearts.contains(&store)
    }
}

/// Gravatar URL (200px) for an email address, using the SHA-256 hash form.
#[must_use]
pub fn gravatar_url(email: &Email) -> String {
    let hash = Sha256::digest(email.as_str().as_bytes());
    format!("https://gravatar.com/avatar/{}?s=200", hex::encode(hash))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_gravatar_url_is_stable_per_mailbox() {
        let a = gravatar_url(&Email::parse("wes@example.com").unwrap());
        let b = gravatar_url(&Email::parse(" WES@example.com ").unwrap());
        assert_eq!(a, b);
        assert!(a.starts_with("https://gravatar.com/avatar/"));
        assert!(a.ends_with("?s=200"));
        // 32 bytes hex encoded
        let hash = a
            .trim_start_matches("https://gravatar.com/avatar/")
            .trim_end_matches("?s=200");
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_has_hearted() {
        let user = User {
            id: UserId::new(1),
            email: Email::parse("wes@example.com").unwrap(),
            name: "Wes".to_string(),
            hearts: vec![StoreId::new(4), StoreId::new(9)],
            created_at: Utc::now(),
        };
        assert!(user.has_hearted(StoreId::new(9)));
        assert!(!user.has_hearted(StoreId::new(5)));
    }
}
