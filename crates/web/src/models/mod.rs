//! Domain models for the web crate.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod review;
pub mod session;
pub mod store;
pub mod user;

pub use review::{Review, ReviewWithAuthor};
pub use session::{CurrentUser, keys as session_keys};
pub use store::{Author, MapStore, Store, StoreDetail, StoreDraft, StoreSummary};
pub use user::{User, gravatar_url};
