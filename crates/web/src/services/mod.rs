//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login and password resets (argon2)
//! - `email` - Transactional mail (lettre + askama templates)
//! - `slug` - Unique slug assignment for stores
//! - `stores` - Store create/update with slug retry
//! - `uploads` - Store photo storage

pub mod auth;
pub mod email;
pub mod slug;
pub mod stores;
pub mod uploads;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService, MailTemplate};
pub use slug::{SlugLookup, assign_slug, fresh_slug, with_slug_retry};
pub use stores::StoreService;
pub use uploads::{PhotoStore, UploadError};
