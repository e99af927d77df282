//! Core types for Tastemap.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod location;
pub mod rating;
pub mod slug;
pub mod store;

pub use email::{Email, EmailError};
pub use id::*;
pub use location::{GeoPoint, Location, LocationError};
pub use rating::{Rating, RatingError};
pub use slug::Slug;
pub use store::{StoreName, StoreNameError, TAG_CHOICES, normalize_tags};
