//! Tastemap Core - Shared domain library.
//!
//! This crate provides the types and pure algorithms used across all Tastemap
//! components:
//! - `web` - Server-rendered store review site
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, store names, slugs, locations and ratings
//! - [`ranking`] - Tag frequency table and top-store ranking

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod ranking;
pub mod types;

pub use types::*;
