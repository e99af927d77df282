//! Tastemap web library.
//!
//! The server-rendered store review site, exposed as a library so the CLI
//! and integration tests can reuse its repositories and services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
