//! HTTP middleware stack for the web server.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store, signed cookie)
//! 5. Rate limiting on auth and API routes (governor)
//!
//! Extractors: [`RequireAuth`], [`OptionalAuth`] and [`PageContext`].

pub mod auth;
pub mod context;
pub mod flash;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use context::PageContext;
pub use flash::{Flash, FlashKind, push_flash, take_flashes};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
