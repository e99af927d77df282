//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Stores
//! GET  /                         - Store listing, page 1
//! GET  /stores                   - Store listing, page 1
//! GET  /stores/page/{page}       - Store listing
//! GET  /store/{slug}             - Store detail with reviews
//! GET  /add                      - Add store form (auth)
//! POST /add                      - Create store (auth, multipart)
//! GET  /stores/{id}/edit         - Edit store form (auth, owner)
//! POST /add/{id}                 - Update store (auth, owner, multipart)
//! GET  /hearts                   - Hearted stores (auth)
//! GET  /tags                     - Tag counts, all stores
//! GET  /tags/{tag}               - Tag counts, stores with tag
//! GET  /top                      - Top rated stores
//! GET  /map                      - Map page
//!
//! # Reviews
//! POST /reviews/{store_id}       - Add review (auth)
//!
//! # Auth (POSTs rate limited)
//! GET  /login                    - Login page
//! POST /login                    - Login action
//! GET  /logout                   - Logout action
//! GET  /register                 - Register page
//! POST /register                 - Register action
//!
//! # Account
//! GET  /account                  - Profile page (auth)
//! POST /account                  - Update profile (auth)
//! POST /account/forgot           - Send reset link (rate limited)
//! GET  /account/reset/{token}    - New password form
//! POST /account/reset/{token}    - Set new password (rate limited)
//!
//! # JSON API (rate limited)
//! GET  /api/search?q=            - Full-text store search
//! GET  /api/stores/near?lat=&lng= - Stores near a point
//! POST /api/stores/{id}/heart    - Toggle heart (auth)
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod map;
pub mod reviews;
pub mod stores;
pub mod tags;
pub mod top;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Largest accepted store form, photo included.
pub const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route("/stores", get(stores::index))
        .route("/stores/page/{page}", get(stores::page))
        .route("/stores/{id}/edit", get(stores::edit_page))
        .route("/store/{slug}", get(stores::show))
        .route("/hearts", get(stores::hearts))
        .route("/tags", get(tags::index))
        .route("/tags/{tag}", get(tags::show))
        .route("/top", get(top::index))
        .route("/map", get(map::index))
        .route("/reviews/{store_id}", post(reviews::create))
        .merge(
            Router::new()
                .route("/add", get(stores::add_page).post(stores::create))
                .route("/add/{id}", post(stores::update))
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
}

/// Create the auth and account routes router.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/account/forgot", post(account::forgot))
        .route("/account/reset/{token}", post(account::reset))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/logout", get(auth::logout))
        .route("/register", get(auth::register_page))
        .route("/account", get(account::index).post(account::update))
        .route("/account/reset/{token}", get(account::reset_page))
        .merge(limited)
}

/// Create the JSON API router.
///
/// Paths are kept absolute rather than nested so extractors see `/api/...`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/search", get(api::search))
        .route("/api/stores/near", get(api::near))
        .route("/api/stores/{id}/heart", post(api::heart))
        .layer(api_rate_limiter())
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(store_routes())
        .merge(auth_routes())
        .merge(api_routes())
}
