//! Top-rated stores.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use tastemap_core::ranking::RankedStore;

use crate::db::StoreRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::StoreSummary;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "top.html")]
pub struct TopTemplate {
    pub ctx: PageContext,
    pub stores: Vec<RankedStore<StoreSummary>>,
}

/// Stores ranked by average rating.
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> Result<Response> {
    let stores = StoreRepository::new(state.pool()).top_stores().await?;
    Ok(TopTemplate { ctx, stores }.into_response())
}
