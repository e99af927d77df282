//! Tag browser: counts per tag and the stores carrying the selected one.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use tastemap_core::ranking::TagCount;

use super::stores::{StoreCard, cards, current_hearts};
use crate::db::StoreRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::state::AppState;

/// Tag list with the matching stores.
#[derive(Template, WebTemplate)]
#[template(path = "tags.html")]
pub struct TagsTemplate {
    pub ctx: PageContext,
    pub tags: Vec<TagCount>,
    pub selected: Option<String>,
    pub cards: Vec<StoreCard>,
}

impl TagsTemplate {
    /// Whether `tag` is the one being browsed.
    #[must_use]
    pub fn is_selected(&self, tag: &str) -> bool {
        self.selected.as_deref() == Some(tag)
    }
}

/// All tags; every store is listed.
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> Result<Response> {
    render(&state, ctx, None).await
}

/// All tags; only stores with `tag` are listed.
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(tag): Path<String>,
) -> Result<Response> {
    render(&state, ctx, Some(tag)).await
}

async fn render(state: &AppState, ctx: PageContext, selected: Option<String>) -> Result<Response> {
    let repo = StoreRepository::new(state.pool());
    let (tags, stores) = tokio::try_join!(
        repo.tag_counts(),
        repo.list_by_tag(selected.as_deref())
    )?;
    let hearts = current_hearts(state, ctx.user.as_ref().map(|u| u.id)).await?;

    Ok(TagsTemplate {
        ctx,
        tags,
        selected,
        cards: cards(stores, &hearts),
    }
    .into_response())
}
