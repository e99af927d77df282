//! Map page. Markers are loaded from `/api/stores/near`.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use crate::filters;
use crate::middleware::PageContext;

#[derive(Template, WebTemplate)]
#[template(path = "map.html")]
pub struct MapTemplate {
    pub ctx: PageContext,
}

pub async fn index(ctx: PageContext) -> impl IntoResponse {
    MapTemplate { ctx }
}
