//! Review submission.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use tastemap_core::{Rating, StoreId};

use crate::db::{ReviewRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::middleware::{Flash, RequireAuth, push_flash};
use crate::state::AppState;

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub text: String,
    pub rating: Option<String>,
}

impl ReviewForm {
    /// The chosen star rating.
    ///
    /// # Errors
    ///
    /// Returns the message to show if no rating between 1 and 5 was picked.
    pub fn rating(&self) -> std::result::Result<Rating, String> {
        self.rating
            .as_deref()
            .and_then(|r| r.trim().parse::<i64>().ok())
            .ok_or_else(|| "Please choose a rating!".to_owned())
            .and_then(|r| Rating::new(r).map_err(|e| e.to_string()))
    }
}

/// Save a review and go back to the store page.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(store_id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let store_id = StoreId::new(store_id);
    let store = StoreRepository::new(state.pool())
        .get_by_id(store_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {store_id}")))?;

    let rating = match form.rating() {
        Ok(rating) => rating,
        Err(message) => {
            push_flash(&session, Flash::error(message)).await?;
            return Ok(Redirect::to(&format!("/store/{}", store.slug)).into_response());
        }
    };

    ReviewRepository::new(state.pool())
        .create(store.id, user.id, form.text.trim(), rating)
        .await?;

    push_flash(&session, Flash::success("Review saved!")).await?;
    Ok(Redirect::to(&format!("/store/{}", store.slug)).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(rating: Option<&str>) -> ReviewForm {
        ReviewForm {
            text: "Great fries".to_string(),
            rating: rating.map(String::from),
        }
    }

    #[test]
    fn test_rating_parses() {
        assert_eq!(form(Some("4")).rating().unwrap().get(), 4);
    }

    #[test]
    fn test_rating_required_and_in_range() {
        assert!(form(None).rating().is_err());
        assert!(form(Some("five")).rating().is_err());
        assert!(form(Some("6")).rating().is_err());
        assert!(form(Some("0")).rating().is_err());
    }
}
