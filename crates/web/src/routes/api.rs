//! JSON endpoints used by the search box, the map and the heart buttons.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use tastemap_core::{GeoPoint, StoreId};

use crate::db::{StoreRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{MapStore, Store, User};
use crate::state::AppState;

// =============================================================================
// Query Types
// =============================================================================

/// `?q=` for store search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// `?lat=&lng=` for the map.
#[derive(Debug, Deserialize)]
pub struct NearQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
}

impl NearQuery {
    /// Parse the coordinates.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if either value is missing, not a
    /// number, or out of range.
    pub fn point(&self) -> Result<GeoPoint> {
        let parse = |value: Option<&str>, name: &str| {
            value
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .ok_or_else(|| AppError::BadRequest(format!("{name} must be a number")))
        };
        let lat = parse(self.lat.as_deref(), "lat")?;
        let lng = parse(self.lng.as_deref(), "lng")?;
        GeoPoint::new(lng, lat).map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Full-text search over store names and descriptions.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Store>>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let stores = StoreRepository::new(state.pool()).search(q).await?;
    Ok(Json(stores))
}

/// Stores near a point, closest first.
pub async fn near(
    State(state): State<AppState>,
    Query(query): Query<NearQuery>,
) -> Result<Json<Vec<MapStore>>> {
    let point = query.point()?;
    let stores = StoreRepository::new(state.pool()).near(point).await?;
    Ok(Json(stores))
}

/// Toggle the current user's heart on a store.
pub async fn heart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .toggle_heart(user.id, StoreId::new(id))
        .await?;
    Ok(Json(user))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn near(lat: Option<&str>, lng: Option<&str>) -> NearQuery {
        NearQuery {
            lat: lat.map(String::from),
            lng: lng.map(String::from),
        }
    }

    #[test]
    fn test_near_query_parses_point() {
        let point = near(Some("43.65"), Some(" -79.38")).point().unwrap();
        assert!((point.latitude() - 43.65).abs() < f64::EPSILON);
        assert!((point.longitude() + 79.38).abs() < f64::EPSILON);
    }

    #[test]
    fn test_near_query_rejects_bad_input() {
        assert!(matches!(
            near(Some("north"), Some("1")).point(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(near(None, Some("1")).point(), Err(AppError::BadRequest(_))));
        assert!(matches!(
            near(Some("NaN"), Some("1")).point(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            near(Some("95"), Some("1")).point(),
            Err(AppError::BadRequest(_))
        ));
    }
}
