//! Store route handlers: listing, detail, add/edit and hearted stores.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use tastemap_core::{GeoPoint, Location, StoreId, StoreName, TAG_CHOICES, UserId, normalize_tags};

use crate::db::{StoreRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{Flash, PageContext, RequireAuth, push_flash};
use crate::models::{Store, StoreDetail, StoreDraft};
use crate::services::{StoreService, UploadError};
use crate::state::AppState;

/// Stores shown per listing page.
pub const STORES_PER_PAGE: i64 = 4;

/// Words of description shown on a store card.
const EXCERPT_WORDS: usize = 25;

/// Message shown when someone other than the author tries to edit.
pub const NOT_OWNER_MESSAGE: &str = "You must own a store in order to edit it.";

// =============================================================================
// View Types
// =============================================================================

/// A store as shown in a grid of cards.
#[derive(Debug, Clone)]
pub struct StoreCard {
    pub store: Store,
    pub hearted: bool,
}

impl StoreCard {
    /// Leading words of the description.
    #[must_use]
    pub fn excerpt(&self) -> String {
        self.store.excerpt(EXCERPT_WORDS)
    }
}

/// Build cards, marking the ones in `hearts`.
#[must_use]
pub fn cards(stores: Vec<Store>, hearts: &[StoreId]) -> Vec<StoreCard> {
    stores
        .into_iter()
        .map(|store| {
            let hearted = hearts.contains(&store.id);
            StoreCard { store, hearted }
        })
        .collect()
}

/// Hearts of the logged-in user, or none for visitors.
pub(crate) async fn current_hearts(state: &AppState, user: Option<UserId>) -> Result<Vec<StoreId>> {
    let Some(id) = user else {
        return Ok(Vec::new());
    };
    Ok(UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(|u| u.hearts)
        .unwrap_or_default())
}

/// Page numbers for the store listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub pages: i64,
    pub count: i64,
}

impl Pagination {
    /// Pagination for `page` (1-based, clamped) over `count` stores.
    #[must_use]
    pub fn new(page: i64, count: i64) -> Self {
        let pages = (count + STORES_PER_PAGE - 1) / STORES_PER_PAGE;
        Self {
            page: page.max(1),
            pages,
            count,
        }
    }

    /// Rows to skip before this page.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(STORES_PER_PAGE)
    }

    /// Page to send the visitor to when this page came back with no rows.
    ///
    /// `None` means render as is: either rows were found or this is the
    /// first page of an empty listing.
    #[must_use]
    pub const fn fallback_page(&self, rows_on_page: usize) -> Option<i64> {
        if rows_on_page == 0 && self.offset() > 0 {
            Some(if self.pages > 1 { self.pages } else { 1 })
        } else {
            None
        }
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.pages
    }

    #[must_use]
    pub const fn prev(&self) -> i64 {
        self.page - 1
    }

    #[must_use]
    pub const fn next(&self) -> i64 {
        self.page + 1
    }
}

/// One checkbox in the tag picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagOption {
    pub name: String,
    pub checked: bool,
}

/// Tag picker: the fixed choices plus any free-form tags already on the store.
fn tag_options(selected: &[String]) -> Vec<TagOption> {
    let mut options: Vec<TagOption> = TAG_CHOICES
        .iter()
        .map(|&name| TagOption {
            name: name.to_owned(),
            checked: selected.iter().any(|t| t == name),
        })
        .collect();

    for tag in selected {
        if !TAG_CHOICES.contains(&tag.as_str()) {
            options.push(TagOption {
                name: tag.clone(),
                checked: true,
            });
        }
    }
    options
}

// =============================================================================
// Form Types
// =============================================================================

/// Raw add/edit form fields as submitted.
#[derive(Debug, Clone, Default)]
pub struct StoreForm {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub address: String,
    pub lng: String,
    pub lat: String,
}

impl StoreForm {
    /// Prefill from a saved store.
    #[must_use]
    pub fn from_store(store: &Store) -> Self {
        let [lng, lat] = store.location.coordinates;
        Self {
            name: store.name.to_string(),
            description: store.description.clone(),
            tags: store.tags.clone(),
            address: store.location.address.clone(),
            lng: lng.to_string(),
            lat: lat.to_string(),
        }
    }

    /// Validate into a draft, collecting every problem.
    ///
    /// # Errors
    ///
    /// Returns all validation messages if any field is invalid.
    pub fn validate(&self) -> std::result::Result<StoreDraft, Vec<String>> {
        let mut errors = Vec::new();

        let name = StoreName::parse(&self.name)
            .map_err(|e| errors.push(e.to_string()))
            .ok();

        let point = match (self.lng.trim().parse::<f64>(), self.lat.trim().parse::<f64>()) {
            (Ok(lng), Ok(lat)) => GeoPoint::new(lng, lat)
                .map_err(|e| errors.push(e.to_string()))
                .ok(),
            _ => {
                errors.push("You must supply coordinates!".to_owned());
                None
            }
        };

        let location = point.and_then(|p| {
            Location::new(p, &self.address)
                .map_err(|e| errors.push(e.to_string()))
                .ok()
        });
        if point.is_none() && self.address.trim().is_empty() {
            errors.push("You must supply an address!".to_owned());
        }

        match (name, location) {
            (Some(name), Some(location)) if errors.is_empty() => Ok(StoreDraft {
                name,
                description: self.description.trim().to_owned(),
                tags: normalize_tags(&self.tags),
                location,
            }),
            _ => Err(errors),
        }
    }
}

/// An uploaded photo waiting to be stored.
#[derive(Debug)]
pub struct PhotoUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Read the multipart add/edit form.
async fn read_store_form(mut multipart: Multipart) -> Result<(StoreForm, Option<PhotoUpload>)> {
    let mut form = StoreForm::default();
    let mut photo = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(field_name) = field.name().map(str::to_owned) else {
            continue;
        };

        if field_name == "photo" {
            let content_type = field.content_type().unwrap_or_default().to_owned();
            let has_file = field.file_name().is_some_and(|f| !f.is_empty());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            if has_file && !bytes.is_empty() {
                photo = Some(PhotoUpload {
                    bytes: bytes.to_vec(),
                    content_type,
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        match field_name.as_str() {
            "name" => form.name = value,
            "description" => form.description = value,
            "tags" => form.tags.push(value),
            "address" => form.address = value,
            "lng" => form.lng = value,
            "lat" => form.lat = value,
            _ => {}
        }
    }

    Ok((form, photo))
}

// =============================================================================
// Templates
// =============================================================================

/// Grid of store cards (listing, hearts).
#[derive(Template, WebTemplate)]
#[template(path = "stores.html")]
pub struct StoresTemplate {
    pub ctx: PageContext,
    pub title: String,
    pub cards: Vec<StoreCard>,
    pub pagination: Option<Pagination>,
}

/// Add/edit store form.
#[derive(Template, WebTemplate)]
#[template(path = "edit_store.html")]
pub struct EditStoreTemplate {
    pub ctx: PageContext,
    pub title: String,
    pub action: String,
    pub form: StoreForm,
    pub tag_options: Vec<TagOption>,
    pub photo_url: Option<String>,
    pub errors: Vec<String>,
}

impl EditStoreTemplate {
    fn new(ctx: PageContext, existing: Option<&Store>, form: StoreForm, errors: Vec<String>) -> Self {
        let tag_options = tag_options(&form.tags);
        match existing {
            Some(store) => Self {
                ctx,
                title: format!("Edit {}", store.name),
                action: format!("/add/{}", store.id),
                form,
                tag_options,
                photo_url: Some(store.photo_url()),
                errors,
            },
            None => Self {
                ctx,
                title: "Add Store".to_owned(),
                action: "/add".to_owned(),
                form,
                tag_options,
                photo_url: None,
                errors,
            },
        }
    }
}

/// Single store page.
#[derive(Template, WebTemplate)]
#[template(path = "store.html")]
pub struct StoreTemplate {
    pub ctx: PageContext,
    pub detail: StoreDetail,
    pub can_edit: bool,
    pub hearted: bool,
}

// =============================================================================
// Listing Routes
// =============================================================================

/// First page of stores.
pub async fn index(State(state): State<AppState>, session: Session) -> Result<Response> {
    list_page(&state, &session, 1).await
}

/// A specific page of stores.
pub async fn page(
    State(state): State<AppState>,
    session: Session,
    Path(page): Path<i64>,
) -> Result<Response> {
    list_page(&state, &session, page).await
}

async fn list_page(state: &AppState, session: &Session, page: i64) -> Result<Response> {
    let repo = StoreRepository::new(state.pool());
    let count = repo.count().await?;
    let pagination = Pagination::new(page, count);
    let stores = repo.list_page(pagination.offset(), STORES_PER_PAGE).await?;

    if let Some(last) = pagination.fallback_page(stores.len()) {
        push_flash(
            session,
            Flash::info(format!(
                "Hey you asked for page {}. But that doesn't exist. So I put you on page {last}.",
                pagination.page
            )),
        )
        .await?;
        return Ok(Redirect::to(&format!("/stores/page/{last}")).into_response());
    }

    let ctx = PageContext::load(session).await;
    let hearts = current_hearts(state, ctx.user.as_ref().map(|u| u.id)).await?;
    Ok(StoresTemplate {
        ctx,
        title: "Stores".to_owned(),
        cards: cards(stores, &hearts),
        pagination: Some(pagination),
    }
    .into_response())
}

/// Stores the current user has hearted.
pub async fn hearts(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<Response> {
    let stores = StoreRepository::new(state.pool()).hearted_by(user.id).await?;
    let hearts: Vec<StoreId> = stores.iter().map(|s| s.id).collect();

    Ok(StoresTemplate {
        ctx,
        title: "Hearted Stores".to_owned(),
        cards: cards(stores, &hearts),
        pagination: None,
    }
    .into_response())
}

/// Single store with author and reviews.
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(slug): Path<String>,
) -> Result<Response> {
    let detail = StoreRepository::new(state.pool())
        .detail(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {slug}")))?;

    let user_id = ctx.user.as_ref().map(|u| u.id);
    let can_edit = user_id.is_some_and(|id| detail.store.is_owned_by(id));
    let hearted = current_hearts(&state, user_id)
        .await?
        .contains(&detail.store.id);

    Ok(StoreTemplate {
        ctx,
        detail,
        can_edit,
        hearted,
    }
    .into_response())
}

// =============================================================================
// Add / Edit Routes
// =============================================================================

/// Empty add-store form.
pub async fn add_page(RequireAuth(_user): RequireAuth, ctx: PageContext) -> impl IntoResponse {
    EditStoreTemplate::new(ctx, None, StoreForm::default(), Vec::new())
}

/// Create a store from the add form.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let (form, upload) = read_store_form(multipart).await?;

    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => return Ok(invalid_form(&session, None, form, errors).await),
    };

    let photo = match save_photo(&state, upload).await {
        Ok(photo) => photo,
        Err(AppError::Upload(e @ UploadError::NotAnImage(_))) => {
            return Ok(invalid_form(&session, None, form, vec![e.to_string()]).await);
        }
        Err(e) => return Err(e),
    };

    let store = StoreService::new(state.pool())
        .create(&draft, photo.as_deref(), user.id)
        .await?;

    push_flash(
        &session,
        Flash::success(format!(
            "Successfully created {}. Care to leave a review?",
            store.name
        )),
    )
    .await?;

    Ok(Redirect::to(&format!("/store/{}", store.slug)).into_response())
}

/// Edit form for a store the user owns.
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Path(id): Path<i32>,
) -> Result<Response> {
    let store = owned_store(&state, StoreId::new(id), user.id).await?;
    let form = StoreForm::from_store(&store);
    Ok(EditStoreTemplate::new(ctx, Some(&store), form, Vec::new()).into_response())
}

/// Save the edit form.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Response> {
    let existing = owned_store(&state, StoreId::new(id), user.id).await?;
    let (form, upload) = read_store_form(multipart).await?;

    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => return Ok(invalid_form(&session, Some(&existing), form, errors).await),
    };

    let photo = match save_photo(&state, upload).await {
        Ok(photo) => photo,
        Err(AppError::Upload(e @ UploadError::NotAnImage(_))) => {
            let errors = vec![e.to_string()];
            return Ok(invalid_form(&session, Some(&existing), form, errors).await);
        }
        Err(e) => return Err(e),
    };

    let store = StoreService::new(state.pool())
        .update(&existing, &draft, photo.as_deref())
        .await?;

    push_flash(
        &session,
        Flash::success(format!("Successfully updated {}.", store.name)),
    )
    .await?;

    Ok(Redirect::to(&format!("/stores/{}/edit", store.id)).into_response())
}

async fn owned_store(state: &AppState, id: StoreId, user: UserId) -> Result<Store> {
    let store = StoreRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {id}")))?;

    if !store.is_owned_by(user) {
        return Err(AppError::Forbidden(NOT_OWNER_MESSAGE.to_owned()));
    }
    Ok(store)
}

async fn save_photo(state: &AppState, upload: Option<PhotoUpload>) -> Result<Option<String>> {
    let Some(upload) = upload else {
        return Ok(None);
    };
    let filename = state
        .photos()
        .save(&upload.bytes, &upload.content_type)
        .await?;
    Ok(Some(filename))
}

async fn invalid_form(
    session: &Session,
    existing: Option<&Store>,
    form: StoreForm,
    errors: Vec<String>,
) -> Response {
    let ctx = PageContext::load(session).await;
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        EditStoreTemplate::new(ctx, existing, form, errors),
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::CurrentUser;

    fn form() -> StoreForm {
        StoreForm {
            name: " Bob's Burgers ".to_string(),
            description: " Burgers. ".to_string(),
            tags: vec!["Wifi".to_string(), " ".to_string(), "Wifi".to_string()],
            address: "1 Ocean Ave".to_string(),
            lng: "-79.38".to_string(),
            lat: "43.65".to_string(),
        }
    }

    #[test]
    fn test_validate_builds_trimmed_draft() {
        let draft = form().validate().unwrap();
        assert_eq!(draft.name.as_str(), "Bob's Burgers");
        assert_eq!(draft.description, "Burgers.");
        assert_eq!(draft.tags, vec!["Wifi".to_string()]);
        assert_eq!(draft.location.coordinates, [-79.38, 43.65]);
    }

    #[test]
    fn test_validate_collects_every_error() {
        let bad = StoreForm {
            name: "  ".to_string(),
            address: String::new(),
            lng: "east".to_string(),
            ..form()
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.contains(&"Please enter a store name!".to_string()));
        assert!(errors.contains(&"You must supply coordinates!".to_string()));
        assert!(errors.contains(&"You must supply an address!".to_string()));
    }

    #[test]
    fn test_validate_rejects_out_of_range_latitude() {
        let bad = StoreForm {
            lat: "91".to_string(),
            ..form()
        };
        assert_eq!(bad.validate().unwrap_err().len(), 1);
    }

    #[test]
    fn test_pagination() {
        let p = Pagination::new(2, 9);
        assert_eq!(p.pages, 3);
        assert_eq!(p.offset(), 4);
        assert!(p.has_prev() && p.has_next());

        let p = Pagination::new(0, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.pages, 0);
        assert_eq!(p.offset(), 0);
        assert!(!p.has_next());
    }

    #[test]
    fn test_pagination_offset_saturates() {
        let p = Pagination::new(i64::MAX, 3);
        assert_eq!(p.offset(), i64::MAX);
        assert_eq!(p.fallback_page(0), Some(1));
    }

    #[test]
    fn test_fallback_page_for_empty_pages() {
        // 9 stores, page 7 is past the end
        assert_eq!(Pagination::new(7, 9).fallback_page(0), Some(3));
        assert_eq!(Pagination::new(3, 9).fallback_page(1), None);
        // empty site: page 1 renders, later pages go back to 1
        assert_eq!(Pagination::new(1, 0).fallback_page(0), None);
        assert_eq!(Pagination::new(2, 0).fallback_page(0), Some(1));
    }

    fn listed_store(author: i32) -> Store {
        use chrono::Utc;
        Store {
            id: StoreId::new(7),
            name: StoreName::parse("Bob's Burgers").unwrap(),
            slug: tastemap_core::Slug::from_name("Bob's Burgers"),
            description: "Burger of the day.".to_string(),
            tags: Vec::new(),
            created_at: Utc::now(),
            location: Location::new(GeoPoint::new(-79.38, 43.65).unwrap(), "1 Ocean Ave")
                .unwrap(),
            photo: None,
            author_id: UserId::new(author),
        }
    }

    fn listing_as(viewer: i32) -> String {
        let ctx = PageContext {
            user: Some(CurrentUser {
                id: UserId::new(viewer),
                email: tastemap_core::Email::parse("wes@example.com").unwrap(),
                name: "Wes".to_string(),
            }),
            flashes: Vec::new(),
        };
        StoresTemplate {
            ctx,
            title: "Stores".to_string(),
            cards: cards(vec![listed_store(2)], &[]),
            pagination: Some(Pagination::new(1, 1)),
        }
        .render()
        .unwrap()
    }

    #[test]
    fn test_store_card_shows_edit_link_to_author_only() {
        assert!(listing_as(2).contains("/stores/7/edit"));
        assert!(!listing_as(3).contains("/stores/7/edit"));
    }

    #[test]
    fn test_tag_options_keep_free_form_tags() {
        let options = tag_options(&["Licensed".to_string(), "Dog Friendly".to_string()]);
        assert_eq!(options.len(), TAG_CHOICES.len() + 1);
        assert!(options.iter().any(|o| o.name == "Licensed" && o.checked));
        assert!(options.iter().any(|o| o.name == "Wifi" && !o.checked));
        assert_eq!(
            options.last(),
            Some(&TagOption {
                name: "Dog Friendly".to_string(),
                checked: true
            })
        );
    }
}
