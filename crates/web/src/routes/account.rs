//! Account route handlers: profile edits and password reset.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;

use tastemap_core::Email;

use super::auth::log_in;
use crate::db::{RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{Flash, PageContext, RequireAuth, push_flash};
use crate::models::{CurrentUser, User, session_keys};
use crate::services::{AuthError, AuthService, MailTemplate};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotForm {
    #[serde(default)]
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetForm {
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "password-confirm")]
    pub password_confirm: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    pub ctx: PageContext,
    pub user: User,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/reset.html")]
pub struct ResetTemplate {
    pub ctx: PageContext,
    pub token: String,
}

// =============================================================================
// Profile
// =============================================================================

/// Display the account page.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ctx: PageContext,
) -> Result<Response> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", current.id)))?;

    Ok(AccountTemplate { ctx, user }.into_response())
}

/// Save name and email.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
    Form(form): Form<AccountForm>,
) -> Result<Response> {
    let name = form.name.trim();
    let email = match (name.is_empty(), Email::parse(&form.email)) {
        (false, Ok(email)) => email,
        (true, _) => return flash_and_redirect(&session, "You must supply a name!", "/account").await,
        (_, Err(_)) => {
            return flash_and_redirect(&session, "That Email is not valid!", "/account").await;
        }
    };

    let user = match UserRepository::new(state.pool())
        .update_profile(current.id, name, &email)
        .await
    {
        Ok(user) => user,
        Err(RepositoryError::Conflict(_)) => {
            return flash_and_redirect(
                &session,
                "An account with this email already exists",
                "/account",
            )
            .await;
        }
        Err(e) => return Err(e.into()),
    };

    session
        .insert(session_keys::CURRENT_USER, CurrentUser::from(&user))
        .await?;
    push_flash(&session, Flash::success("Updated the profile.")).await?;
    Ok(Redirect::to("/account").into_response())
}

// =============================================================================
// Password Reset
// =============================================================================

/// Email a reset link.
#[tracing::instrument(skip(state, session, form))]
pub async fn forgot(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ForgotForm>,
) -> Result<Response> {
    let (user, token) = match AuthService::new(state.pool())
        .start_password_reset(&form.email, Utc::now())
        .await
    {
        Ok(issued) => issued,
        Err(AuthError::UserNotFound) => {
            return flash_and_redirect(&session, "No account with that email exists.", "/login")
                .await;
        }
        Err(e) => return Err(e.into()),
    };

    let reset_url = state
        .config()
        .absolute_url(&format!("/account/reset/{token}"));
    let mail = MailTemplate::PasswordReset {
        name: user.name.clone(),
        reset_url,
    };
    state.email().send(&mail, &user.email).await?;

    push_flash(
        &session,
        Flash::success("You have been emailed a password reset link."),
    )
    .await?;
    Ok(Redirect::to("/login").into_response())
}

/// New password form, if the token is still good.
pub async fn reset_page(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .user_for_reset_token(&token, Utc::now())
        .await
    {
        Ok(_) => {
            let ctx = PageContext::load(&session).await;
            Ok(ResetTemplate { ctx, token }.into_response())
        }
        Err(AuthError::InvalidResetToken) => {
            flash_and_redirect(&session, "Password reset is invalid or has expired.", "/login")
                .await
        }
        Err(e) => Err(e.into()),
    }
}

/// Set the new password and log the user in.
pub async fn reset(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
    Form(form): Form<ResetForm>,
) -> Result<Response> {
    let back = format!("/account/reset/{token}");
    if form.password != form.password_confirm {
        return flash_and_redirect(&session, "Passwords do not match.", &back).await;
    }

    let user = match AuthService::new(state.pool())
        .complete_password_reset(&token, &form.password, Utc::now())
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidResetToken) => {
            return flash_and_redirect(
                &session,
                "Password reset is invalid or has expired.",
                "/login",
            )
            .await;
        }
        Err(AuthError::WeakPassword(message)) => {
            return flash_and_redirect(&session, &message, &back).await;
        }
        Err(e) => return Err(e.into()),
    };

    log_in(&session, &user).await?;
    push_flash(
        &session,
        Flash::success("Success, your password has been reset."),
    )
    .await?;
    Ok(Redirect::to("/").into_response())
}

async fn flash_and_redirect(session: &Session, message: &str, to: &str) -> Result<Response> {
    push_flash(session, Flash::error(message)).await?;
    Ok(Redirect::to(to).into_response())
}
