//! Authentication route handlers.
//!
//! Handles login, logout and registration with email and password.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use tastemap_core::Email;

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{Flash, PageContext, clear_current_user, push_flash, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "password-confirm")]
    pub password_confirm: String,
}

impl RegisterForm {
    /// Check every field, returning the normalized email.
    ///
    /// # Errors
    ///
    /// Returns every validation message if anything is wrong.
    pub fn validate(&self) -> std::result::Result<Email, Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("You must supply a name!".to_owned());
        }
        let email = Email::parse(&self.email)
            .map_err(|_| errors.push("That Email is not valid!".to_owned()))
            .ok();
        if self.password.trim().is_empty() {
            errors.push("Password cannot be blank!".to_owned());
        }
        if self.password_confirm.trim().is_empty() {
            errors.push("Confirmed password cannot be blank!".to_owned());
        }
        if self.password != self.password_confirm {
            errors.push("Oops! Your passwords do not match".to_owned());
        }

        match email {
            Some(email) if errors.is_empty() => Ok(email),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub name: String,
    pub email: String,
    pub errors: Vec<String>,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Put `user` in the session and tag Sentry with them.
pub(crate) async fn log_in(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "User logged in", None);
    Ok(())
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display the login page.
pub async fn login_page(ctx: PageContext) -> impl IntoResponse {
    LoginTemplate { ctx }
}

/// Handle login form submission.
#[tracing::instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            log_in(&session, &user).await?;
            push_flash(&session, Flash::success("You are now logged in.")).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Login failed");
            push_flash(&session, Flash::error("Login failed!")).await?;
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Log out and go home.
pub async fn logout(session: Session) -> Result<Response> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    push_flash(&session, Flash::success("You are now logged out.")).await?;
    Ok(Redirect::to("/").into_response())
}

/// Display the registration page.
pub async fn register_page(ctx: PageContext) -> impl IntoResponse {
    RegisterTemplate {
        ctx,
        name: String::new(),
        email: String::new(),
        errors: Vec::new(),
    }
}

/// Handle registration form submission.
#[tracing::instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let email = match form.validate() {
        Ok(email) => email,
        Err(errors) => return Ok(register_failed(&session, &form, errors).await),
    };

    let result = AuthService::new(state.pool())
        .register(email.as_str(), &form.name, &form.password)
        .await;

    match result {
        Ok(user) => {
            log_in(&session, &user).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::UserAlreadyExists) => {
            let errors = vec!["An account with this email already exists".to_owned()];
            Ok(register_failed(&session, &form, errors).await)
        }
        Err(e) => Err(e.into()),
    }
}

async fn register_failed(session: &Session, form: &RegisterForm, errors: Vec<String>) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        RegisterTemplate {
            ctx: PageContext::load(session).await,
            name: form.name.trim().to_owned(),
            email: form.email.trim().to_owned(),
            errors,
        },
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> RegisterForm {
        RegisterForm {
            name: "Wes".to_string(),
            email: " Wes@Example.com ".to_string(),
            password: "hunter2".to_string(),
            password_confirm: "hunter2".to_string(),
        }
    }

    #[test]
    fn test_register_form_normalizes_email() {
        let email = form().validate().unwrap();
        assert_eq!(email.as_str(), "wes@example.com");
    }

    #[test]
    fn test_register_form_reports_every_problem() {
        let errors = RegisterForm::default().validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                "You must supply a name!".to_string(),
                "That Email is not valid!".to_string(),
                "Password cannot be blank!".to_string(),
                "Confirmed password cannot be blank!".to_string(),
            ]
        );
    }

    #[test]
    fn test_register_form_rejects_mismatched_passwords() {
        let mismatched = RegisterForm {
            password_confirm: "hunter3".to_string(),
            ..form()
        };
        assert_eq!(
            mismatched.validate().unwrap_err(),
            vec!["Oops! Your passwords do not match".to_string()]
        );
    }
}
