//! Email service for transactional mail.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and text templates.
//! Without a configured relay, messages are rendered and logged instead of
//! sent, which is what development and tests use.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use tastemap_core::Email;

use crate::config::MailConfig;

/// HTML template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    name: &'a str,
    reset_url: &'a str,
}

/// Plain text template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    name: &'a str,
    reset_url: &'a str,
}

/// Mail the application knows how to send.
#[derive(Debug, Clone)]
pub enum MailTemplate {
    /// Link to `/account/reset/{token}`.
    PasswordReset {
        /// Recipient's display name.
        name: String,
        /// Absolute reset URL.
        reset_url: String,
    },
}

impl MailTemplate {
    /// Subject line for this mail.
    #[must_use]
    pub const fn subject(&self) -> &'static str {
        match self {
            Self::PasswordReset { .. } => "Password Reset",
        }
    }

    /// Render the plain text and HTML bodies.
    ///
    /// # Errors
    ///
    /// Returns error if a template fails to render.
    pub fn render(&self) -> Result<(String, String), EmailError> {
        match self {
            Self::PasswordReset { name, reset_url } => {
                let text = PasswordResetText { name, reset_url }.render()?;
                let html = PasswordResetHtml { name, reset_url }.render()?;
                Ok((text, html))
            }
        }
    }
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
}

impl EmailService {
    /// Sender used when no relay is configured.
    pub const DEFAULT_FROM: &'static str = "Tastemap <noreply@tastemap.local>";

    /// Create a new email service from configuration.
    ///
    /// `None` yields a service that logs mail instead of sending it.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay address is invalid.
    pub fn new(config: Option<&MailConfig>) -> Result<Self, SmtpError> {
        let Some(config) = config else {
            tracing::warn!("MAIL_HOST not set; outgoing mail will only be logged");
            return Ok(Self {
                mailer: None,
                from_address: Self::DEFAULT_FROM.to_owned(),
            });
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_string(),
            ));
        }

        Ok(Self {
            mailer: Some(builder.build()),
            from_address: config.from_address.clone(),
        })
    }

    /// Whether mail actually leaves the process.
    #[must_use]
    pub const fn is_delivering(&self) -> bool {
        self.mailer.is_some()
    }

    /// Render `template` and deliver it to `to`.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send(&self, template: &MailTemplate, to: &Email) -> Result<(), EmailError> {
        let (text, html) = template.render()?;
        self.send_multipart_email(to.as_str(), template.subject(), &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        let Some(mailer) = &self.mailer else {
            tracing::info!(to = %to, subject = %subject, body = %text_body, "Email not sent (no relay configured)");
            return Ok(());
        };

        mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn reset() -> MailTemplate {
        MailTemplate::PasswordReset {
            name: "Wes".to_string(),
            reset_url: "https://tastemap.test/account/reset/abc123".to_string(),
        }
    }

    #[test]
    fn test_password_reset_renders_link_in_both_parts() {
        let (text, html) = reset().render().unwrap();
        assert!(text.contains("https://tastemap.test/account/reset/abc123"));
        assert!(html.contains("https://tastemap.test/account/reset/abc123"));
        assert!(text.contains("Wes"));
    }

    #[test]
    fn test_subject() {
        assert_eq!(reset().subject(), "Password Reset");
    }

    #[tokio::test]
    async fn test_unconfigured_service_logs_instead_of_sending() {
        let service = EmailService::new(None).unwrap();
        assert!(!service.is_delivering());
        let to = Email::parse("wes@example.com").unwrap();
        service.send(&reset(), &to).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_unparseable_recipient() {
        let service = EmailService::new(None).unwrap();
        let err = service
            .send_multipart_email("not an address", "s", "t", "h")
            .await
            .unwrap_err();
        assert!(matches!(err, EmailError::InvalidAddress(_)));
    }
}
