//! Confirmation email delivery over SMTP.
//!
//! Delivery is best-effort: the reconciler spawns sends as detached tasks and
//! only ever logs the outcome. A send that outlives [`SEND_TIMEOUT`] counts
//! as failed.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),

    #[error("Email send timed out")]
    Timeout,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub user: String,
    pub password: String,
    pub from_address: String,
}

impl EmailConfig {
    /// Returns `None` when `EMAIL_USER`/`EMAIL_PASSWORD` are absent,
    /// signalling that delivery is not configured and a noop mailer should be
    /// used instead.
    pub fn from_env() -> Option<Self> {
        let user = env::var("EMAIL_USER").ok()?;
        let password = env::var("EMAIL_PASSWORD").ok()?;
        let smtp_host =
            env::var("SMTP_HOST").unwrap_or_else(|_| DEFAULT_SMTP_HOST.to_string());
        let from_address = format!("\"Lewisham Adult Learning\" <{}>", user);

        Some(Self {
            smtp_host,
            user,
            password,
            from_address,
        })
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError>;
}

pub struct SmtpMailer {
    config: EmailConfig,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
            .credentials(Credentials::new(
                self.config.user.clone(),
                self.config.password.clone(),
            ))
            .build();

        match tokio::time::timeout(SEND_TIMEOUT, mailer.send(email)).await {
            Ok(result) => {
                result?;
                tracing::info!(to = to, "confirmation email sent");
                Ok(())
            }
            Err(_) => Err(EmailError::Timeout),
        }
    }
}

/// Stand-in mailer for tests and for deployments without SMTP credentials.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, to: &str, _subject: &str, _html: &str) -> Result<(), EmailError> {
        tracing::debug!(to = to, "email delivery not configured, dropping message");
        Ok(())
    }
}
