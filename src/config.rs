use std::env;

use crate::error::AppError;

/// Process-level settings shared across handlers. Client-specific settings
/// (Stripe, Firestore, SMTP) live with their clients.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Public origin used to build checkout redirect URLs.
    pub base_url: String,
    /// Shared secret for verifying inbound webhook signatures.
    pub webhook_secret: String,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let webhook_secret = env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| AppError::BadRequest("STRIPE_WEBHOOK_SECRET is not set".to_string()))?;

        Ok(Self {
            base_url,
            webhook_secret,
        })
    }
}
