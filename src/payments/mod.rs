pub mod dto;
pub mod signature;
pub mod stripe;

use async_trait::async_trait;

use crate::error::AppError;

pub use dto::{CheckoutSession, SessionMetadata, WebhookEvent};
pub use signature::verify_signature;
pub use stripe::{StripeClient, StripeConfig};

/// Everything the provider needs to host a checkout for one course seat.
/// Metadata is echoed back verbatim on the completion webhook.
#[derive(Debug, Clone)]
pub struct CheckoutSessionParams {
    pub course_id: String,
    pub course_title: String,
    pub unit_amount: i64,
    pub customer_email: String,
    pub student_name: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Opens a hosted checkout session and returns its id.
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<String, AppError>;

    /// Looks a session up by id; `None` when the provider has no record.
    async fn retrieve_session(&self, id: &str) -> Result<Option<CheckoutSession>, AppError>;
}
