use std::env;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::AppError;
use crate::payments::dto::{CheckoutSession, CreateSessionResponse};
use crate::payments::{CheckoutSessionParams, PaymentProvider};

const API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Clone, Debug)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
}

impl StripeConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let secret_key = env::var("STRIPE_SECRET_KEY")
            .map_err(|_| AppError::BadRequest("STRIPE_SECRET_KEY is not set".to_string()))?;
        let webhook_secret = env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| AppError::BadRequest("STRIPE_WEBHOOK_SECRET is not set".to_string()))?;

        Ok(Self {
            secret_key,
            webhook_secret,
        })
    }
}

pub struct StripeClient {
    client: Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Upstream(format!("failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<String, AppError> {
        // The sessions API takes form-encoded bracket notation, not JSON.
        let description = format!("Enrollment for {}", params.course_title);
        let unit_amount = params.unit_amount.to_string();
        let form: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("payment_method_types[0]", "card"),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", "usd"),
            ("line_items[0][price_data][unit_amount]", &unit_amount),
            (
                "line_items[0][price_data][product_data][name]",
                &params.course_title,
            ),
            (
                "line_items[0][price_data][product_data][description]",
                &description,
            ),
            ("metadata[courseId]", &params.course_id),
            ("metadata[courseTitle]", &params.course_title),
            ("metadata[studentEmail]", &params.customer_email),
            ("metadata[studentName]", &params.student_name),
            ("customer_email", &params.customer_email),
            ("success_url", &params.success_url),
            ("cancel_url", &params.cancel_url),
        ];

        let response = self
            .client
            .post(format!("{}/checkout/sessions", API_BASE))
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("stripe request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "stripe session create failed with {}: {}",
                status, body
            )));
        }

        let session = response
            .json::<CreateSessionResponse>()
            .await
            .map_err(|e| AppError::Upstream(format!("failed to parse stripe response: {}", e)))?;
        Ok(session.id)
    }

    async fn retrieve_session(&self, id: &str) -> Result<Option<CheckoutSession>, AppError> {
        let response = self
            .client
            .get(format!("{}/checkout/sessions/{}", API_BASE, id))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("stripe request failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "stripe session retrieve failed with {}: {}",
                status, body
            )));
        }

        let session = response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| AppError::Upstream(format!("failed to parse stripe response: {}", e)))?;
        Ok(Some(session))
    }
}
