use std::sync::Arc;

use serde::Deserialize;

use crate::error::AppError;
use crate::payments::{CheckoutSessionParams, PaymentProvider};
use crate::store::DocumentStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub course_id: Option<String>,
    pub course_title: Option<String>,
    pub course_price: Option<String>,
    pub customer_info: Option<CustomerInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Opens a payment session for a course seat. Performs no local writes:
/// enrollment state only changes when the completion webhook arrives.
pub struct CheckoutService {
    store: Arc<dyn DocumentStore>,
    payments: Arc<dyn PaymentProvider>,
    base_url: String,
}

impl CheckoutService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        payments: Arc<dyn PaymentProvider>,
        base_url: String,
    ) -> Self {
        Self {
            store,
            payments,
            base_url,
        }
    }

    pub async fn create_session(&self, req: CheckoutRequest) -> Result<String, AppError> {
        let missing =
            || AppError::BadRequest("Missing required course information".to_string());
        let course_id = req.course_id.filter(|s| !s.is_empty()).ok_or_else(missing)?;
        let course_title = req
            .course_title
            .filter(|s| !s.is_empty())
            .ok_or_else(missing)?;
        let course_price = req
            .course_price
            .filter(|s| !s.is_empty())
            .ok_or_else(missing)?;
        let customer = req.customer_info.ok_or_else(missing)?;

        let course = self
            .store
            .get_course(&course_id)
            .await?
            .ok_or(AppError::NotFound)?;

        // Advisory gate: reads a possibly-stale counter, and the reconciler
        // never re-checks. Capacity is not enforced transactionally.
        if course.spots_remaining() <= 0 {
            return Err(AppError::CourseFull);
        }

        let price: f64 = course_price
            .parse()
            .map_err(|_| AppError::BadRequest("Invalid course price".to_string()))?;
        let unit_amount = (price * 100.0) as i64;

        let params = CheckoutSessionParams {
            course_id: course_id.clone(),
            course_title,
            unit_amount,
            customer_email: customer.email.clone(),
            student_name: format!("{} {}", customer.first_name, customer.last_name),
            success_url: format!(
                "{}/enrollment/success?session_id={{CHECKOUT_SESSION_ID}}",
                self.base_url
            ),
            cancel_url: format!("{}/courses/{}", self.base_url, course_id),
        };

        self.payments.create_checkout_session(&params).await
    }
}
