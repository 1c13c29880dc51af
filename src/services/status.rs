use std::sync::Arc;

use serde::Serialize;

use crate::error::AppError;
use crate::payments::PaymentProvider;
use crate::store::DocumentStore;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentDetails {
    pub course_name: String,
    pub start_date: String,
    pub amount: f64,
    pub status: String,
}

/// Resolves an enrollment by checkout session id. The success redirect can
/// outrace webhook delivery, so a missing local record falls back to the
/// provider and reports a provisional "processing" status instead of 404ing.
pub struct EnrollmentStatusService {
    store: Arc<dyn DocumentStore>,
    payments: Arc<dyn PaymentProvider>,
}

impl EnrollmentStatusService {
    pub fn new(store: Arc<dyn DocumentStore>, payments: Arc<dyn PaymentProvider>) -> Self {
        Self { store, payments }
    }

    pub async fn lookup(&self, session_id: &str) -> Result<EnrollmentDetails, AppError> {
        if let Some(enrollment) = self.store.get_enrollment(session_id).await? {
            let course = self
                .store
                .get_course(&enrollment.course_id)
                .await?
                .ok_or(AppError::NotFound)?;

            return Ok(EnrollmentDetails {
                course_name: enrollment.course_name,
                start_date: course.start_date,
                amount: enrollment.payment_amount,
                status: enrollment.status.as_str().to_string(),
            });
        }

        let session = self
            .payments
            .retrieve_session(session_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let course_id = session.metadata().course_id.ok_or(AppError::NotFound)?;
        let course = self
            .store
            .get_course(&course_id)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(EnrollmentDetails {
            course_name: course.title,
            start_date: course.start_date,
            amount: session
                .amount_total
                .map(|total| total as f64 / 100.0)
                .unwrap_or(0.0),
            status: "processing".to_string(),
        })
    }
}
