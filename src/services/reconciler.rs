use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::email::Mailer;
use crate::error::AppError;
use crate::models::{Course, Enrollment, EnrollmentStatus};
use crate::payments::{WebhookEvent, verify_signature};
use crate::store::DocumentStore;

const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Counter incremented and (when student metadata was present) an
    /// enrollment recorded.
    Processed,
    /// Event type this service does not handle.
    Ignored,
    /// Completed session without a courseId; nothing to reconcile.
    NoOp,
    /// Event id seen before; the store refused the commit.
    Duplicate,
}

/// Turns a provider's async completion event into durable enrollment state:
/// verify the signature, resolve the course, commit the counter increment and
/// enrollment document atomically, then kick off the confirmation email.
pub struct WebhookReconciler {
    store: Arc<dyn DocumentStore>,
    mailer: Arc<dyn Mailer>,
    webhook_secret: String,
}

impl WebhookReconciler {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        mailer: Arc<dyn Mailer>,
        webhook_secret: String,
    ) -> Self {
        Self {
            store,
            mailer,
            webhook_secret,
        }
    }

    pub async fn process(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<ReconcileOutcome, AppError> {
        verify_signature(payload, signature_header, &self.webhook_secret)?;

        let event: WebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| AppError::BadRequest(format!("Webhook Error: {}", e)))?;

        if event.event_type != CHECKOUT_COMPLETED {
            return Ok(ReconcileOutcome::Ignored);
        }

        let session = event.data.object;
        let metadata = session.metadata();
        let Some(course_id) = metadata.course_id else {
            return Ok(ReconcileOutcome::NoOp);
        };

        // A completed payment referencing a course we do not know is a
        // processing error, not something to drop quietly.
        let course = self.store.get_course(&course_id).await?.ok_or_else(|| {
            AppError::Upstream(format!(
                "course {} missing for completed session {}",
                course_id, session.id
            ))
        })?;

        let enrollment = metadata.student_email.as_ref().map(|email| Enrollment {
            id: session.id.clone(),
            course_id: course_id.clone(),
            course_name: metadata
                .course_title
                .clone()
                .unwrap_or_else(|| course.title.clone()),
            student_email: email.clone(),
            student_name: metadata
                .student_name
                .clone()
                .unwrap_or_else(|| "Student".to_string()),
            payment_id: session.payment_intent.clone().unwrap_or_default(),
            payment_amount: session
                .amount_total
                .map(|total| total as f64 / 100.0)
                .unwrap_or(0.0),
            enrolled_at: Utc::now().to_rfc3339(),
            status: EnrollmentStatus::Active,
        });

        let fresh = self
            .store
            .apply_enrollment(&event.id, &course_id, enrollment.as_ref())
            .await?;
        if !fresh {
            info!("webhook event {} already processed, skipping", event.id);
            return Ok(ReconcileOutcome::Duplicate);
        }

        info!(
            "recorded enrollment for course {} from session {}",
            course_id, session.id
        );

        if let Some(enrollment) = enrollment {
            self.notify(enrollment, course);
        }

        Ok(ReconcileOutcome::Processed)
    }

    /// Detached send; the webhook response never waits on, or fails because
    /// of, email delivery.
    fn notify(&self, enrollment: Enrollment, course: Course) {
        let mailer = Arc::clone(&self.mailer);
        tokio::spawn(async move {
            let subject = format!("Enrollment confirmed: {}", enrollment.course_name);
            let body = confirmation_body(&enrollment, &course);
            if let Err(err) = mailer
                .send(&enrollment.student_email, &subject, &body)
                .await
            {
                warn!(
                    "confirmation email to {} failed: {}",
                    enrollment.student_email, err
                );
            }
        });
    }
}

fn confirmation_body(enrollment: &Enrollment, course: &Course) -> String {
    format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h1>You're enrolled!</h1>\
         <p>Hi {},</p>\
         <p>Your payment of ${:.2} for <strong>{}</strong> has been received.</p>\
         <p>The course starts on {}. We'll be in touch before then with joining details.</p>\
         </div>",
        enrollment.student_name, enrollment.payment_amount, enrollment.course_name, course.start_date
    )
}
