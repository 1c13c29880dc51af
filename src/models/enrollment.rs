use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(EnrollmentStatus::Active),
            _ => None,
        }
    }
}

/// Durable record that a student completed payment for a course.
/// Keyed 1:1 by the payment session id; written only by the webhook
/// reconciler, never updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: String,
    pub course_id: String,
    pub course_name: String,
    pub student_email: String,
    pub student_name: String,
    pub payment_id: String,
    pub payment_amount: f64,
    pub enrolled_at: String,
    pub status: EnrollmentStatus,
}

/// Dedup marker for a delivered webhook event, keyed by the provider's event
/// id. Its presence means the counter increment for that event already
/// happened, so a redelivery must not reprocess.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedEvent {
    pub event_id: String,
    pub session_id: String,
    pub processed_at: String,
}
