use serde::{Deserialize, Serialize};

/// Provider-side checkout session, as returned by the sessions API and as
/// embedded in the completion event. Amounts are in minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub metadata: Option<SessionMetadata>,
}

impl CheckoutSession {
    pub fn metadata(&self) -> SessionMetadata {
        self.metadata.clone().unwrap_or_default()
    }
}

/// The metadata bag attached at session creation and echoed back verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMetadata {
    #[serde(default, rename = "courseId")]
    pub course_id: Option<String>,
    #[serde(default, rename = "courseTitle")]
    pub course_title: Option<String>,
    #[serde(default, rename = "studentEmail")]
    pub student_email: Option<String>,
    #[serde(default, rename = "studentName")]
    pub student_name: Option<String>,
}

/// Envelope of an inbound webhook event. Only the fields this service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: CheckoutSession,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionResponse {
    pub id: String,
}
