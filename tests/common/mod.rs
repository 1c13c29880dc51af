#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Request;

use enroll_backend::api::router;
use enroll_backend::config::AppConfig;
use enroll_backend::email::{EmailError, Mailer};
use enroll_backend::error::AppError;
use enroll_backend::models::{Course, CourseLevel, CourseStatus};
use enroll_backend::payments::{
    CheckoutSession, CheckoutSessionParams, PaymentProvider, SessionMetadata,
};
use enroll_backend::state::AppState;
use enroll_backend::store::MemoryStore;

pub const WEBHOOK_SECRET: &str = "whsec_test123secret456";

pub fn course(id: &str, max_students: &str, enrollments: i64) -> Course {
    Course {
        id: id.to_string(),
        title: "Web Development Bootcamp".to_string(),
        description: "Full stack in twelve weeks".to_string(),
        price: "99.00".to_string(),
        duration: "12".to_string(),
        level: CourseLevel::Beginner,
        category: "Technology".to_string(),
        start_date: "2026-09-01".to_string(),
        max_students: max_students.to_string(),
        enrollments,
        status: CourseStatus::Active,
        image_url: String::new(),
        created_at: "2026-08-01T00:00:00Z".to_string(),
    }
}

/// Payment provider fake: hands out deterministic session ids and remembers
/// every session it opened so the status fallback can be exercised.
#[derive(Default)]
pub struct FakePaymentProvider {
    sessions: Mutex<HashMap<String, CheckoutSession>>,
    created: AtomicUsize,
}

impl FakePaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn insert_session(&self, session: CheckoutSession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }
}

#[async_trait]
impl PaymentProvider for FakePaymentProvider {
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<String, AppError> {
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        let id = format!("cs_test_{}", n);
        let session = CheckoutSession {
            id: id.clone(),
            payment_intent: Some(format!("pi_{}", n)),
            amount_total: Some(params.unit_amount),
            metadata: Some(SessionMetadata {
                course_id: Some(params.course_id.clone()),
                course_title: Some(params.course_title.clone()),
                student_email: Some(params.customer_email.clone()),
                student_name: Some(params.student_name.clone()),
            }),
        };
        self.sessions.lock().unwrap().insert(id.clone(), session);
        Ok(id)
    }

    async fn retrieve_session(&self, id: &str) -> Result<Option<CheckoutSession>, AppError> {
        Ok(self.sessions.lock().unwrap().get(id).cloned())
    }
}

/// Mailer fake that records every send; flip `fail` to make delivery error.
#[derive(Default)]
pub struct RecordingMailer {
    pub fail: bool,
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError::Timeout);
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub payments: Arc<FakePaymentProvider>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn test_app(courses: Vec<Course>) -> TestApp {
    test_app_with_mailer(courses, RecordingMailer::new())
}

pub fn test_app_with_mailer(courses: Vec<Course>, mailer: RecordingMailer) -> TestApp {
    let store = Arc::new(MemoryStore::with_courses(courses));
    let payments = Arc::new(FakePaymentProvider::new());
    let mailer = Arc::new(mailer);

    let state = AppState {
        store: store.clone(),
        payments: payments.clone(),
        mailer: mailer.clone(),
        config: Arc::new(AppConfig {
            base_url: "http://localhost:3000".to_string(),
            webhook_secret: WEBHOOK_SECRET.to_string(),
        }),
    };

    TestApp {
        app: router(state),
        store,
        payments,
        mailer,
    }
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

/// A signed webhook delivery for the given raw payload.
pub fn signed_webhook(payload: &[u8], secret: &str) -> Request<Body> {
    let header = enroll_backend::payments::signature::sign_payload(
        payload,
        secret,
        chrono::Utc::now().timestamp(),
    );
    Request::builder()
        .method("POST")
        .uri("/api/webhook")
        .header("stripe-signature", header)
        .body(Body::from(payload.to_vec()))
        .expect("build request")
}

pub fn completed_event(
    event_id: &str,
    session_id: &str,
    course_id: Option<&str>,
    student_email: Option<&str>,
    amount_total: Option<i64>,
) -> Vec<u8> {
    let mut metadata = serde_json::Map::new();
    if let Some(course_id) = course_id {
        metadata.insert("courseId".to_string(), course_id.into());
    }
    if let Some(email) = student_email {
        metadata.insert("studentEmail".to_string(), email.into());
        metadata.insert("studentName".to_string(), "Ada Lovelace".into());
    }

    serde_json::json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "payment_intent": "pi_test_1",
                "amount_total": amount_total,
                "metadata": metadata,
            }
        }
    })
    .to_string()
    .into_bytes()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse body json")
}

/// The confirmation email is a detached task; give it a moment to land.
pub async fn wait_for_sends(mailer: &RecordingMailer, expected: usize) -> Vec<(String, String)> {
    for _ in 0..50 {
        let sent = mailer.sent();
        if sent.len() >= expected {
            return sent;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    mailer.sent()
}
