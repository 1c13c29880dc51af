mod common;

use axum::http::StatusCode;
use tower::ServiceExt;

use common::*;

fn checkout_body(course_id: &str) -> serde_json::Value {
    serde_json::json!({
        "courseId": course_id,
        "courseTitle": "Web Development Bootcamp",
        "coursePrice": "99.00",
        "customerInfo": {
            "email": "a@b.com",
            "firstName": "Ada",
            "lastName": "Lovelace"
        }
    })
}

#[tokio::test]
async fn checkout_succeeds_while_spots_remain() {
    let t = test_app(vec![course("c1", "20", 19)]);

    let response = t
        .app
        .oneshot(post_json("/api/checkout-session", checkout_body("c1")))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["sessionId"], "cs_test_0");
    assert_eq!(t.payments.created_count(), 1);
}

#[tokio::test]
async fn checkout_is_rejected_when_course_is_full() {
    let t = test_app(vec![course("c1", "20", 20)]);

    let response = t
        .app
        .oneshot(post_json("/api/checkout-session", checkout_body("c1")))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(t.payments.created_count(), 0);
}

#[tokio::test]
async fn checkout_requires_all_top_level_fields() {
    let t = test_app(vec![course("c1", "20", 0)]);

    let body = serde_json::json!({
        "courseId": "c1",
        "courseTitle": "Web Development Bootcamp"
    });
    let response = t
        .app
        .oneshot(post_json("/api/checkout-session", body))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(t.payments.created_count(), 0);
}

#[tokio::test]
async fn checkout_for_unknown_course_is_not_found() {
    let t = test_app(vec![]);

    let response = t
        .app
        .oneshot(post_json("/api/checkout-session", checkout_body("nope")))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(t.payments.created_count(), 0);
}

#[tokio::test]
async fn webhook_with_invalid_signature_writes_nothing() {
    let t = test_app(vec![course("c1", "20", 5)]);

    let payload = completed_event("evt_1", "cs_1", Some("c1"), Some("a@b.com"), Some(9900));
    let response = t
        .app
        .oneshot(signed_webhook(&payload, "whsec_wrong_secret"))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(t.store.course("c1").unwrap().enrollments, 5);
    assert_eq!(t.store.enrollment_count(), 0);
    assert_eq!(t.store.processed_event_count(), 0);
}

#[tokio::test]
async fn webhook_without_signature_header_is_rejected() {
    let t = test_app(vec![course("c1", "20", 5)]);

    let payload = completed_event("evt_1", "cs_1", Some("c1"), Some("a@b.com"), Some(9900));
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/webhook")
        .body(axum::body::Body::from(payload))
        .expect("build request");

    let response = t.app.oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(t.store.enrollment_count(), 0);
}

#[tokio::test]
async fn unknown_event_type_is_acknowledged_without_writes() {
    let t = test_app(vec![course("c1", "20", 5)]);

    let payload = serde_json::json!({
        "id": "evt_1",
        "type": "invoice.paid",
        "data": { "object": { "id": "in_1" } }
    })
    .to_string()
    .into_bytes();

    let response = t
        .app
        .oneshot(signed_webhook(&payload, WEBHOOK_SECRET))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["received"], true);
    assert_eq!(t.store.course("c1").unwrap().enrollments, 5);
    assert_eq!(t.store.enrollment_count(), 0);
    assert_eq!(t.store.processed_event_count(), 0);
}

#[tokio::test]
async fn completed_event_without_course_id_is_a_noop() {
    let t = test_app(vec![course("c1", "20", 5)]);

    let payload = completed_event("evt_1", "cs_1", None, Some("a@b.com"), Some(9900));
    let response = t
        .app
        .oneshot(signed_webhook(&payload, WEBHOOK_SECRET))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(t.store.course("c1").unwrap().enrollments, 5);
    assert_eq!(t.store.enrollment_count(), 0);
}

#[tokio::test]
async fn completed_event_for_missing_course_is_a_processing_error() {
    let t = test_app(vec![]);

    let payload = completed_event("evt_1", "cs_1", Some("ghost"), Some("a@b.com"), Some(9900));
    let response = t
        .app
        .oneshot(signed_webhook(&payload, WEBHOOK_SECRET))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(t.store.enrollment_count(), 0);
}

#[tokio::test]
async fn end_to_end_enrollment_records_state_and_notifies() {
    let t = test_app(vec![course("c1", "20", 19)]);

    let response = t
        .app
        .clone()
        .oneshot(post_json("/api/checkout-session", checkout_body("c1")))
        .await
        .expect("checkout request");
    assert_eq!(response.status(), StatusCode::OK);
    let session_id = body_json(response).await["sessionId"]
        .as_str()
        .expect("session id")
        .to_string();

    let payload = completed_event("evt_1", &session_id, Some("c1"), Some("a@b.com"), Some(9900));
    let response = t
        .app
        .clone()
        .oneshot(signed_webhook(&payload, WEBHOOK_SECRET))
        .await
        .expect("webhook request");
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(t.store.course("c1").unwrap().enrollments, 20);
    let enrollment = t.store.enrollment(&session_id).expect("enrollment recorded");
    assert_eq!(enrollment.course_id, "c1");
    assert_eq!(enrollment.student_email, "a@b.com");
    assert_eq!(enrollment.payment_amount, 99.0);
    assert_eq!(enrollment.status.as_str(), "active");

    let sent = wait_for_sends(&t.mailer, 1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "a@b.com");

    let response = t
        .app
        .oneshot(get(&format!(
            "/api/enrollment-details?session_id={}",
            session_id
        )))
        .await
        .expect("details request");
    assert_eq!(response.status(), StatusCode::OK);
    let details = body_json(response).await;
    assert_eq!(details["status"], "active");
    assert_eq!(details["amount"], 99.0);
    assert_eq!(details["startDate"], "2026-09-01");
}

#[tokio::test]
async fn redelivered_event_does_not_double_count() {
    let t = test_app(vec![course("c1", "20", 0)]);

    let payload = completed_event("evt_1", "cs_1", Some("c1"), Some("a@b.com"), Some(9900));
    for _ in 0..2 {
        let response = t
            .app
            .clone()
            .oneshot(signed_webhook(&payload, WEBHOOK_SECRET))
            .await
            .expect("webhook request");
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(t.store.course("c1").unwrap().enrollments, 1);
    assert_eq!(t.store.enrollment_count(), 1);
    assert!(t.store.enrollment("cs_1").is_some());
}

#[tokio::test]
async fn concurrent_deliveries_for_distinct_sessions_all_count() {
    let t = test_app(vec![course("c1", "100", 0)]);

    let mut handles = Vec::new();
    for i in 0..8 {
        let app = t.app.clone();
        handles.push(tokio::spawn(async move {
            let payload = completed_event(
                &format!("evt_{}", i),
                &format!("cs_{}", i),
                Some("c1"),
                Some("a@b.com"),
                Some(9900),
            );
            app.oneshot(signed_webhook(&payload, WEBHOOK_SECRET))
                .await
                .expect("webhook request")
                .status()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.expect("join"), StatusCode::OK);
    }

    assert_eq!(t.store.course("c1").unwrap().enrollments, 8);
    assert_eq!(t.store.enrollment_count(), 8);
}

#[tokio::test]
async fn status_reader_reports_processing_before_the_webhook_lands() {
    let t = test_app(vec![course("c1", "20", 19)]);

    let response = t
        .app
        .clone()
        .oneshot(post_json("/api/checkout-session", checkout_body("c1")))
        .await
        .expect("checkout request");
    let session_id = body_json(response).await["sessionId"]
        .as_str()
        .expect("session id")
        .to_string();

    let response = t
        .app
        .oneshot(get(&format!(
            "/api/enrollment-details?session_id={}",
            session_id
        )))
        .await
        .expect("details request");

    assert_eq!(response.status(), StatusCode::OK);
    let details = body_json(response).await;
    assert_eq!(details["status"], "processing");
    assert_eq!(details["courseName"], "Web Development Bootcamp");
    assert_eq!(details["amount"], 99.0);
}

#[tokio::test]
async fn status_reader_requires_a_session_id() {
    let t = test_app(vec![]);
    let response = t
        .app
        .oneshot(get("/api/enrollment-details"))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_reader_404s_when_nobody_knows_the_session() {
    let t = test_app(vec![]);
    let response = t
        .app
        .oneshot(get("/api/enrollment-details?session_id=cs_unknown"))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn email_failure_does_not_fail_the_webhook() {
    let t = test_app_with_mailer(vec![course("c1", "20", 0)], RecordingMailer::failing());

    let payload = completed_event("evt_1", "cs_1", Some("c1"), Some("a@b.com"), Some(9900));
    let response = t
        .app
        .oneshot(signed_webhook(&payload, WEBHOOK_SECRET))
        .await
        .expect("webhook request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["received"], true);
    assert_eq!(t.store.course("c1").unwrap().enrollments, 1);
    assert!(t.store.enrollment("cs_1").is_some());
}
