use std::collections::HashMap;
use std::env;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};

use crate::error::AppError;
use crate::models::{
    Course, CourseLevel, CourseStatus, Enrollment, EnrollmentStatus, ProcessedEvent,
    UpdateCourseRequest,
};
use crate::store::dto::{
    CommitRequest, Document, DocumentTransform, FieldTransform, ListDocumentsResponse,
    Precondition, Value, Write,
};
use crate::store::DocumentStore;

const COURSES: &str = "courses";
const ENROLLMENTS: &str = "enrollments";
const WEBHOOK_EVENTS: &str = "webhookEvents";

#[derive(Clone, Debug)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub access_token: String,
}

impl FirestoreConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let project_id = env::var("FIRESTORE_PROJECT_ID")
            .map_err(|_| AppError::BadRequest("FIRESTORE_PROJECT_ID is not set".to_string()))?;
        let access_token = env::var("FIRESTORE_ACCESS_TOKEN")
            .map_err(|_| AppError::BadRequest("FIRESTORE_ACCESS_TOKEN is not set".to_string()))?;

        Ok(Self {
            project_id,
            access_token,
        })
    }
}

/// Firestore REST client. Atomic counter updates go through `:commit` field
/// transforms rather than read-then-write, so concurrent webhook deliveries
/// for the same course cannot lose increments.
pub struct FirestoreClient {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreClient {
    pub fn new(config: FirestoreConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Upstream(format!("failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn documents_url(&self) -> String {
        format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents",
            self.config.project_id
        )
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_url(), collection, id)
    }

    /// Full resource path as used inside commit writes and transforms.
    fn doc_name(&self, collection: &str, id: &str) -> String {
        format!(
            "projects/{}/databases/(default)/documents/{}/{}",
            self.config.project_id, collection, id
        )
    }

    async fn fetch_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, AppError> {
        let response = self
            .client
            .get(self.doc_url(collection, id))
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("firestore request failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response, "firestore get").await?;
        let doc = response
            .json::<Document>()
            .await
            .map_err(|e| AppError::Upstream(format!("failed to parse firestore document: {}", e)))?;
        Ok(Some(doc))
    }

    async fn patch_document(
        &self,
        collection: &str,
        id: &str,
        fields: HashMap<String, Value>,
    ) -> Result<(), AppError> {
        let response = self
            .client
            .patch(self.doc_url(collection, id))
            .bearer_auth(&self.config.access_token)
            .json(&Document::new(fields))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("firestore request failed: {}", e)))?;
        check_status(response, "firestore patch").await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let mut courses = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(format!("{}/{}", self.documents_url(), COURSES))
                .bearer_auth(&self.config.access_token)
                .query(&[("pageSize", "100")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| AppError::Upstream(format!("firestore request failed: {}", e)))?;
            let response = check_status(response, "firestore list").await?;
            let page = response.json::<ListDocumentsResponse>().await.map_err(|e| {
                AppError::Upstream(format!("failed to parse firestore response: {}", e))
            })?;

            for doc in page.documents {
                match course_from_document(&doc) {
                    Ok(course) => courses.push(course),
                    Err(e) => {
                        tracing::warn!("skipping malformed course document: {}", e);
                    }
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(courses)
    }

    async fn get_course(&self, id: &str) -> Result<Option<Course>, AppError> {
        match self.fetch_document(COURSES, id).await? {
            Some(doc) => Ok(Some(course_from_document(&doc)?)),
            None => Ok(None),
        }
    }

    async fn insert_course(&self, course: &Course) -> Result<(), AppError> {
        let response = self
            .client
            .post(format!("{}/{}", self.documents_url(), COURSES))
            .bearer_auth(&self.config.access_token)
            .query(&[("documentId", course.id.as_str())])
            .json(&Document::new(course_fields(course)))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("firestore request failed: {}", e)))?;
        check_status(response, "firestore create").await?;
        Ok(())
    }

    async fn update_course(
        &self,
        id: &str,
        req: &UpdateCourseRequest,
    ) -> Result<Option<Course>, AppError> {
        let mut course = match self.get_course(id).await? {
            Some(course) => course,
            None => return Ok(None),
        };

        course.apply_update(req);
        self.patch_document(COURSES, id, course_fields(&course))
            .await?;
        Ok(Some(course))
    }

    async fn delete_course(&self, id: &str) -> Result<bool, AppError> {
        // Firestore deletes are silently idempotent; resolve the id first so
        // a stale admin action reports 404.
        if self.fetch_document(COURSES, id).await?.is_none() {
            return Ok(false);
        }

        let response = self
            .client
            .delete(self.doc_url(COURSES, id))
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("firestore request failed: {}", e)))?;
        check_status(response, "firestore delete").await?;
        Ok(true)
    }

    async fn get_enrollment(&self, session_id: &str) -> Result<Option<Enrollment>, AppError> {
        match self.fetch_document(ENROLLMENTS, session_id).await? {
            Some(doc) => Ok(Some(enrollment_from_document(&doc)?)),
            None => Ok(None),
        }
    }

    async fn apply_enrollment(
        &self,
        event_id: &str,
        course_id: &str,
        enrollment: Option<&Enrollment>,
    ) -> Result<bool, AppError> {
        let record = ProcessedEvent {
            event_id: event_id.to_string(),
            session_id: enrollment.map(|e| e.id.clone()).unwrap_or_default(),
            processed_at: Utc::now().to_rfc3339(),
        };

        let mut writes = vec![
            // Dedup record first: the exists=false precondition fails the
            // whole commit when this event id was already processed.
            Write {
                update: Some(Document::named(
                    self.doc_name(WEBHOOK_EVENTS, event_id),
                    processed_event_fields(&record),
                )),
                current_document: Some(Precondition { exists: false }),
                ..Default::default()
            },
            Write {
                transform: Some(DocumentTransform {
                    document: self.doc_name(COURSES, course_id),
                    field_transforms: vec![FieldTransform {
                        field_path: "enrollments".to_string(),
                        increment: Value::integer(1),
                    }],
                }),
                ..Default::default()
            },
        ];

        if let Some(enrollment) = enrollment {
            writes.push(Write {
                update: Some(Document::named(
                    self.doc_name(ENROLLMENTS, &enrollment.id),
                    enrollment_fields(enrollment),
                )),
                ..Default::default()
            });
        }

        let response = self
            .client
            .post(format!("{}:commit", self.documents_url()))
            .bearer_auth(&self.config.access_token)
            .json(&CommitRequest { writes })
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("firestore request failed: {}", e)))?;

        if response.status().is_success() {
            return Ok(true);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT
            || body.contains("ALREADY_EXISTS")
            || body.contains("FAILED_PRECONDITION")
        {
            return Ok(false);
        }
        Err(AppError::Upstream(format!(
            "firestore commit failed with {}: {}",
            status, body
        )))
    }
}

async fn check_status(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Upstream(format!(
        "{} failed with {}: {}",
        context, status, body
    )))
}

fn require_str(doc: &Document, key: &str) -> Result<String, AppError> {
    doc.fields
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            AppError::Upstream(format!(
                "malformed document {}: missing field {}",
                doc.id().unwrap_or("<unnamed>"),
                key
            ))
        })
}

fn str_or_default(doc: &Document, key: &str) -> String {
    doc.fields
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn course_fields(course: &Course) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("title".to_string(), Value::string(&course.title));
    fields.insert(
        "description".to_string(),
        Value::string(&course.description),
    );
    fields.insert("price".to_string(), Value::string(&course.price));
    fields.insert("duration".to_string(), Value::string(&course.duration));
    fields.insert("level".to_string(), Value::string(course.level.as_str()));
    fields.insert("category".to_string(), Value::string(&course.category));
    fields.insert("startDate".to_string(), Value::string(&course.start_date));
    fields.insert(
        "maxStudents".to_string(),
        Value::string(&course.max_students),
    );
    fields.insert("enrollments".to_string(), Value::integer(course.enrollments));
    fields.insert("status".to_string(), Value::string(course.status.as_str()));
    fields.insert("imageUrl".to_string(), Value::string(&course.image_url));
    fields.insert("createdAt".to_string(), Value::string(&course.created_at));
    fields
}

pub(crate) fn course_from_document(doc: &Document) -> Result<Course, AppError> {
    let id = doc
        .id()
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::Upstream("course document has no name".to_string()))?;

    let level = doc
        .fields
        .get("level")
        .and_then(|v| v.as_str())
        .and_then(CourseLevel::parse)
        .unwrap_or(CourseLevel::Beginner);
    let status = doc
        .fields
        .get("status")
        .and_then(|v| v.as_str())
        .and_then(CourseStatus::parse)
        .unwrap_or(CourseStatus::Active);

    Ok(Course {
        id,
        title: require_str(doc, "title")?,
        description: str_or_default(doc, "description"),
        price: str_or_default(doc, "price"),
        duration: str_or_default(doc, "duration"),
        level,
        category: str_or_default(doc, "category"),
        start_date: str_or_default(doc, "startDate"),
        max_students: str_or_default(doc, "maxStudents"),
        enrollments: doc
            .fields
            .get("enrollments")
            .and_then(|v| v.as_i64())
            .unwrap_or(0),
        status,
        image_url: str_or_default(doc, "imageUrl"),
        created_at: str_or_default(doc, "createdAt"),
    })
}

pub(crate) fn processed_event_fields(event: &ProcessedEvent) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("eventId".to_string(), Value::string(&event.event_id));
    fields.insert("sessionId".to_string(), Value::string(&event.session_id));
    fields.insert(
        "processedAt".to_string(),
        Value::string(&event.processed_at),
    );
    fields
}

pub(crate) fn enrollment_fields(enrollment: &Enrollment) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("courseId".to_string(), Value::string(&enrollment.course_id));
    fields.insert(
        "courseName".to_string(),
        Value::string(&enrollment.course_name),
    );
    fields.insert(
        "studentEmail".to_string(),
        Value::string(&enrollment.student_email),
    );
    fields.insert(
        "studentName".to_string(),
        Value::string(&enrollment.student_name),
    );
    fields.insert(
        "paymentId".to_string(),
        Value::string(&enrollment.payment_id),
    );
    fields.insert(
        "paymentAmount".to_string(),
        Value::double(enrollment.payment_amount),
    );
    fields.insert(
        "enrolledAt".to_string(),
        Value::string(&enrollment.enrolled_at),
    );
    fields.insert(
        "status".to_string(),
        Value::string(enrollment.status.as_str()),
    );
    fields
}

pub(crate) fn enrollment_from_document(doc: &Document) -> Result<Enrollment, AppError> {
    let id = doc
        .id()
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::Upstream("enrollment document has no name".to_string()))?;

    let status = doc
        .fields
        .get("status")
        .and_then(|v| v.as_str())
        .and_then(EnrollmentStatus::parse)
        .unwrap_or(EnrollmentStatus::Active);

    Ok(Enrollment {
        id,
        course_id: require_str(doc, "courseId")?,
        course_name: str_or_default(doc, "courseName"),
        student_email: str_or_default(doc, "studentEmail"),
        student_name: str_or_default(doc, "studentName"),
        payment_id: str_or_default(doc, "paymentId"),
        payment_amount: doc
            .fields
            .get("paymentAmount")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0),
        enrolled_at: str_or_default(doc, "enrolledAt"),
        status,
    })
}
