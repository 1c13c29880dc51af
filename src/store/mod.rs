pub mod dto;
pub mod firestore;
pub mod memory;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Course, Enrollment, UpdateCourseRequest};

pub use firestore::{FirestoreClient, FirestoreConfig};
pub use memory::MemoryStore;

/// Schemaless document store holding the `courses`, `enrollments` and
/// `webhookEvents` collections. Documents are converted to typed entities at
/// this boundary; callers never see raw store payloads.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_courses(&self) -> Result<Vec<Course>, AppError>;

    async fn get_course(&self, id: &str) -> Result<Option<Course>, AppError>;

    async fn insert_course(&self, course: &Course) -> Result<(), AppError>;

    /// Applies the staff-editable fields onto the stored course. Returns the
    /// updated course, or `None` when the id does not resolve. Never touches
    /// the enrollment counter.
    async fn update_course(
        &self,
        id: &str,
        req: &UpdateCourseRequest,
    ) -> Result<Option<Course>, AppError>;

    async fn delete_course(&self, id: &str) -> Result<bool, AppError>;

    async fn get_enrollment(&self, session_id: &str) -> Result<Option<Enrollment>, AppError>;

    /// The reconciliation write: one atomic commit that records the event id
    /// (create-if-absent), increments the course's enrollment counter, and
    /// sets the enrollment document when one is supplied.
    ///
    /// Returns `false` without writing anything when the event id was already
    /// recorded, so a redelivered webhook cannot double-count.
    async fn apply_enrollment(
        &self,
        event_id: &str,
        course_id: &str,
        enrollment: Option<&Enrollment>,
    ) -> Result<bool, AppError>;
}
