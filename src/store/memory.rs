use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Course, Enrollment, UpdateCourseRequest};
use crate::store::DocumentStore;

#[derive(Default)]
struct Inner {
    courses: HashMap<String, Course>,
    enrollments: HashMap<String, Enrollment>,
    processed_events: HashSet<String>,
}

/// In-memory store used by the test suites. One mutex guards all three
/// collections so `apply_enrollment` has the same all-or-nothing behavior as
/// the real store's commit.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_courses(courses: Vec<Course>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock().unwrap();
            for course in courses {
                inner.courses.insert(course.id.clone(), course);
            }
        }
        store
    }

    pub fn course(&self, id: &str) -> Option<Course> {
        self.inner.lock().unwrap().courses.get(id).cloned()
    }

    pub fn enrollment(&self, session_id: &str) -> Option<Enrollment> {
        self.inner
            .lock()
            .unwrap()
            .enrollments
            .get(session_id)
            .cloned()
    }

    pub fn enrollment_count(&self) -> usize {
        self.inner.lock().unwrap().enrollments.len()
    }

    pub fn processed_event_count(&self) -> usize {
        self.inner.lock().unwrap().processed_events.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.courses.values().cloned().collect())
    }

    async fn get_course(&self, id: &str) -> Result<Option<Course>, AppError> {
        Ok(self.course(id))
    }

    async fn insert_course(&self, course: &Course) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        inner.courses.insert(course.id.clone(), course.clone());
        Ok(())
    }

    async fn update_course(
        &self,
        id: &str,
        req: &UpdateCourseRequest,
    ) -> Result<Option<Course>, AppError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.courses.get_mut(id) {
            Some(course) => {
                course.apply_update(req);
                Ok(Some(course.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_course(&self, id: &str) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.courses.remove(id).is_some())
    }

    async fn get_enrollment(&self, session_id: &str) -> Result<Option<Enrollment>, AppError> {
        Ok(self.enrollment(session_id))
    }

    async fn apply_enrollment(
        &self,
        event_id: &str,
        course_id: &str,
        enrollment: Option<&Enrollment>,
    ) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.processed_events.contains(event_id) {
            return Ok(false);
        }
        if !inner.courses.contains_key(course_id) {
            return Err(AppError::Upstream(format!(
                "course {} does not exist",
                course_id
            )));
        }

        inner.processed_events.insert(event_id.to_string());
        if let Some(course) = inner.courses.get_mut(course_id) {
            course.enrollments += 1;
        }
        if let Some(enrollment) = enrollment {
            inner
                .enrollments
                .insert(enrollment.id.clone(), enrollment.clone());
        }
        Ok(true)
    }
}
