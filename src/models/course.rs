use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseLevel::Beginner => "beginner",
            CourseLevel::Intermediate => "intermediate",
            CourseLevel::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(CourseLevel::Beginner),
            "intermediate" => Some(CourseLevel::Intermediate),
            "advanced" => Some(CourseLevel::Advanced),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Active,
    Inactive,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Active => "active",
            CourseStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(CourseStatus::Active),
            "inactive" => Some(CourseStatus::Inactive),
            _ => None,
        }
    }
}

/// A bootcamp offering. `price` and `max_students` travel as strings the way
/// the staff console submits them; `enrollments` is only ever mutated through
/// the store's atomic increment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub duration: String,
    pub level: CourseLevel,
    pub category: String,
    pub start_date: String,
    pub max_students: String,
    pub enrollments: i64,
    pub status: CourseStatus,
    #[serde(default)]
    pub image_url: String,
    pub created_at: String,
}

impl Course {
    pub fn new(req: NewCourseRequest) -> Self {
        Course {
            id: Uuid::new_v4().to_string(),
            title: req.title,
            description: req.description,
            price: req.price,
            duration: req.duration,
            level: req.level,
            category: req.category,
            start_date: req.start_date,
            max_students: req.max_students,
            enrollments: 0,
            status: req.status.unwrap_or(CourseStatus::Active),
            image_url: req.image_url.unwrap_or_default(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    /// Capacity is advisory: a malformed `max_students` counts as zero spots.
    pub fn spots_remaining(&self) -> i64 {
        self.max_students.parse::<i64>().unwrap_or(0) - self.enrollments
    }

    pub fn apply_update(&mut self, req: &UpdateCourseRequest) {
        if let Some(title) = &req.title {
            self.title = title.clone();
        }
        if let Some(description) = &req.description {
            self.description = description.clone();
        }
        if let Some(price) = &req.price {
            self.price = price.clone();
        }
        if let Some(duration) = &req.duration {
            self.duration = duration.clone();
        }
        if let Some(level) = req.level {
            self.level = level;
        }
        if let Some(category) = &req.category {
            self.category = category.clone();
        }
        if let Some(start_date) = &req.start_date {
            self.start_date = start_date.clone();
        }
        if let Some(max_students) = &req.max_students {
            self.max_students = max_students.clone();
        }
        if let Some(image_url) = &req.image_url {
            self.image_url = image_url.clone();
        }
        if let Some(status) = req.status {
            self.status = status;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourseRequest {
    pub title: String,
    pub description: String,
    pub price: String,
    pub duration: String,
    pub level: CourseLevel,
    pub category: String,
    pub start_date: String,
    pub max_students: String,
    pub image_url: Option<String>,
    pub status: Option<CourseStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub duration: Option<String>,
    pub level: Option<CourseLevel>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub max_students: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<CourseStatus>,
}
