//! Canvas record types.
//!
//! Canvas omits fields freely depending on enrollment state and permissions,
//! so everything beyond ids is optional.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// A course the authenticated user can see.
#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    pub id: u64,
    /// Absent on unpublished/restricted enrollments
    pub name: Option<String>,
}

/// A wiki page's latest revision.
#[derive(Debug, Clone, Deserialize)]
pub struct PageRevision {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Listing stub for a wiki page; `url` is the slug used to fetch revisions.
#[derive(Debug, Clone, Deserialize)]
pub struct PageStub {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Assignment {
    pub id: u64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub points_possible: Option<f64>,
    pub grading_type: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub lock_at: Option<DateTime<Utc>>,
    pub unlock_at: Option<DateTime<Utc>>,
    pub submission_types: Option<Vec<String>>,
    pub html_url: Option<String>,
    pub allowed_attempts: Option<i64>,
}

/// The caller's own submission state for one assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub workflow_state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseFile {
    pub display_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
    #[serde(rename = "content-type")]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Announcement {
    pub title: Option<String>,
    pub message: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attachments: Vec<Value>,
}
