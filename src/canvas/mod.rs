//! Canvas LMS access: typed records and an authenticated REST client.

mod client;
mod types;

pub use client::CanvasClient;
pub use types::{Announcement, Assignment, Course, CourseFile, PageRevision, Submission};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanvasError {
    /// The requested resource does not exist (404).
    #[error("resource not found")]
    NotFound,

    /// The token is not allowed to see the resource (401/403).
    #[error("forbidden")]
    Forbidden,

    #[error("Canvas returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Canvas request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid Canvas URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Course-data operations the tools are built on.
///
/// `CanvasClient` is the production implementation; tests substitute stubs.
#[async_trait]
pub trait CanvasApi: Send + Sync {
    /// All courses visible to the authenticated user.
    async fn list_courses(&self) -> Result<Vec<Course>, CanvasError>;

    /// Latest revisions of every page in a course.
    async fn list_pages(&self, course_id: u64) -> Result<Vec<PageRevision>, CanvasError>;

    /// All assignments in a course.
    async fn list_assignments(&self, course_id: u64) -> Result<Vec<Assignment>, CanvasError>;

    /// The authenticated user's own submission for an assignment.
    async fn get_self_submission(
        &self,
        course_id: u64,
        assignment_id: u64,
    ) -> Result<Submission, CanvasError>;

    /// All files in a course.
    async fn list_files(&self, course_id: u64) -> Result<Vec<CourseFile>, CanvasError>;

    /// Announcements posted to a course.
    async fn list_announcements(&self, course_id: u64) -> Result<Vec<Announcement>, CanvasError>;
}
