//! Canvas course-data tools.
//!
//! Each tool maps remote records into flat dictionaries for the model. A
//! "not found" (and, where Canvas reports it, "forbidden") condition on the
//! collection comes back as the fixed `{"Error": ...}` payload the model can
//! read, never as a failure; anything else propagates and is flattened at
//! the registry boundary.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::canvas::{CanvasApi, CanvasError};

use super::Tool;

/// Register the full Canvas tool set against one API client.
pub fn register_canvas_tools(
    registry: &mut super::ToolRegistry,
    canvas: Arc<dyn CanvasApi>,
    course_filter: String,
) {
    registry.register(Arc::new(GetCourses {
        canvas: canvas.clone(),
        course_filter,
    }));
    registry.register(Arc::new(GetCoursePages {
        canvas: canvas.clone(),
    }));
    registry.register(Arc::new(GetCourseAssignments {
        canvas: canvas.clone(),
    }));
    registry.register(Arc::new(GetCourseFiles {
        canvas: canvas.clone(),
    }));
    registry.register(Arc::new(GetCourseAnnouncements { canvas }));
}

/// Fixed payload for a course with none of the requested resources.
fn unavailable(kind: &str) -> Value {
    json!({ "Error": format!("No {} available for course", kind) })
}

/// Coerce the `course_id` argument; the model sends numbers and strings.
fn course_id_arg(args: &Value) -> anyhow::Result<u64> {
    match &args["course_id"] {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| anyhow::anyhow!("'course_id' must be a positive integer")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("'course_id' must be a positive integer")),
        Value::Null => Err(anyhow::anyhow!("Missing 'course_id' argument")),
        _ => Err(anyhow::anyhow!("'course_id' must be a positive integer")),
    }
}

fn course_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "course_id": {
                "type": "integer",
                "description": "Canvas course ID"
            }
        },
        "required": ["course_id"]
    })
}

/// List courses whose name contains the configured filter substring.
pub struct GetCourses {
    canvas: Arc<dyn CanvasApi>,
    course_filter: String,
}

#[async_trait]
impl Tool for GetCourses {
    fn name(&self) -> &str {
        "get_courses"
    }

    fn description(&self) -> &str {
        "List the Canvas courses available to the user. Use when the user asks which courses exist or before any other course action."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: Value) -> anyhow::Result<Value> {
        let mut output = Vec::new();
        for course in self.canvas.list_courses().await? {
            // unpublished enrollments come back without a name; skip them
            let Some(name) = course.name else { continue };
            if name.contains(&self.course_filter) {
                output.push(json!({ "id": course.id, "name": name }));
            }
        }
        Ok(Value::Array(output))
    }
}

/// Fetch page titles and HTML bodies for a course.
pub struct GetCoursePages {
    canvas: Arc<dyn CanvasApi>,
}

#[async_trait]
impl Tool for GetCoursePages {
    fn name(&self) -> &str {
        "get_course_pages"
    }

    fn description(&self) -> &str {
        "Fetch all pages in a Canvas course and return their titles and HTML bodies. Use when the user asks for page content or a list of course pages."
    }

    fn parameters_schema(&self) -> Value {
        course_id_schema()
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let course_id = course_id_arg(&args)?;
        match self.canvas.list_pages(course_id).await {
            Ok(pages) => Ok(Value::Array(
                pages
                    .into_iter()
                    .map(|p| json!({ "title": p.title, "html": p.body }))
                    .collect(),
            )),
            Err(CanvasError::NotFound) => Ok(unavailable("pages")),
            Err(e) => Err(e.into()),
        }
    }
}

/// Fetch assignments with grading, timing, and submission metadata.
pub struct GetCourseAssignments {
    canvas: Arc<dyn CanvasApi>,
}

impl GetCourseAssignments {
    async fn fetch(&self, course_id: u64) -> Result<Vec<Value>, CanvasError> {
        let mut output = Vec::new();
        for assignment in self.canvas.list_assignments(course_id).await? {
            let submission = self
                .canvas
                .get_self_submission(course_id, assignment.id)
                .await?;
            output.push(json!({
                "name": assignment.name,
                "description": assignment.description,
                "points_possible": assignment.points_possible,
                "grading_type": assignment.grading_type,
                "due_at": assignment.due_at,
                "lock_at": assignment.lock_at,
                "unlock_at": assignment.unlock_at,
                "submission_types": assignment.submission_types,
                "html_url": assignment.html_url,
                "allowed_attempts": assignment.allowed_attempts,
                "submission_status": submission.workflow_state,
            }));
        }
        Ok(output)
    }
}

#[async_trait]
impl Tool for GetCourseAssignments {
    fn name(&self) -> &str {
        "get_course_assignments"
    }

    fn description(&self) -> &str {
        "Fetch all assignments for a Canvas course with grading, timing, and submission status. Use when the user asks about assignments, due dates, points, or whether something was submitted."
    }

    fn parameters_schema(&self) -> Value {
        course_id_schema()
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let course_id = course_id_arg(&args)?;
        match self.fetch(course_id).await {
            Ok(list) => Ok(Value::Array(list)),
            Err(CanvasError::NotFound) => Ok(unavailable("assignments")),
            Err(e) => Err(e.into()),
        }
    }
}

/// List course files with metadata and download URLs.
pub struct GetCourseFiles {
    canvas: Arc<dyn CanvasApi>,
}

#[async_trait]
impl Tool for GetCourseFiles {
    fn name(&self) -> &str {
        "get_course_files"
    }

    fn description(&self) -> &str {
        "List all files in a Canvas course with metadata and download URLs. Use when the user asks for course files, resources, or download links."
    }

    fn parameters_schema(&self) -> Value {
        course_id_schema()
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let course_id = course_id_arg(&args)?;
        match self.canvas.list_files(course_id).await {
            Ok(files) => Ok(Value::Array(
                files
                    .into_iter()
                    .map(|f| {
                        json!({
                            "name": f.display_name,
                            "created_at": f.created_at,
                            "updated_at": f.updated_at,
                            "url": f.url,
                            "content_type": f.content_type,
                        })
                    })
                    .collect(),
            )),
            // file access is often locked down per-course
            Err(CanvasError::NotFound) | Err(CanvasError::Forbidden) => {
                Ok(unavailable("files"))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Fetch course announcements with content and timestamps.
pub struct GetCourseAnnouncements {
    canvas: Arc<dyn CanvasApi>,
}

#[async_trait]
impl Tool for GetCourseAnnouncements {
    fn name(&self) -> &str {
        "get_course_announcements"
    }

    fn description(&self) -> &str {
        "Fetch announcements for a Canvas course with content and timestamps. Use when the user asks for recent announcements or instructor notices."
    }

    fn parameters_schema(&self) -> Value {
        course_id_schema()
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let course_id = course_id_arg(&args)?;
        match self.canvas.list_announcements(course_id).await {
            Ok(announcements) => Ok(Value::Array(
                announcements
                    .into_iter()
                    .map(|a| {
                        json!({
                            "title": a.title,
                            "message": a.message,
                            "posted_at": a.posted_at,
                            "attachments": a.attachments,
                        })
                    })
                    .collect(),
            )),
            Err(CanvasError::NotFound) | Err(CanvasError::Forbidden) => {
                Ok(unavailable("announcements"))
            }
            Err(e) => Err(e.into()),
        }
    }
}
