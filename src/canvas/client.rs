//! Authenticated Canvas REST client.
//!
//! Collection endpoints are paginated; the client follows RFC 5988
//! `Link: rel="next"` headers internally so callers always see full lists.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK};
use serde::de::DeserializeOwned;
use url::Url;

use super::types::PageStub;
use super::{
    Announcement, Assignment, CanvasApi, CanvasError, Course, CourseFile, PageRevision, Submission,
};

const PER_PAGE: &str = "100";

pub struct CanvasClient {
    base: Url,
    token: String,
    http: reqwest::Client,
}

impl CanvasClient {
    pub fn new(base_url: &str, token: String) -> Result<Self, CanvasError> {
        let base = Url::parse(base_url)?;
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self { base, token, http })
    }

    /// GET a single resource.
    async fn get_one<T: DeserializeOwned>(&self, path: &str) -> Result<T, CanvasError> {
        let url = self.base.join(path)?;
        let response = self.http.get(url).bearer_auth(&self.token).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// GET a collection, following `rel="next"` links until exhausted.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, CanvasError> {
        let mut url = self.base.join(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("per_page", PER_PAGE);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        let mut out = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next.take() {
            tracing::debug!("GET {}", url);
            let response = self.http.get(url).bearer_auth(&self.token).send().await?;
            let response = check_status(response).await?;
            next = next_link(response.headers());
            let page: Vec<T> = response.json().await?;
            out.extend(page);
        }
        Ok(out)
    }
}

#[async_trait]
impl CanvasApi for CanvasClient {
    async fn list_courses(&self) -> Result<Vec<Course>, CanvasError> {
        self.get_paginated("/api/v1/courses", &[]).await
    }

    async fn list_pages(&self, course_id: u64) -> Result<Vec<PageRevision>, CanvasError> {
        let stubs: Vec<PageStub> = self
            .get_paginated(&format!("/api/v1/courses/{}/pages", course_id), &[])
            .await?;

        let mut out = Vec::with_capacity(stubs.len());
        for stub in stubs {
            let Some(slug) = stub.url else { continue };
            let revision: PageRevision = self
                .get_one(&format!(
                    "/api/v1/courses/{}/pages/{}/revisions/latest",
                    course_id, slug
                ))
                .await?;
            out.push(revision);
        }
        Ok(out)
    }

    async fn list_assignments(&self, course_id: u64) -> Result<Vec<Assignment>, CanvasError> {
        self.get_paginated(&format!("/api/v1/courses/{}/assignments", course_id), &[])
            .await
    }

    async fn get_self_submission(
        &self,
        course_id: u64,
        assignment_id: u64,
    ) -> Result<Submission, CanvasError> {
        self.get_one(&format!(
            "/api/v1/courses/{}/assignments/{}/submissions/self",
            course_id, assignment_id
        ))
        .await
    }

    async fn list_files(&self, course_id: u64) -> Result<Vec<CourseFile>, CanvasError> {
        self.get_paginated(&format!("/api/v1/courses/{}/files", course_id), &[])
            .await
    }

    async fn list_announcements(&self, course_id: u64) -> Result<Vec<Announcement>, CanvasError> {
        self.get_paginated(
            "/api/v1/announcements",
            &[("context_codes[]", format!("course_{}", course_id))],
        )
        .await
    }
}

/// Map non-success statuses onto the error taxonomy.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CanvasError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status.as_u16() {
        404 => Err(CanvasError::NotFound),
        401 | 403 => Err(CanvasError::Forbidden),
        code => {
            let body = response.text().await.unwrap_or_default();
            Err(CanvasError::Status { status: code, body })
        }
    }
}

/// Extract the `rel="next"` target from a Link header, if any.
fn next_link(headers: &HeaderMap) -> Option<Url> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let mut sections = part.split(';');
        let target = sections.next()?.trim();
        if !sections.any(|s| s.trim() == "rel=\"next\"") {
            return None;
        }
        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        Url::parse(target).ok()
    })
}
