//! HTTP collaborators.
//!
//! The engine needs two things from the school's API: a join token for the
//! video room and the chapter list of a syllabus. Both are plain GETs.

use reqwest::Client;
use serde::Deserialize;

use crate::board::playlist::Chapter;
use crate::shared::config::AppConfig;
use crate::shared::error::ClassroomError;
use crate::shared::participant::RoomId;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SyllabusData {
    Chapters(Vec<Chapter>),
    Techniques {
        #[serde(default)]
        techniques: Vec<Chapter>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SyllabusResponse {
    Wrapped { data: SyllabusData },
    Bare(Vec<Chapter>),
}

impl SyllabusResponse {
    fn into_chapters(self) -> Vec<Chapter> {
        match self {
            SyllabusResponse::Bare(chapters) => chapters,
            SyllabusResponse::Wrapped {
                data: SyllabusData::Chapters(chapters),
            } => chapters,
            SyllabusResponse::Wrapped {
                data: SyllabusData::Techniques { techniques },
            } => techniques,
        }
    }
}

/// Client for the classroom's HTTP API
#[derive(Debug, Clone)]
pub struct ClassroomApi {
    base_url: String,
    bearer: Option<String>,
    client: Client,
}

impl ClassroomApi {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            base_url: config.server_url.trim_end_matches('/').to_string(),
            bearer: None,
            client: Client::new(),
        }
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(format!("{}{}", self.base_url, path));
        match &self.bearer {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn fetch<R: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<R, ClassroomError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("[Api] Network error: {}", e);
            ClassroomError::api(0, format!("Network error: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            tracing::warn!("[Api] Request failed: {} - {}", status, error_text);
            return Err(ClassroomError::api(
                status.as_u16(),
                format!("Request failed: {}", error_text),
            ));
        }

        response.json::<R>().await.map_err(|e| {
            ClassroomError::serialization(format!("Failed to parse response: {}", e))
        })
    }

    /// Join token for the room's video call.
    pub async fn fetch_video_token(&self, room_id: &RoomId) -> Result<String, ClassroomError> {
        let request = self.get("/livekit/token").query(&[("roomId", room_id.as_str())]);
        let response: TokenResponse = self.fetch(request).await?;
        tracing::debug!("[Api] Video token issued for {}", room_id);
        Ok(response.token)
    }

    /// Chapters of a course syllabus at `level`, in lesson order.
    pub async fn fetch_syllabus(
        &self,
        course_id: &str,
        level: &str,
    ) -> Result<Vec<Chapter>, ClassroomError> {
        if course_id.trim().is_empty() {
            return Err(ClassroomError::validation("course_id", "Course id cannot be empty"));
        }
        let request = self
            .get(&format!("/syllabus/course/{}", course_id))
            .query(&[("level", level)]);
        let response: SyllabusResponse = self.fetch(request).await?;
        let chapters = response.into_chapters();
        tracing::info!("[Api] Syllabus {} ({}) has {} chapters", course_id, level, chapters.len());
        Ok(chapters)
    }
}
