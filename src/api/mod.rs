//! Backend API client - chat, plans and workout CRUD over REST/JSON

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::edit::WorkoutStore;
use crate::workout::{Program, RawComponent};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    state: &'a Value,
}

/// Reply from the planning chat. `state` is opaque and goes back verbatim
/// with the next message.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(default)]
    pub state: Value,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub plan_data: Option<Value>,
}

#[derive(Serialize)]
struct SavePlanRequest<'a> {
    plan_data: &'a Value,
}

#[derive(Serialize)]
struct ReplaceComponentsRequest<'a> {
    components: &'a [RawComponent],
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a chat turn. An empty message with a null state starts over.
    pub async fn chat(&self, message: &str, state: &Value) -> Result<ChatReply> {
        let response = self
            .http
            .post(self.url("/chat"))
            .json(&ChatRequest { message, state })
            .send()
            .await?;
        check_json(response).await
    }

    pub async fn save_plan(&self, plan_data: &Value) -> Result<()> {
        let response = self
            .http
            .post(self.url("/save-plan"))
            .json(&SavePlanRequest { plan_data })
            .send()
            .await?;
        check(response).await
    }

    /// Latest program, or `None` when the backend has none
    pub async fn active_program(&self) -> Result<Option<Program>> {
        let response = self.http.get(self.url("/active-program")).send().await?;
        check_json(response).await
    }

    pub async fn update_workout(&self, workout_id: i64, components: &[RawComponent]) -> Result<()> {
        debug!(workout_id, components = components.len(), "PUT workout");
        let response = self
            .http
            .put(self.url(&format!("/workout/{}", workout_id)))
            .json(&ReplaceComponentsRequest { components })
            .send()
            .await?;
        check(response).await
    }

    pub async fn delete_workout(&self, workout_id: i64) -> Result<()> {
        let response = self
            .http
            .delete(self.url(&format!("/workout/{}", workout_id)))
            .send()
            .await?;
        check(response).await
    }

    pub async fn delete_program(&self, program_id: i64) -> Result<()> {
        let response = self
            .http
            .delete(self.url(&format!("/program/{}", program_id)))
            .send()
            .await?;
        check(response).await
    }
}

impl WorkoutStore for ApiClient {
    async fn replace_components(
        &self,
        workout_id: i64,
        components: &[RawComponent],
    ) -> anyhow::Result<()> {
        self.update_workout(workout_id, components).await?;
        Ok(())
    }
}

async fn check(response: reqwest::Response) -> Result<()> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(status_error(response).await)
}

async fn check_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(status_error(response).await);
    }
    let body = response.text().await?;
    decode(&body)
}

async fn status_error(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    warn!(status, "Backend returned an error");
    ApiError::Status { status, body }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}
