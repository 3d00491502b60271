use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

use crate::config::ApiSettings;
use crate::models::{PostureResult, ServiceDefaults};

mod error;
mod retry;

pub use error::ApiError;
pub use retry::RetryConfig;

const PROCESS_IMAGE_PATH: &str = "/api/process-image";
const CONFIG_PATH: &str = "/api/config";

/// Multipart field carrying the frame
pub const FRAME_FIELD: &str = "file";
pub const FRAME_FILE_NAME: &str = "frame.jpg";

/// Remote posture assessment, one call per captured frame
pub trait PostureService: Send + Sync + 'static {
    fn assess(&self, jpeg: Vec<u8>)
        -> impl Future<Output = Result<PostureResult, ApiError>> + Send;
}

/// HTTP client for the pose inference service
#[derive(Clone)]
pub struct InferenceClient {
    client: Client,
    base_url: String,
    retry_config: RetryConfig,
}

impl InferenceClient {
    /// Create a new inference client
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        Self::with_retry_config(settings, RetryConfig::default())
    }

    /// Create a new inference client with custom retry configuration
    pub fn with_retry_config(settings: &ApiSettings, retry_config: RetryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            retry_config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit one JPEG frame for assessment. Not retried: the next tick
    /// brings a fresher frame anyway.
    pub async fn process_image(&self, jpeg: Vec<u8>) -> Result<PostureResult, ApiError> {
        let url = format!("{}{}", self.base_url, PROCESS_IMAGE_PATH);

        let part = Part::bytes(jpeg)
            .file_name(FRAME_FILE_NAME)
            .mime_str("image/jpeg")
            .map_err(|e| ApiError::Unknown(e.to_string()))?;
        let form = Form::new().part(FRAME_FIELD, part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        Self::parse_json(response).await
    }

    /// Fetch the service's default thresholds, retrying transient failures
    pub async fn config_defaults(&self) -> Result<ServiceDefaults, ApiError> {
        let url = format!("{}{}", self.base_url, CONFIG_PATH);

        tracing::debug!("Fetching default thresholds from {}", url);

        self.retry_config
            .execute(|| async {
                let response = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(ApiError::from_transport)?;

                Self::parse_json(response).await
            })
            .await
    }

    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, error_text));
        }

        let body = response.bytes().await.map_err(ApiError::from_transport)?;
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

impl PostureService for InferenceClient {
    fn assess(
        &self,
        jpeg: Vec<u8>,
    ) -> impl Future<Output = Result<PostureResult, ApiError>> + Send {
        self.process_image(jpeg)
    }
}
