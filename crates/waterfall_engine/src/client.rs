use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use waterfall_core::GenerationParams;

use crate::accumulator::completed_text;
use crate::credential::Credential;
use crate::{EngineConfig, FailureKind, GenerationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub params: GenerationParams,
    pub stream: bool,
}

/// What the service answered with: raw framed chunks still to be
/// accumulated, or the completed text of a non-streaming call.
pub enum GenerationResponse {
    Stream(BoxStream<'static, Result<Bytes, GenerationError>>),
    Complete(String),
}

impl std::fmt::Debug for GenerationResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationResponse::Stream(_) => f.write_str("Stream(..)"),
            GenerationResponse::Complete(text) => {
                write!(f, "Complete({} chars)", text.chars().count())
            }
        }
    }
}

#[async_trait::async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
        credential: &Credential,
    ) -> Result<GenerationResponse, GenerationError>;
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub model: String,
    pub connect_timeout: Duration,
    pub request_timeout: Option<Duration>,
}

impl From<&EngineConfig> for ClientSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            connect_timeout: config.connect_timeout,
            request_timeout: config.request_timeout,
        }
    }
}

/// Chat-completions client for the video generation service.
#[derive(Debug, Clone)]
pub struct ReqwestGenerationClient {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestGenerationClient {
    pub fn new(settings: ClientSettings) -> Result<Self, GenerationError> {
        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| GenerationError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
    video_config: VideoConfig,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct VideoConfig {
    aspect_ratio: &'static str,
    video_length: u32,
    resolution_name: &'static str,
    preset: &'static str,
}

impl From<GenerationParams> for VideoConfig {
    fn from(params: GenerationParams) -> Self {
        Self {
            aspect_ratio: params.aspect_ratio.as_str(),
            video_length: params.video_length.seconds(),
            resolution_name: params.resolution.as_str(),
            preset: params.preset.as_str(),
        }
    }
}

#[async_trait::async_trait]
impl GenerationClient for ReqwestGenerationClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
        credential: &Credential,
    ) -> Result<GenerationResponse, GenerationError> {
        let body = ChatBody {
            model: &self.settings.model,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            stream: request.stream,
            video_config: request.params.into(),
        };
        let body = serde_json::to_vec(&body)
            .map_err(|err| GenerationError::new(FailureKind::InvalidResponse, err.to_string()))?;

        let accept = if request.stream {
            "text/event-stream"
        } else {
            "application/json"
        };
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(credential.secret())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, accept)
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match text.trim() {
                "" => format!("HTTP {}", status.as_u16()),
                trimmed => trimmed.to_string(),
            };
            return Err(GenerationError::new(
                FailureKind::HttpStatus(status.as_u16()),
                message,
            ));
        }

        if request.stream {
            let stream = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(map_reqwest_error))
                .boxed();
            Ok(GenerationResponse::Stream(stream))
        } else {
            let body = response.bytes().await.map_err(map_reqwest_error)?;
            Ok(GenerationResponse::Complete(completed_text(&body)?))
        }
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        return GenerationError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return GenerationError::new(FailureKind::InvalidResponse, err.to_string());
    }
    GenerationError::new(FailureKind::Network, err.to_string())
}
