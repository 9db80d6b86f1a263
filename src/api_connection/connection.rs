use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::endpoints::{ChatCompletionRequest, ChatCompletionResponse};
use crate::config::ProviderConfig;

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("API error {status}: {error_body}")]
    ApiError {
        status: StatusCode,
        error_body: String,
    },
}

/// A chat-completions backend the recipe generator can talk to.
///
/// Implementations hold their own credentials and connection pool; the
/// generator never reads process configuration itself.
#[async_trait]
pub trait ChatCompletionClient: Send + Sync + fmt::Debug {
    async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError>;

    /// Model to put in outgoing requests.
    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub enum Provider {
    OpenRouter { config: ProviderConfig, client: Client },
}

impl Provider {
    pub fn openrouter(config: ProviderConfig) -> Result<Self, ApiConnectionError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::OpenRouter { config, client })
    }
}

#[async_trait]
impl ChatCompletionClient for Provider {
    async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::OpenRouter { config, client } => {
                let response = client
                    .post(config.chat_completions_url())
                    .bearer_auth(&config.api_key)
                    .header("Content-Type", "application/json")
                    .header("HTTP-Referer", &config.site_url)
                    .header("X-Title", &config.app_name)
                    .json(&request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    let body = response.text().await?;
                    Ok(serde_json::from_str::<ChatCompletionResponse>(&body)?)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }

    fn model_name(&self) -> &str {
        match self {
            Provider::OpenRouter { config, .. } => &config.model,
        }
    }
}
