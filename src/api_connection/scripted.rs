//! In-memory chat client that replays a fixed script of replies.
//!
//! Lets the generator's retry loop be driven without network access: each
//! call pops the next reply and records the request it was given.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::StatusCode;

use super::connection::{ApiConnectionError, ChatCompletionClient};
use super::endpoints::{
    ChatCompletionChoice, ChatCompletionRequest, ChatCompletionResponse,
    ChatCompletionResponseMessage,
};

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// A successful call whose first choice carries this content.
    Content(String),
    /// A successful call with `null` content.
    Empty,
    /// A failed call surfacing as an API error with this status.
    Failure(StatusCode),
}

#[derive(Debug, Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// The same reply for `count` consecutive calls.
    pub fn repeating(reply: ScriptedReply, count: usize) -> Self {
        Self::new(std::iter::repeat(reply).take(count))
    }

    /// Every request received so far, in call order.
    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn temperatures(&self) -> Vec<Option<f32>> {
        lock(&self.requests).iter().map(|r| r.temperature).collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn response_with(content: Option<String>) -> ChatCompletionResponse {
    ChatCompletionResponse {
        id: "scripted".to_string(),
        model: "scripted-model".to_string(),
        choices: vec![ChatCompletionChoice {
            message: ChatCompletionResponseMessage {
                role: Some("assistant".to_string()),
                content,
            },
            finish_reason: Some("stop".to_string()),
            index: 0,
        }],
        usage: None,
    }
}

#[async_trait]
impl ChatCompletionClient for ScriptedProvider {
    async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        lock(&self.requests).push(request);
        let reply = lock(&self.replies).pop_front();

        match reply {
            Some(ScriptedReply::Content(content)) => Ok(response_with(Some(content))),
            Some(ScriptedReply::Empty) => Ok(response_with(None)),
            Some(ScriptedReply::Failure(status)) => Err(ApiConnectionError::ApiError {
                status,
                error_body: "scripted failure".to_string(),
            }),
            None => Err(ApiConnectionError::ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error_body: "script exhausted".to_string(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_connection::endpoints::ChatMessage;

    fn request(temperature: f32) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "scripted-model".to_string(),
            messages: vec![ChatMessage::user("hello")],
            response_format: None,
            temperature: Some(temperature),
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn replays_in_order_then_fails() {
        let provider = ScriptedProvider::new([
            ScriptedReply::Content("{}".to_string()),
            ScriptedReply::Empty,
        ]);

        let first = provider.call_chat_completion(request(0.1)).await.unwrap();
        assert_eq!(first.first_content(), Some("{}"));

        let second = provider.call_chat_completion(request(0.2)).await.unwrap();
        assert_eq!(second.first_content(), None);

        let third = provider.call_chat_completion(request(0.3)).await;
        assert!(matches!(third, Err(ApiConnectionError::ApiError { .. })));

        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.temperatures(), vec![Some(0.1), Some(0.2), Some(0.3)]);
    }
}
