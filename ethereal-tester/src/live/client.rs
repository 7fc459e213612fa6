//! OpenAI-compatible chat-completion client for the narrative generator.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ethereal_game::NarrativeRequest;

use super::extract::extract_json;
use super::prompt::{PromptStyle, SYSTEM_PROMPT, opening_prompt, outcome_prompt};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:1234/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "local-model";

#[derive(Debug, Error)]
pub enum LiveError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("generator answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("generator reply had no choices")]
    NoChoices,
    #[error("generator reply held no JSON object")]
    NoJson,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

pub struct ChatClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    style: PromptStyle,
}

impl ChatClient {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            temperature: 0.8,
            style: PromptStyle::default(),
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: PromptStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one system + user exchange and return the reply text.
    pub async fn complete(&self, prompt: &str) -> Result<String, LiveError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
        };

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await.map_err(|source| self.http_error(source))?;
        if !response.status().is_success() {
            return Err(LiveError::Status(response.status()));
        }
        let parsed: ChatCompletionResponse =
            response.json().await.map_err(|source| self.http_error(source))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(LiveError::NoChoices)
    }

    /// Render `request` as a prompt and return the JSON object from the reply.
    pub async fn narrate(&self, request: &NarrativeRequest) -> Result<String, LiveError> {
        let prompt = match request {
            NarrativeRequest::Opening(opening) => opening_prompt(opening, &self.style),
            NarrativeRequest::Outcome(outcome) => outcome_prompt(outcome, &self.style),
        };
        log::debug!("prompt sent to {}:\n{prompt}", self.endpoint);
        let reply = self.complete(&prompt).await?;
        log::trace!("raw reply: {reply}");
        extract_json(&reply)
            .map(str::to_string)
            .ok_or(LiveError::NoJson)
    }

    fn http_error(&self, source: reqwest::Error) -> LiveError {
        LiveError::Http {
            endpoint: self.endpoint.clone(),
            source,
        }
    }
}
