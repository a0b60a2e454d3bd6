//! Chat-completions client for the remote LLM service.
//!
//! Wire contract: `POST` with bearer auth, JSON body
//! `{model, messages: [{role, content}], max_tokens, temperature}`, answer
//! read from `choices[0].message.content`. Any transport, status or decoding
//! problem is a [`CompletionError`] tagged with an [`ErrorKind`]; there is
//! no retry.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::llm::prompts::GenerationParams;
use crate::llm::sanitize::{clean_generated_text, strip_reasoning};

/// Default request timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Auth,
    RateLimit,
    Timeout,
    MalformedResponse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Transport => "transport error",
            ErrorKind::Auth => "authentication failed",
            ErrorKind::RateLimit => "rate limited",
            ErrorKind::Timeout => "request timed out",
            ErrorKind::MalformedResponse => "malformed response",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct CompletionError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl CompletionError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// One prompt plus its sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, params: GenerationParams) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        }
    }
}

/// A text-generation backend.
///
/// Implementors only provide [`Completion::complete_raw`]; the sanitizing
/// variants are shared.
pub trait Completion: Send + Sync {
    /// Unprocessed model output.
    fn complete_raw(&self, request: &CompletionRequest) -> Result<String, CompletionError>;

    /// Model output with reasoning removed and whitespace collapsed.
    fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.complete_raw(request).map(|raw| clean_generated_text(&raw))
    }

    /// Model output with reasoning removed, line structure kept for parsers.
    fn complete_structured(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.complete_raw(request).map(|raw| strip_reasoning(&raw))
    }

    /// Fail-closed completion: errors come back as displayable text.
    fn complete_or_report(&self, request: &CompletionRequest) -> String {
        match self.complete(request) {
            Ok(text) => text,
            Err(err) => {
                log::warn!("completion outcome=error kind={:?} err={}", err.kind, err.detail);
                format!("Error querying completion API: {err}")
            }
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Blocking client for an OpenAI-compatible chat-completions endpoint.
pub struct ChatClient {
    http: reqwest::blocking::Client,
    api_url: String,
    api_key: String,
    model: String,
    /// Role instructions sent as the system message of every request
    system_prompt: Option<String>,
}

impl ChatClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::new(ErrorKind::Transport, get_error(&e)))?;

        Ok(Self {
            http,
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            system_prompt: None,
        })
    }

    /// Blank instructions are the same as none.
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt.filter(|prompt| !prompt.trim().is_empty());
        self
    }
}

impl Completion for ChatClient {
    fn complete_raw(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        log::debug!(
            "completion request model={} prompt_len={} max_tokens={} temperature={}",
            self.model,
            request.prompt.len(),
            request.max_tokens,
            request.temperature
        );

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| from_reqwest(&e))?;

        let status = response.status();
        let text = response.text().map_err(|e| from_reqwest(&e))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(CompletionError::new(
                classify_status(status),
                format!("API returned {status}: {detail}"),
            ));
        }

        let content = parse_chat_response(&text)?;
        log::debug!("completion outcome=success len={}", content.len());
        Ok(content)
    }
}

/// Extract `choices[0].message.content` from a response body.
fn parse_chat_response(body: &str) -> Result<String, CompletionError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::new(ErrorKind::MalformedResponse, e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| CompletionError::new(ErrorKind::MalformedResponse, "response has no message content"))
}

fn classify_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Auth,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimit,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorKind::Timeout,
        _ => ErrorKind::Transport,
    }
}

fn from_reqwest(error: &reqwest::Error) -> CompletionError {
    let kind = if error.is_timeout() {
        ErrorKind::Timeout
    } else if error.is_decode() {
        ErrorKind::MalformedResponse
    } else {
        ErrorKind::Transport
    };
    CompletionError::new(kind, get_error(error))
}

/// Innermost useful message of a reqwest error chain.
fn get_error(error: &reqwest::Error) -> String {
    match error.source() {
        Some(e) => match e.source() {
            Some(e) => e.to_string(),
            None => e.to_string(),
        },
        None => error.to_string(),
    }
}
