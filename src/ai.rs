use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, info};

use crate::config::AiConfig;
use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// A hosted model that answers the last user turn given the whole history.
pub trait ChatBackend {
    fn generate(&self, history: &[ChatTurn]) -> impl Future<Output = Result<String, ServiceError>>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: Role,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    message: String,
}

pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiBackend {
    /// Fails with `Unconfigured` when no API key is set.
    pub fn from_config(config: &AiConfig) -> Result<Self, ServiceError> {
        let api_key = config.api_key.clone().ok_or(ServiceError::Unconfigured)?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

impl ChatBackend for GeminiBackend {
    async fn generate(&self, history: &[ChatTurn]) -> Result<String, ServiceError> {
        let body = GenerateRequest {
            contents: history
                .iter()
                .map(|turn| Content {
                    role: turn.role,
                    parts: vec![Part { text: &turn.text }],
                })
                .collect(),
        };

        debug!("Sending {} turns to {}", history.len(), self.model);
        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&raw)
                .map(|e| e.error.message)
                .unwrap_or(raw);
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: GenerateResponse = response.json().await?;
        let text: String = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ServiceError::EmptyReply);
        }
        Ok(text)
    }
}

/// One conversation with the model. `start` opens it, `send` continues it.
pub struct ChatSession<B> {
    backend: B,
    history: Vec<ChatTurn>,
    started: bool,
}

impl<B: ChatBackend> ChatSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            history: Vec::new(),
            started: false,
        }
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Discards any previous conversation and opens a new one with `prompt`.
    pub async fn start(&mut self, prompt: &str) -> Result<String, ServiceError> {
        info!("Starting AI analysis session");
        let turns = vec![ChatTurn::user(prompt)];
        let reply = self.backend.generate(&turns).await?;

        self.history = turns;
        self.history.push(ChatTurn::model(reply.clone()));
        self.started = true;
        Ok(reply)
    }

    pub async fn send(&mut self, message: &str) -> Result<String, ServiceError> {
        if !self.started {
            return Err(ServiceError::NotStarted);
        }

        self.history.push(ChatTurn::user(message));
        match self.backend.generate(&self.history).await {
            Ok(reply) => {
                self.history.push(ChatTurn::model(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }
}
