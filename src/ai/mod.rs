pub mod client;
pub mod error;
pub mod parse;
pub mod prompts;

use std::future::Future;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use error::AiError;
use parse::{LevelPlan, PlannedNode};
use prompts::ChildContext;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self { role, text: text.into(), at: OffsetDateTime::now_utc() }
    }
}

/// One call to the model: the fixed system prompt plus the conversation turns.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub turns: Vec<(ChatRole, String)>,
}

impl CompletionRequest {
    pub fn task(prompt: impl Into<String>) -> Self {
        Self {
            system: prompts::SYSTEM_PROMPT.to_string(),
            turns: vec![(ChatRole::User, prompt.into())],
        }
    }
}

/// Text-in, text-out access to a generative model. Implementations own the
/// transport and the timeout; callers own retries (there are none built in).
pub trait LanguageModel: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> impl Future<Output = Result<String, AiError>> + Send;
}

pub async fn request_plan<M: LanguageModel>(model: &M, topic: &str) -> Result<LevelPlan, AiError> {
    let text = model.complete(&CompletionRequest::task(prompts::plan_prompt(topic))).await?;
    parse::parse_level_plan(&text)
}

pub async fn request_children<M: LanguageModel>(model: &M, ctx: &ChildContext) -> Result<Vec<PlannedNode>, AiError> {
    let text = model.complete(&CompletionRequest::task(prompts::children_prompt(ctx))).await?;
    parse::parse_children(&text)
}

pub async fn request_chat<M: LanguageModel>(model: &M, history: &[ChatMessage]) -> Result<String, AiError> {
    let request = CompletionRequest {
        system: prompts::SYSTEM_PROMPT.to_string(),
        turns: history.iter().map(|m| (m.role, m.text.clone())).collect(),
    };
    let text = model.complete(&request).await?;
    let text = text.trim();
    if text.is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(text.to_string())
}

pub async fn request_report<M: LanguageModel>(model: &M, topic: &str, chain: &[(String, String)]) -> Result<String, AiError> {
    let text = model.complete(&CompletionRequest::task(prompts::report_prompt(topic, chain))).await?;
    let text = text.trim();
    if text.is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(text.to_string())
}
