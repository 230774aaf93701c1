use std::fmt;

use time::OffsetDateTime;

use crate::ai::error::{AiError, AiErrorCode};
use crate::mindmap::model::NodeId;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    Generation,
    Network,
    Storage,
    Validation,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generation => "generation",
            Self::Network => "network",
            Self::Storage => "storage",
            Self::Validation => "validation",
        }
    }
}

// Timeouts and transport failures look the same to the user
pub const NETWORK_FAILURE_TEXT: &str = "Could not reach the AI service. Please try again.";

/// The store's single "current error" slot.
#[derive(Clone, Debug, PartialEq)]
pub struct AppError {
    pub category: ErrorCategory,
    pub message: String,
    pub node_id: Option<NodeId>,
    // Internal code; never shown in place of the message
    pub code: Option<&'static str>,
    pub timestamp: OffsetDateTime,
}

impl AppError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            node_id: None,
            code: None,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Validation, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Storage, message)
    }

    pub fn with_node(mut self, id: NodeId) -> Self {
        self.node_id = Some(id);
        self
    }

    pub fn from_ai(err: &AiError, node_id: Option<NodeId>) -> Self {
        let code = err.code();
        let (category, message) = match code {
            AiErrorCode::Timeout | AiErrorCode::Network => (ErrorCategory::Network, NETWORK_FAILURE_TEXT.to_string()),
            AiErrorCode::MissingApiKey => (ErrorCategory::Validation, err.to_string()),
            AiErrorCode::Http | AiErrorCode::Parse | AiErrorCode::EmptyResponse => {
                (ErrorCategory::Generation, format!("Generation failed: {}", err))
            }
        };
        Self {
            category,
            message,
            node_id,
            code: Some(code.as_str()),
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}
