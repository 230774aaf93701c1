use std::fmt;
use std::time::Duration;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AiErrorCode {
    Timeout,
    Network,
    Http,
    Parse,
    EmptyResponse,
    MissingApiKey,
}

impl AiErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "TIMEOUT",
            Self::Network => "NETWORK_ERROR",
            Self::Http => "HTTP_ERROR",
            Self::Parse => "PARSE_ERROR",
            Self::EmptyResponse => "EMPTY_RESPONSE",
            Self::MissingApiKey => "MISSING_API_KEY",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AiError {
    Timeout { after: Duration },
    Network(String),
    Http { status: u16, body: String },
    Parse(String),
    EmptyResponse,
    MissingApiKey,
}

impl AiError {
    pub fn code(&self) -> AiErrorCode {
        match self {
            Self::Timeout { .. } => AiErrorCode::Timeout,
            Self::Network(_) => AiErrorCode::Network,
            Self::Http { .. } => AiErrorCode::Http,
            Self::Parse(_) => AiErrorCode::Parse,
            Self::EmptyResponse => AiErrorCode::EmptyResponse,
            Self::MissingApiKey => AiErrorCode::MissingApiKey,
        }
    }
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { after } => write!(f, "request timed out after {} ms", after.as_millis()),
            Self::Network(msg) => write!(f, "network failure: {msg}"),
            Self::Http { status, body } => {
                if body.is_empty() {
                    write!(f, "service answered with status {status}")
                } else {
                    write!(f, "service answered with status {status}: {body}")
                }
            }
            Self::Parse(msg) => write!(f, "could not parse model response: {msg}"),
            Self::EmptyResponse => f.write_str("model returned no text"),
            Self::MissingApiKey => f.write_str("no API key configured (set ANYPLAN_API_KEY or add one in Preferences)"),
        }
    }
}

impl std::error::Error for AiError {}
