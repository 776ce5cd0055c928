#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Key error: {0}")]
    Key(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Decrypt error: {0}")]
    Decrypt(String),

    #[error("Padding error: {0}")]
    Padding(String),

    #[error("Mint error: {0}")]
    Mint(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Timeout or connection failure talking to another service.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream error: {status} {message}")]
    Upstream {
        status: u16,
        message: String,
        errors: Option<serde_json::Value>,
    },
}

impl GateError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GateError::Transport(e) if e.is_timeout())
    }
}

pub type GateResult<T> = Result<T, GateError>;
