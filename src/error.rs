use thiserror::Error;

#[derive(Error, Debug)]
pub enum RumError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Token refresh failed: {0}")]
    Token(String),

    #[error("Fetch failed for monitor {monitor_id}: {message}")]
    Fetch { monitor_id: String, message: String },

    #[error("Invalid JSON from monitor {monitor_id}: {source}")]
    Decode {
        monitor_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Delivery failed after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },

    #[error("Debug artifact write failed: {0}")]
    Debug(#[from] std::io::Error),
}

impl RumError {
    pub fn fetch(monitor_id: &str, message: impl std::fmt::Display) -> Self {
        RumError::Fetch {
            monitor_id: monitor_id.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RumError>;
