use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The browser session became unusable: crashed, disconnected, element
    /// missing, protocol failure.
    #[error("Automation error: {0}")]
    Automation(String),

    /// A bounded automation wait elapsed.
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Malformed value for '{label}': {text:?}")]
    MalformedValue { label: String, text: String },

    #[error("Exposition error: {0}")]
    Exposition(String),
}

impl Error {
    /// Failures that a fresh browser session may cure.
    pub fn is_automation(&self) -> bool {
        matches!(self, Error::Automation(_) | Error::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
