use thiserror::Error;

/// Main error type for Pagelink
#[derive(Error, Debug)]
pub enum PagelinkError {
    /// Resource id did not resolve (404 from the workspace API)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Named property is missing or has the wrong type for a link operation
    #[error("Property '{property}' on {page_id}: {reason}")]
    PropertyType {
        page_id: String,
        property: String,
        reason: String,
    },

    /// Non-success response from the workspace API
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Network-level failure before a response was received
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient Result type using PagelinkError
pub type Result<T> = std::result::Result<T, PagelinkError>;
