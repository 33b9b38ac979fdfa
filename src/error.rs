use thiserror::Error;

/// Message shown when an admin-only call is rejected.
pub const ADMIN_ONLY_MESSAGE: &str = "Only admin can create users (403 from backend).";

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Backend URL is not set. Run `thermal-inspect config --set-api-url URL` or set THERMAL_API_URL")]
    MissingApiUrl,

    #[error("Not logged in. Run `thermal-inspect login` first")]
    NotAuthenticated,

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF generation error: {0}")]
    PdfGeneration(String),

    #[error("Excel generation error: {0}")]
    ExcelGeneration(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<thermal_inspect_common::Error> for InspectError {
    fn from(err: thermal_inspect_common::Error) -> Self {
        match err {
            thermal_inspect_common::Error::Validation(message) => InspectError::Validation(message),
            thermal_inspect_common::Error::Excel(message) => InspectError::ExcelGeneration(message),
        }
    }
}

impl InspectError {
    /// HTTP status, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            InspectError::Api { status, .. } => Some(*status),
            InspectError::Forbidden(_) => Some(403),
            InspectError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Client-side check failed; nothing was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, InspectError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, InspectError>;
