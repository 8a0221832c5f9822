use thiserror::Error;

/// Errors raised by the spreadsheet web app client
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Google Sheets not configured")]
    NotConfigured,
    #[error("Sheets HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message} ({status})")]
    Api { status: u16, message: String },
    #[error("Invalid Sheets payload: {0}")]
    InvalidPayload(String),
    #[error("Could not encode Sheets request: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Could not read sync settings: {0}")]
    Settings(String),
}

pub type SheetsResult<T> = Result<T, SheetsError>;

impl SheetsError {
    /// HTTP status associated with the failure, when there is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(error) => error.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_message_and_status() {
        let error = SheetsError::Api {
            status: 401,
            message: "Unauthorized".to_string(),
        };
        assert_eq!(error.to_string(), "Unauthorized (401)");
        assert_eq!(error.status(), Some(401));
        assert_eq!(SheetsError::NotConfigured.status(), None);
    }
}
