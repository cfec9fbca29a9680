use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Login failed with status {status}")]
    LoginFailed { status: reqwest::StatusCode },

    #[error("Image name must not be empty")]
    EmptyImageName,
}
