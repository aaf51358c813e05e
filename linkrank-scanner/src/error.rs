use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Response is not text: {0}")]
    NotText(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
