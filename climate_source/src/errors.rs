use thiserror::Error;

/// Errors raised while decoding a fetched payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload was not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The CSV reader rejected the payload.
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A column every dataset must carry is absent from the header.
    #[error("CSV header is missing required column `{0}`")]
    MissingColumn(&'static str),

    /// The metadata document is not JSON.
    #[error("malformed metadata JSON: {0}")]
    Json(#[from] serde_json::Error),
}
