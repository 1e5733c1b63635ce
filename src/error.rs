use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Custom(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Failure to obtain a fresh row set. Aborts the current refresh cycle only;
/// the previously published dashboard stays in place.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0} while downloading the export")]
    Status(u16),

    #[error("Timed out after {0}s while downloading the export")]
    Timeout(u64),

    #[error("Could not read the export: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid source URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Could not parse the export: {0}")]
    Parse(#[from] AppError),
}

impl serde::Serialize for IngestionError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
