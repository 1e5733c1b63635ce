//! Row sources: where a refresh cycle gets its spreadsheet lines from.
//!
//! `HttpCsvSource` downloads the published export; `FileCsvSource` reads a
//! local copy. Both go through the same CSV pipeline.

pub mod http;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::SourceConfig;
use crate::error::{AppError, IngestionError};
use crate::parser::{parse_csv_text, RawRow};

pub use http::HttpCsvSource;

#[async_trait]
pub trait RowSource: Send + Sync {
    /// Fetch and parse a fresh row set. Data-quality problems inside the
    /// export never fail this call; only transport and read errors do.
    async fn fetch_rows(&self) -> Result<Vec<RawRow>, IngestionError>;
}

#[async_trait]
impl<T: RowSource + ?Sized> RowSource for Box<T> {
    async fn fetch_rows(&self) -> Result<Vec<RawRow>, IngestionError> {
        (**self).fetch_rows().await
    }
}

/// Parse export text into rows, logging what the pipeline skipped.
pub(crate) fn rows_from_text(
    text: &str,
    delimiter: Option<char>,
    origin: &str,
) -> Result<Vec<RawRow>, IngestionError> {
    let delimiter = delimiter.map(delimiter_byte).transpose()?;
    let out = parse_csv_text(text, delimiter)?;

    for w in &out.warnings {
        tracing::warn!(origin, line = w.line, "Skipped malformed line: {}", w.message);
    }
    tracing::debug!(
        origin,
        rows = out.rows.len(),
        processed = out.total_rows_processed,
        skipped = out.skipped_rows,
        columns = ?out.detected_columns,
        delimiter = %(out.delimiter as char).escape_default(),
        duration_ms = out.parse_duration_ms,
        "Export parsed"
    );
    Ok(out.rows)
}

fn delimiter_byte(c: char) -> Result<u8, AppError> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| AppError::Config(format!("delimiter {c:?} is not a single ASCII character")))
}

/// Reads an export saved on disk.
#[derive(Debug, Clone)]
pub struct FileCsvSource {
    path: PathBuf,
    delimiter: Option<char>,
}

impl FileCsvSource {
    pub fn new(path: impl Into<PathBuf>, delimiter: Option<char>) -> Self {
        FileCsvSource {
            path: path.into(),
            delimiter,
        }
    }
}

#[async_trait]
impl RowSource for FileCsvSource {
    async fn fetch_rows(&self) -> Result<Vec<RawRow>, IngestionError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let text = String::from_utf8_lossy(&bytes);
        rows_from_text(&text, self.delimiter, &self.path.display().to_string())
    }
}

/// Source described by the config: a local path wins over a URL.
pub fn source_from_config(config: &SourceConfig) -> Result<Box<dyn RowSource>, AppError> {
    if let Some(path) = &config.path {
        return Ok(Box::new(FileCsvSource::new(path, config.delimiter)));
    }
    match &config.url {
        Some(url) => {
            let source = HttpCsvSource::new(
                url,
                &config.cache_bust_param,
                config.timeout_secs,
                config.delimiter,
            )
            .map_err(|e| AppError::Config(format!("source.url: {e}")))?;
            Ok(Box::new(source))
        }
        None => Err(AppError::Config(
            "either source.url or source.path must be set".into(),
        )),
    }
}
