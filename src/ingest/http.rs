use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use url::Url;

use super::{rows_from_text, RowSource};
use crate::error::IngestionError;
use crate::parser::RawRow;

/// Downloads a published spreadsheet export over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCsvSource {
    client: reqwest::Client,
    url: Url,
    cache_bust_param: String,
    timeout_secs: u64,
    delimiter: Option<char>,
}

impl HttpCsvSource {
    pub fn new(
        url: &str,
        cache_bust_param: &str,
        timeout_secs: u64,
        delimiter: Option<char>,
    ) -> Result<Self, IngestionError> {
        let url = Url::parse(url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(HttpCsvSource {
            client,
            url,
            cache_bust_param: cache_bust_param.to_string(),
            timeout_secs,
            delimiter,
        })
    }

    /// The export URL with a cache-defeating parameter appended, so the
    /// publishing side never serves a stale copy.
    pub fn request_url(&self, stamp_ms: i64) -> Url {
        let mut url = self.url.clone();
        if !self.cache_bust_param.is_empty() {
            url.query_pairs_mut()
                .append_pair(&self.cache_bust_param, &stamp_ms.to_string());
        }
        url
    }
}

#[async_trait]
impl RowSource for HttpCsvSource {
    async fn fetch_rows(&self) -> Result<Vec<RawRow>, IngestionError> {
        let url = self.request_url(Utc::now().timestamp_millis());
        tracing::debug!(%url, "Downloading export");

        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                IngestionError::Timeout(self.timeout_secs)
            } else {
                IngestionError::Http(e)
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IngestionError::Status(status.as_u16()));
        }

        let text = resp.text().await.map_err(|e| {
            if e.is_timeout() {
                IngestionError::Timeout(self.timeout_secs)
            } else {
                IngestionError::Http(e)
            }
        })?;
        rows_from_text(&text, self.delimiter, self.url.as_str())
    }
}
