//! Google Sheets v4 `values` API client.
//!
//! Reads use the API key; appends additionally send the bearer token when
//! one is configured, since Google rejects key-only writes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use sagra_core::SourceError;
use sagra_core::config::SagraConfig;
use sagra_core::row::Row;
use sagra_core::source::TabularSource;
use serde::{Deserialize, Serialize};
use url::Url;

/// Response body of `GET .../values/{range}`.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Row>,
}

#[derive(Debug, Serialize)]
struct AppendBody<'a> {
    values: &'a [Vec<String>],
}

pub struct SheetsClient {
    http: reqwest::Client,
    api_base: Url,
    spreadsheet_id: String,
    api_key: String,
    access_token: Option<String>,
}

impl SheetsClient {
    pub fn new(
        api_base: &str,
        spreadsheet_id: impl Into<String>,
        api_key: impl Into<String>,
        access_token: Option<String>,
    ) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .with_context(|| format!("Invalid Sheets API base URL: {}", api_base))?;

        Ok(SheetsClient {
            http: reqwest::Client::new(),
            api_base,
            spreadsheet_id: spreadsheet_id.into(),
            api_key: api_key.into(),
            access_token,
        })
    }

    pub fn from_config(config: &SagraConfig) -> Result<Self> {
        Self::new(
            &config.sheets_api_base,
            config.spreadsheet_id.clone(),
            config.api_key.clone(),
            config.access_token.clone(),
        )
    }

    /// `{base}/{spreadsheet}/values/{range}`
    fn values_url(&self, range: &str) -> Result<Url, SourceError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::Transport("Sheets API base URL cannot have a path".into()))?
            .pop_if_empty()
            .extend([self.spreadsheet_id.as_str(), "values", range]);

        if !self.api_key.is_empty() {
            url.query_pairs_mut().append_pair("key", &self.api_key);
        }
        Ok(url)
    }

    /// `{base}/{spreadsheet}/values/{sheet}!A:Z:append?valueInputOption=USER_ENTERED`
    fn append_url(&self, sheet: &str) -> Result<Url, SourceError> {
        let mut url = self.values_url(&format!("{}!A:Z:append", sheet))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        Ok(url)
    }
}

fn transport(e: reqwest::Error) -> SourceError {
    SourceError::Transport(e.to_string())
}

fn check_status(status: StatusCode) -> Result<(), SourceError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(SourceError::Status(status.as_u16()))
    }
}

fn parse_value_range(body: &str) -> Result<Vec<Row>, SourceError> {
    let range: ValueRange =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;
    Ok(range.values)
}

#[async_trait]
impl TabularSource for SheetsClient {
    async fn read_range(&self, range: &str) -> Result<Vec<Row>, SourceError> {
        let url = self.values_url(range)?;
        tracing::debug!(range = %range, "reading sheet range");

        let response = self.http.get(url).send().await.map_err(transport)?;
        check_status(response.status())?;

        let body = response.text().await.map_err(transport)?;
        parse_value_range(&body)
    }

    async fn append_rows(&self, sheet: &str, rows: Vec<Vec<String>>) -> Result<(), SourceError> {
        let url = self.append_url(sheet)?;
        tracing::debug!(sheet = %sheet, rows = rows.len(), "appending rows");

        let mut request = self.http.post(url).json(&AppendBody { values: &rows });
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(transport)?;
        if let Err(e) = check_status(response.status()) {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(sheet = %sheet, body = %error_text, "append rejected");
            return Err(e);
        }

        Ok(())
    }
}
