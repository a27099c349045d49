//! Row store backed by a Google spreadsheet, one tab per feedback category.

use crate::error::StoreError;
use crate::normalizer::Row;
use crate::schema::{FeedbackCategory, schema_for};
use crate::store::RowStore;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Serialize)]
struct ValueRange<'a> {
    values: [&'a Row; 1],
}

#[derive(Deserialize)]
struct FetchedRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Convert a 1-based column number to its letter name (1 = A, 27 = AA)
pub fn col_to_letter(col: usize) -> String {
    let mut col = col;
    let mut result = String::new();
    while col > 0 {
        col -= 1;
        result.push(((col % 26) as u8 + b'A') as char);
        col /= 26;
    }
    result.chars().rev().collect()
}

/// A1 range covering every schema column of a category's tab
pub fn sheet_range(category: FeedbackCategory) -> String {
    let last = col_to_letter(schema_for(category).len());
    format!("'{}'!A:{}", category.sheet_title(), last)
}

/// Client for the spreadsheet values API
pub struct SheetsStore {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    access_token: String,
}

impl SheetsStore {
    pub fn new(spreadsheet_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self::with_base_url(SHEETS_API, spreadsheet_id, access_token)
    }

    /// Point the client at another API root
    pub fn with_base_url(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        SheetsStore {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            spreadsheet_id: spreadsheet_id.into(),
            access_token: access_token.into(),
        }
    }

    fn values_url(&self, category: FeedbackCategory) -> String {
        format!(
            "{}/{}/values/{}",
            self.base_url.trim_end_matches('/'),
            self.spreadsheet_id,
            urlencoding::encode(&sheet_range(category))
        )
    }
}

/// Map a non-success response status onto a store error
fn status_error(status: StatusCode, category: FeedbackCategory, body: String) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StoreError::PermissionDenied(format!("{} sheet: {status}", category.sheet_title()))
        }
        StatusCode::NOT_FOUND => StoreError::NotFound(category.sheet_title().to_string()),
        _ => StoreError::Backend(format!("{status}: {body}")),
    }
}

fn request_error(err: reqwest::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RowStore for SheetsStore {
    async fn append(&self, category: FeedbackCategory, row: Row) -> Result<(), StoreError> {
        let url = format!("{}:append", self.values_url(category));
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&ValueRange { values: [&row] })
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, category, body));
        }
        Ok(())
    }

    async fn fetch_all(&self, category: FeedbackCategory) -> Result<Vec<Row>, StoreError> {
        let response = self
            .client
            .get(self.values_url(category))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, category, body));
        }

        let range: FetchedRange = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}
