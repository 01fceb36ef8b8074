//! Google Sheets v4 REST backend.
//!
//! Tables are sheets of one spreadsheet, addressed by title. Cell ranges are
//! built with [`roster_core::a1`], so titles are always quoted.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use roster_core::a1;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::{ServiceAccountKey, TokenProvider};
use crate::error::SheetsError;
use crate::http::check_response;
use crate::store::SheetStore;

#[derive(Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: i64,
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// A spreadsheet reached through the Sheets v4 REST API.
pub struct GoogleSheets {
    http: reqwest::Client,
    api_base: String,
    spreadsheet_id: String,
    auth: TokenProvider,
}

impl GoogleSheets {
    /// Connect with a service-account key file.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError`] if the key file cannot be read or parsed, or
    /// the HTTP client cannot be built.
    pub async fn from_key_file(
        key_path: &Path,
        spreadsheet_id: &str,
        api_base: &str,
        token_uri: &str,
    ) -> Result<Self, SheetsError> {
        let key = ServiceAccountKey::from_file(key_path).await?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("roster/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        let auth = TokenProvider::new(key, token_uri, http.clone());
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            auth,
        })
    }

    fn spreadsheet_url(&self) -> String {
        format!("{}/spreadsheets/{}", self.api_base, self.spreadsheet_id)
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "{}/values/{}{suffix}",
            self.spreadsheet_url(),
            urlencoding::encode(range)
        )
    }

    async fn sheets(&self) -> Result<Vec<SheetProperties>, SheetsError> {
        let url = format!(
            "{}?fields={}",
            self.spreadsheet_url(),
            urlencoding::encode("sheets.properties(sheetId,title)")
        );
        let token = self.auth.access_token().await?;
        let resp = check_response(self.http.get(&url).bearer_auth(token).send().await?).await?;
        let data: SpreadsheetResponse = resp
            .json()
            .await
            .map_err(|e| SheetsError::Parse(format!("spreadsheet metadata: {e}")))?;
        Ok(data.sheets.into_iter().map(|s| s.properties).collect())
    }

    async fn batch_update(&self, requests: Value) -> Result<(), SheetsError> {
        let url = format!("{}:batchUpdate", self.spreadsheet_url());
        let token = self.auth.access_token().await?;
        check_response(
            self.http
                .post(&url)
                .bearer_auth(token)
                .json(&json!({ "requests": requests }))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn read_range_a1(table: &str, first_row: u32, last_row: Option<u32>) -> String {
    match last_row {
        Some(last) => format!("{}:ZZ{last}", a1::row_start(table, first_row)),
        None => a1::rows_from(table, first_row),
    }
}

#[async_trait]
impl SheetStore for GoogleSheets {
    async fn list_tables(&self) -> Result<Vec<String>, SheetsError> {
        Ok(self.sheets().await?.into_iter().map(|p| p.title).collect())
    }

    async fn create_table(&self, name: &str) -> Result<(), SheetsError> {
        self.batch_update(json!([{ "addSheet": { "properties": { "title": name } } }]))
            .await
            .map_err(|e| match e {
                SheetsError::AlreadyExists(_) => SheetsError::AlreadyExists(name.to_string()),
                other => other,
            })?;
        tracing::info!(table = name, "created sheet");
        Ok(())
    }

    async fn read_range(
        &self,
        table: &str,
        first_row: u32,
        last_row: Option<u32>,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.values_url(
            &read_range_a1(table, first_row, last_row),
            "?majorDimension=ROWS",
        );
        let token = self.auth.access_token().await?;
        let resp = check_response(self.http.get(&url).bearer_auth(token).send().await?).await?;
        let data: ValueRange = resp
            .json()
            .await
            .map_err(|e| SheetsError::Parse(format!("value range: {e}")))?;
        Ok(data
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn update_row(
        &self,
        table: &str,
        row: u32,
        values: &[String],
    ) -> Result<(), SheetsError> {
        let range = a1::row_span(table, row, values.len());
        let url = self.values_url(&range, "?valueInputOption=RAW");
        let token = self.auth.access_token().await?;
        check_response(
            self.http
                .put(&url)
                .bearer_auth(token)
                .json(&json!({ "majorDimension": "ROWS", "values": [values] }))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn append_row(
        &self,
        table: &str,
        from_row: u32,
        values: &[String],
    ) -> Result<(), SheetsError> {
        let url = self.values_url(
            &a1::row_start(table, from_row),
            ":append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
        );
        let token = self.auth.access_token().await?;
        check_response(
            self.http
                .post(&url)
                .bearer_auth(token)
                .json(&json!({ "majorDimension": "ROWS", "values": [values] }))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn freeze_rows(&self, table: &str, count: u32) -> Result<(), SheetsError> {
        let sheet_id = self
            .sheets()
            .await?
            .into_iter()
            .find(|p| p.title == table)
            .map(|p| p.sheet_id)
            .ok_or_else(|| SheetsError::NotFound(format!("sheet '{table}'")))?;
        self.batch_update(json!([{
            "updateSheetProperties": {
                "properties": {
                    "sheetId": sheet_id,
                    "gridProperties": { "frozenRowCount": count }
                },
                "fields": "gridProperties.frozenRowCount"
            }
        }]))
        .await
    }
}
