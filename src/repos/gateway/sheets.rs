//! Durable store on top of the Google Sheets values API.
//!
//! Every table is a worksheet whose first row holds the column headers.
//! Data rows start at the second sheet row, so `row_index` 0 is sheet row 2.
use std::time::Duration;

use failure::Error as FailureError;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;

use config::Sheets;
use models::Row;
use repos::error::Error as RepoError;
use repos::gateway::PersistenceGateway;
use repos::types::RepoResult;

#[derive(Debug, Serialize, Deserialize, Default)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

pub struct SheetsGateway {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    access_token: Option<String>,
}

impl SheetsGateway {
    pub fn new(config: &Sheets) -> Result<Self, FailureError> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_s)).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            access_token: config.access_token.clone(),
        })
    }

    /// `<base>/<spreadsheet>/values/<range><suffix>`, path segments escaped
    fn values_url(&self, range: &str, suffix: &str) -> RepoResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| RepoError::Connection(format!("Invalid sheets url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| RepoError::Connection(format!("Sheets url {} can not be a base", self.base_url)))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.access_token {
            Some(ref token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder) -> RepoResult<ValueRange> {
        let mut response = self.authorized(request).send().map_err(RepoError::from)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RepoError::Connection(format!("Sheets api responded with {}: {}", status, body)).into());
        }
        let range = response.json::<ValueRange>().map_err(RepoError::from)?;
        Ok(range)
    }

    fn get_range(&self, range: &str) -> RepoResult<Vec<Vec<String>>> {
        let url = self.values_url(range, "")?;
        let range = self.send(self.client.get(url))?;
        Ok(range.values.into_iter().map(|row| row.into_iter().map(cell_text).collect()).collect())
    }

    fn put_range(&self, range: &str, values: Vec<String>) -> RepoResult<()> {
        let mut url = self.values_url(range, "")?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = ValueRange {
            values: vec![values.into_iter().map(Value::String).collect()],
        };
        self.send(self.client.put(url).json(&body)).map(|_| ())
    }

    fn headers(&self, table: &str) -> RepoResult<Vec<String>> {
        let mut rows = self.get_range(&format!("{}!1:1", table))?;
        Ok(if rows.is_empty() { vec![] } else { rows.remove(0) })
    }

    /// Header row of the table, extended with the columns of `row` it does not know yet.
    fn headers_for(&self, table: &str, row: &Row) -> RepoResult<Vec<String>> {
        let mut headers = self.headers(table)?;
        let known = headers.len();
        for column in row.keys() {
            if !headers.contains(column) {
                headers.push(column.clone());
            }
        }
        if headers.len() != known {
            debug!("Writing header row of table {}: {:?}.", table, headers);
            self.put_range(&format!("{}!A1", table), headers.clone())?;
        }
        Ok(headers)
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Zips the header row with the data rows. Short rows get empty cells.
pub fn rows_from_values(mut values: Vec<Vec<String>>) -> Vec<Row> {
    if values.is_empty() {
        return vec![];
    }
    let headers = values.remove(0);
    values
        .into_iter()
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| (header.clone(), cells.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

/// Cells of `row` in header order
pub fn values_in_order(headers: &[String], row: &Row) -> Vec<String> {
    headers.iter().map(|header| row.get(header).cloned().unwrap_or_default()).collect()
}

impl PersistenceGateway for SheetsGateway {
    fn read_all(&self, table: &str) -> RepoResult<Vec<Row>> {
        debug!("Read all rows of sheet {}.", table);
        self.get_range(table)
            .map(rows_from_values)
            .map_err(|e: FailureError| e.context(format!("Read all rows of sheet {} error occurred", table)).into())
    }

    fn append(&self, table: &str, row: Row) -> RepoResult<()> {
        debug!("Append row {:?} to sheet {}.", row, table);
        self.headers_for(table, &row)
            .and_then(|headers| {
                let mut url = self.values_url(&format!("{}!A1", table), ":append")?;
                url.query_pairs_mut()
                    .append_pair("valueInputOption", "RAW")
                    .append_pair("insertDataOption", "INSERT_ROWS");
                let body = ValueRange {
                    values: vec![values_in_order(&headers, &row).into_iter().map(Value::String).collect()],
                };
                self.send(self.client.post(url).json(&body)).map(|_| ())
            })
            .map_err(|e: FailureError| e.context(format!("Append row to sheet {} error occurred", table)).into())
    }

    fn update(&self, table: &str, row_index: usize, row: Row) -> RepoResult<()> {
        debug!("Update row {} of sheet {} with {:?}.", row_index, table, row);
        self.headers_for(table, &row)
            .and_then(|headers| self.put_range(&format!("{}!A{}", table, row_index + 2), values_in_order(&headers, &row)))
            .map_err(|e: FailureError| e.context(format!("Update row {} of sheet {} error occurred", row_index, table)).into())
    }
}
