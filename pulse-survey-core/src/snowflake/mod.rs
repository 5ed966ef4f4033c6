//! Key-pair-authenticated Snowflake SQL API session.
//!
//! Speaks the SQL REST API v2: one `POST /api/v2/statements` per statement,
//! polling while the server reports the statement still running, then
//! draining every result partition so callers always receive the complete
//! result set. Exactly one session is opened per process run and it is
//! explicitly released on every exit path.
//!
//! # Security
//! Authentication is a short-lived RS256 JWT derived from the resolved key
//! pair; no password is ever transmitted and the bearer token is never
//! logged.

mod jwt;
mod query;

pub use jwt::{issue_token, issue_token_at};
pub use query::{
    EMAIL_MAPPING_TABLE, EMPLOYEE_HIERARCHY_TABLE, RECIPIENT_LIST_WEEKLY_TABLE,
    SURVEY_REPORT_TABLE, SURVEY_SENTIMENT_DETAILS_TABLE, report_query,
};

use std::time::Duration;

use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::error::{PulseSurveyError, Result};
use crate::keypair::KeyPair;
use crate::table::ResultTable;

const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";
const TOKEN_TYPE_KEYPAIR_JWT: &str = "KEYPAIR_JWT";
const STATEMENTS_PATH: &str = "/api/v2/statements";
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// An authenticated session against one Snowflake account.
///
/// Created once via [`SnowflakeSession::connect`], used for exactly one
/// report query, and consumed by [`SnowflakeSession::close`].
pub struct SnowflakeSession {
    http: Client,
    base_url: Url,
    token: String,
    role: String,
    warehouse: String,
    database: String,
}

/// Response document for statement submission, status polling, and
/// partition fetches. Fields absent from a given response default to none.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    #[serde(default)]
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Option<Vec<Vec<Option<serde_json::Value>>>>,
    #[serde(default)]
    statement_handle: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    /// True when the server answered 202 (statement still executing).
    #[serde(skip)]
    in_progress: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    row_type: Vec<ColumnType>,
    #[serde(default)]
    partition_info: Vec<PartitionInfo>,
}

#[derive(Debug, Deserialize)]
struct ColumnType {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartitionInfo {
    #[serde(default)]
    #[allow(dead_code)]
    row_count: Option<u64>,
}

/// Cells arrive as JSON strings or nulls; numbers appear when the server is
/// asked for JSON output of numeric types, so coerce anything else through
/// its JSON rendering.
fn into_rows(data: Vec<Vec<Option<serde_json::Value>>>) -> Vec<Vec<Option<String>>> {
    data.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| {
                    cell.map(|value| match value {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                })
                .collect()
        })
        .collect()
}

/// Derives the account API endpoint from the account identifier.
/// Underscores in account identifiers are hyphens in hostnames.
fn account_base_url(account: &str) -> Result<Url> {
    let host_account = account
        .split('.')
        .next()
        .unwrap_or(account)
        .to_lowercase()
        .replace('_', "-");
    let url = format!("https://{host_account}.snowflakecomputing.com");
    Url::parse(&url)
        .map_err(|e| PulseSurveyError::configuration(format!("invalid account URL {url}: {e}")))
}

impl SnowflakeSession {
    /// Opens the one session this pipeline uses.
    ///
    /// Issues a key-pair JWT and verifies it with a `SELECT 1` probe so
    /// that authentication and network failures surface here, before any
    /// report query is attempted.
    ///
    /// # Errors
    /// Returns `Connection` for any failure during setup or the probe.
    /// These failures are never retried.
    pub async fn connect(config: &Config, keypair: &KeyPair) -> Result<Self> {
        let base_url = account_base_url(&config.account)?;
        let token = jwt::issue_token(keypair, &config.account, &config.user)?;
        let http = Client::builder()
            .user_agent(concat!("pulse-survey-export/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PulseSurveyError::connection_failed("failed to build HTTP client", e))?;

        let session = Self {
            http,
            base_url,
            token,
            role: config.role.clone(),
            warehouse: config.warehouse.clone(),
            database: config.database.clone(),
        };

        debug!(account = %config.account, "authenticating session");
        session.run_statement("SELECT 1").await.map_err(|e| match e {
            PulseSurveyError::Query { context } => {
                PulseSurveyError::connection(format!("authentication probe failed: {context}"))
            }
            PulseSurveyError::Connection { .. } => e,
            other => PulseSurveyError::connection(format!("authentication probe failed: {other}")),
        })?;
        info!("Snowflake session established for {}", config);

        Ok(session)
    }

    /// Executes one statement and materializes the complete result set.
    ///
    /// Blocks (asynchronously) until the server reports the statement
    /// finished, then drains every result partition in order.
    ///
    /// # Errors
    /// Returns `Query` for any server-side failure (syntax, privilege,
    /// timeout) or transport failure mid-statement; never retried.
    pub async fn execute(&self, sql: &str) -> Result<ResultTable> {
        self.run_statement(sql).await
    }

    /// Releases the session. Key-pair JWT sessions hold no server-side
    /// state beyond token expiry, so this only marks the handle spent; it
    /// is still called on every exit path so the release is visible and
    /// ordered in logs.
    pub fn close(self) {
        debug!("Snowflake session closed");
    }

    async fn run_statement(&self, sql: &str) -> Result<ResultTable> {
        let mut response = self.submit(sql).await?;

        while response.in_progress {
            let handle = response.statement_handle.clone().ok_or_else(|| {
                PulseSurveyError::query_failed("running statement reported no handle")
            })?;
            debug!(handle = %handle, "statement still executing");
            tokio::time::sleep(POLL_INTERVAL).await;
            response = self.statement_status(&handle).await?;
        }

        let meta = response.result_set_meta_data.ok_or_else(|| {
            PulseSurveyError::query_failed("statement response carried no result set metadata")
        })?;
        let columns: Vec<String> = meta.row_type.into_iter().map(|c| c.name).collect();
        let mut table = ResultTable::new(columns, into_rows(response.data.unwrap_or_default()));

        // Partition 0 rides along with the statement response; the rest are
        // fetched individually so the caller always sees the full result.
        let partitions = meta.partition_info.len();
        if partitions > 1 {
            let handle = response.statement_handle.ok_or_else(|| {
                PulseSurveyError::query_failed("partitioned result carried no statement handle")
            })?;
            for partition in 1..partitions {
                debug!(handle = %handle, partition, "fetching result partition");
                let part = self.fetch_partition(&handle, partition).await?;
                table.extend_rows(into_rows(part.data.unwrap_or_default()));
            }
        }

        Ok(table)
    }

    async fn submit(&self, sql: &str) -> Result<StatementResponse> {
        let url = self.endpoint(STATEMENTS_PATH)?;
        let body = serde_json::json!({
            "statement": sql,
            "role": self.role,
            "warehouse": self.warehouse,
            "database": self.database,
        });
        let response = self
            .request(self.http.post(url).json(&body))
            .await
            .map_err(|e| {
                PulseSurveyError::query_failed(format!("transport failure submitting statement: {e}"))
            })?;
        Self::decode(response).await
    }

    async fn statement_status(&self, handle: &str) -> Result<StatementResponse> {
        let url = self.endpoint(&format!("{STATEMENTS_PATH}/{handle}"))?;
        let response = self.request(self.http.get(url)).await.map_err(|e| {
            PulseSurveyError::query_failed(format!("transport failure polling statement: {e}"))
        })?;
        Self::decode(response).await
    }

    async fn fetch_partition(&self, handle: &str, partition: usize) -> Result<StatementResponse> {
        let mut url = self.endpoint(&format!("{STATEMENTS_PATH}/{handle}"))?;
        url.query_pairs_mut()
            .append_pair("partition", &partition.to_string());
        let response = self.request(self.http.get(url)).await.map_err(|e| {
            PulseSurveyError::query_failed(format!(
                "transport failure fetching partition {partition}: {e}"
            ))
        })?;
        Self::decode(response).await
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| PulseSurveyError::configuration(format!("invalid endpoint {path}: {e}")))
    }

    async fn request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        builder
            .bearer_auth(&self.token)
            .header(TOKEN_TYPE_HEADER, TOKEN_TYPE_KEYPAIR_JWT)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
    }

    async fn decode(response: reqwest::Response) -> Result<StatementResponse> {
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            PulseSurveyError::query_failed(format!("failed reading response body: {e}"))
        })?;

        if status.is_success() {
            let mut parsed: StatementResponse = serde_json::from_str(&text)
                .map_err(|e| PulseSurveyError::serialization("statement response", e))?;
            parsed.in_progress = status == StatusCode::ACCEPTED;
            return Ok(parsed);
        }

        // Error payloads carry a Snowflake code and message when the request
        // reached the service; fall back to the raw body otherwise.
        let detail = serde_json::from_str::<StatementResponse>(&text).ok();
        let context = match detail {
            Some(StatementResponse {
                code: Some(code),
                message: Some(message),
                ..
            }) => format!("HTTP {status}, code {code}: {message}"),
            _ => format!("HTTP {status}: {text}"),
        };
        Err(PulseSurveyError::query_failed(context))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_account_base_url_normalization() {
        let url = account_base_url("MYORG_MYACCOUNT.us-east-1").unwrap();
        assert_eq!(url.as_str(), "https://myorg-myaccount.snowflakecomputing.com/");
    }

    #[test]
    fn test_statement_response_decodes_into_table_parts() {
        let body = r#"{
            "resultSetMetaData": {
                "numRows": 2,
                "format": "jsonv2",
                "rowType": [
                    {"name": "EMP_NAME", "type": "text"},
                    {"name": "HIER_MANAGER_NAME", "type": "text"}
                ],
                "partitionInfo": [{"rowCount": 2}]
            },
            "data": [["Ada", "Grace"], ["Linus", null]],
            "statementHandle": "01b2-0000",
            "code": "090001",
            "message": "Statement executed successfully."
        }"#;
        let parsed: StatementResponse = serde_json::from_str(body).unwrap();
        let meta = parsed.result_set_meta_data.unwrap();
        let columns: Vec<String> = meta.row_type.into_iter().map(|c| c.name).collect();
        let table = ResultTable::new(columns, into_rows(parsed.data.unwrap()));

        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, "HIER_MANAGER_NAME"), Some("Grace"));
        assert_eq!(table.value(1, "HIER_MANAGER_NAME"), None);
    }

    #[test]
    fn test_numeric_cells_coerced_to_strings() {
        let data: Vec<Vec<Option<serde_json::Value>>> = vec![vec![
            Some(serde_json::json!(42)),
            Some(serde_json::json!("text")),
            None,
        ]];
        let rows = into_rows(data);
        assert_eq!(rows[0][0].as_deref(), Some("42"));
        assert_eq!(rows[0][1].as_deref(), Some("text"));
        assert_eq!(rows[0][2], None);
    }
}
