//! Warehouse backed by the Snowflake SQL API v2
//!
//! Statements are submitted to `POST /api/v2/statements` with the same key-pair
//! assertion as the agent client. A `202` response means the statement is still
//! running; its handle is polled until the result set is available. Results larger
//! than one partition are fetched partition by partition.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::credential_cache::CredentialCache;
use crate::config::SnowflakeSqlApiSettings;
use crate::domain::credential::{KEYPAIR_JWT, TOKEN_TYPE_HEADER};
use crate::domain::{QueryResult, Row, WarehousePort};
use crate::error::QueryError;

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSet {
    #[serde(default)]
    statement_handle: Option<String>,
    #[serde(default)]
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    row_type: Vec<ColumnType>,
    #[serde(default)]
    partition_info: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct ColumnType {
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    scale: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementStatus {
    #[serde(default)]
    statement_handle: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Executes statements through the Snowflake SQL REST API
pub struct SnowflakeSqlApiWarehouse {
    client: reqwest::Client,
    settings: SnowflakeSqlApiSettings,
    credentials: Arc<CredentialCache>,
}

impl SnowflakeSqlApiWarehouse {
    pub fn new(settings: &SnowflakeSqlApiSettings, credentials: Arc<CredentialCache>) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings: settings.clone(),
            credentials,
        }
    }

    fn statements_url(&self) -> String {
        format!(
            "{}/api/v2/statements",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    async fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, QueryError> {
        let credential = self.credentials.current().await?;
        Ok(builder
            .header("Authorization", credential.bearer())
            .header(TOKEN_TYPE_HEADER, KEYPAIR_JWT)
            .header("Accept", "application/json"))
    }

    async fn submit(&self, sql: &str) -> Result<reqwest::Response, QueryError> {
        let body = StatementRequest {
            statement: sql,
            timeout: self.settings.statement_timeout_seconds,
            database: self.settings.database.as_deref(),
            schema: self.settings.schema.as_deref(),
            warehouse: self.settings.warehouse.as_deref(),
            role: self.settings.role.as_deref(),
        };
        let request_id = uuid::Uuid::new_v4().to_string();

        let builder = self
            .client
            .post(self.statements_url())
            .query(&[("requestId", request_id.as_str())])
            .header("Content-Type", "application/json")
            .json(&body);

        Ok(self.authorized(builder).await?.send().await?)
    }

    async fn fetch(
        &self,
        handle: &str,
        partition: Option<usize>,
    ) -> Result<reqwest::Response, QueryError> {
        let mut builder = self
            .client
            .get(format!("{}/{}", self.statements_url(), handle));
        if let Some(partition) = partition {
            builder = builder.query(&[("partition", partition)]);
        }
        Ok(self.authorized(builder).await?.send().await?)
    }

    /// Wait for a running statement until its first result partition is available
    async fn await_result(&self, mut response: reqwest::Response) -> Result<ResultSet, QueryError> {
        let mut attempts = 0u32;

        loop {
            let status = response.status();
            if status == StatusCode::OK {
                return response
                    .json::<ResultSet>()
                    .await
                    .map_err(|e| QueryError::Execution(format!("Invalid result set: {}", e)));
            }

            if status != StatusCode::ACCEPTED {
                return Err(self.failure(response).await);
            }

            let pending: StatementStatus = response
                .json()
                .await
                .map_err(|e| QueryError::Execution(format!("Invalid statement status: {}", e)))?;
            let handle = pending.statement_handle.ok_or_else(|| {
                QueryError::Execution("Running statement has no handle".to_string())
            })?;

            attempts += 1;
            if attempts > self.settings.max_poll_attempts {
                return Err(QueryError::Execution(format!(
                    "Statement {} still running after {} polls",
                    handle, self.settings.max_poll_attempts
                )));
            }

            tracing::debug!("Statement {} still running (poll {})", handle, attempts);
            tokio::time::sleep(Duration::from_millis(self.settings.poll_interval_ms)).await;
            response = self.fetch(&handle, None).await?;
        }
    }

    async fn failure(&self, response: reqwest::Response) -> QueryError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!("SQL API rejected the assertion with {}", status);
            self.credentials.invalidate().await;
        }

        let detail = match serde_json::from_str::<StatementStatus>(&text) {
            Ok(StatementStatus {
                message: Some(message),
                code,
                ..
            }) => match code {
                Some(code) => format!("{} ({})", message, code),
                None => message,
            },
            _ => text,
        };

        QueryError::Execution(format!("SQL API returned {}: {}", status.as_u16(), detail))
    }
}

#[async_trait]
impl WarehousePort for SnowflakeSqlApiWarehouse {
    async fn run_statement(&self, sql: &str) -> Result<QueryResult, QueryError> {
        let response = self.submit(sql).await?;
        let first = self.await_result(response).await?;

        let meta = first.result_set_meta_data.unwrap_or(ResultSetMetaData {
            row_type: Vec::new(),
            partition_info: Vec::new(),
        });
        let mut data = first.data;

        if meta.partition_info.len() > 1 {
            let handle = first.statement_handle.ok_or_else(|| {
                QueryError::Execution("Partitioned result has no statement handle".to_string())
            })?;

            for partition in 1..meta.partition_info.len() {
                let response = self.fetch(&handle, Some(partition)).await?;
                if response.status() != StatusCode::OK {
                    return Err(self.failure(response).await);
                }
                let page: ResultSet = response.json().await.map_err(|e| {
                    QueryError::Execution(format!("Invalid result partition {}: {}", partition, e))
                })?;
                data.extend(page.data);
            }
        }

        let rows = data
            .into_iter()
            .map(|values| to_row(&meta.row_type, values))
            .collect::<Vec<_>>();

        tracing::debug!("SQL API statement returned {} rows", rows.len());
        Ok(QueryResult::new(rows))
    }
}

fn to_row(columns: &[ColumnType], values: Vec<Option<String>>) -> Row {
    columns
        .iter()
        .zip(values)
        .map(|(column, value)| (column.name.clone(), typed_value(column, value)))
        .collect()
}

/// The SQL API returns every value as a string; restore scalar types from the schema
fn typed_value(column: &ColumnType, value: Option<String>) -> Value {
    let Some(raw) = value else {
        return Value::Null;
    };

    match column.kind.as_str() {
        "fixed" if column.scale.unwrap_or(0) == 0 => raw
            .parse::<i64>()
            .map(|i| json!(i))
            .unwrap_or(Value::String(raw)),
        "fixed" | "real" => raw
            .parse::<f64>()
            .map(|f| json!(f))
            .unwrap_or(Value::String(raw)),
        "boolean" => match raw.to_ascii_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw),
        },
        _ => Value::String(raw),
    }
}
