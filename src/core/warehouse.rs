//! The seam between the collector and the warehouse service.
//!
//! [`Connector`] opens connections, [`Warehouse`] runs statements on one.
//! The Snowflake REST client implements both; tests substitute in-memory
//! doubles.

use crate::api::client::SnowflakeClient;
use crate::api::models::QueryResponseData;
use crate::error::{ConnectionError, QueryError};
use crate::storage::credentials::Credentials;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Rows of one `SHOW ...` result with column names taken from query metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ParameterTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ParameterTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// String values of one column; non-string cells are skipped
    pub fn column_strings(&self, index: usize) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.get(index))
            .filter_map(|cell| cell.as_str().map(str::to_string))
            .collect()
    }
}

/// An open connection able to run administrative statements
#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn query(&self, sql: &str) -> Result<ParameterTable, QueryError>;

    /// Release the server-side session
    async fn close(&mut self) -> Result<(), ConnectionError>;
}

/// Opens connections from credentials
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Warehouse;

    async fn connect(&self, credentials: &Credentials) -> Result<Self::Connection, ConnectionError>;
}

/// Connection settings that are not credentials
#[derive(Debug, Clone, Default)]
pub struct SnowflakeConnector {
    pub host: Option<String>,
    pub role: Option<String>,
    pub timeout_secs: u64,
}

impl SnowflakeConnector {
    pub fn new(host: Option<String>, role: Option<String>, timeout_secs: u64) -> Self {
        Self {
            host,
            role,
            timeout_secs,
        }
    }

    fn base_url(&self, account: &str) -> String {
        match &self.host {
            Some(host) if !host.is_empty() => host.clone(),
            _ => SnowflakeClient::base_url_for_account(account),
        }
    }
}

#[async_trait]
impl Connector for SnowflakeConnector {
    type Connection = SnowflakeConnection;

    async fn connect(&self, credentials: &Credentials) -> Result<SnowflakeConnection, ConnectionError> {
        let mut client = SnowflakeClient::new(self.base_url(&credentials.account), self.timeout_secs)
            .map_err(|e| ConnectionError::Failed {
                message: e.to_string(),
            })?;

        client
            .login(
                &credentials.account,
                &credentials.user,
                credentials.password(),
                self.role.as_deref(),
            )
            .await
            .map_err(|e| ConnectionError::Failed {
                message: e.to_string(),
            })?;

        Ok(SnowflakeConnection { client })
    }
}

/// A logged-in Snowflake session
#[derive(Debug)]
pub struct SnowflakeConnection {
    client: SnowflakeClient,
}

impl SnowflakeConnection {
    pub fn base_url(&self) -> &str {
        &self.client.base_url
    }
}

#[async_trait]
impl Warehouse for SnowflakeConnection {
    async fn query(&self, sql: &str) -> Result<ParameterTable, QueryError> {
        let data = self
            .client
            .execute(sql)
            .await
            .map_err(|e| QueryError::Failed {
                sql: sql.to_string(),
                message: e.to_string(),
            })?;
        to_parameter_table(sql, data)
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        self.client
            .logout()
            .await
            .map_err(|e| ConnectionError::Failed {
                message: e.to_string(),
            })
    }
}

/// Shape a JSON query result into a table, decoding cells by column type.
pub fn to_parameter_table(sql: &str, data: QueryResponseData) -> Result<ParameterTable, QueryError> {
    if !data.chunks.is_empty() {
        return Err(QueryError::UnsupportedResult {
            sql: sql.to_string(),
            reason: format!("result is split into {} chunks", data.chunks.len()),
        });
    }

    let rowset = match data.rowset {
        Some(rowset) => rowset,
        None if data.rowset_base64.as_deref().is_some_and(|b| !b.is_empty()) => {
            return Err(QueryError::UnsupportedResult {
                sql: sql.to_string(),
                reason: format!(
                    "result format '{}' is not JSON",
                    data.query_result_format.as_deref().unwrap_or("arrow")
                ),
            });
        }
        None => Vec::new(),
    };

    let columns: Vec<String> = data.rowtype.iter().map(|c| c.name.clone()).collect();
    let mut rows = Vec::with_capacity(rowset.len());
    for (index, raw_row) in rowset.into_iter().enumerate() {
        if raw_row.len() != columns.len() {
            return Err(QueryError::UnexpectedShape {
                sql: sql.to_string(),
                reason: format!(
                    "row {} has {} values for {} columns",
                    index,
                    raw_row.len(),
                    columns.len()
                ),
            });
        }
        let row = raw_row
            .into_iter()
            .zip(&data.rowtype)
            .map(|(value, column)| column.decode(value))
            .collect();
        rows.push(row);
    }

    Ok(ParameterTable::new(columns, rows))
}
