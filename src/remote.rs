//! Write access to the hosted backend's REST interface.
//!
//! The backend exposes tables PostgREST-style under `/rest/v1/<table>`.
//! Handlers only need two verbs: patch one row by id, and upsert rows.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::connectivity::Probe;

const MAX_ERROR_BODY: usize = 1024;

#[derive(Debug)]
pub enum RemoteError {
    Transport(reqwest::Error),
    Status { status: StatusCode, body: String },
    /// The update filter matched no row, so nothing was written.
    NoMatch { table: String, id: String },
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Transport(err) => write!(f, "Request failed: {err}"),
            RemoteError::Status { status, body } if body.is_empty() => {
                write!(f, "Server rejected the change ({status})")
            }
            RemoteError::Status { status, body } => {
                write!(f, "Server rejected the change ({status}): {body}")
            }
            RemoteError::NoMatch { table, id } => {
                write!(f, "No {table} record with id {id} exists on the server")
            }
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Transport(err)
    }
}

pub struct RemoteClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RemoteClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Patch the row whose `id` column equals `id`.
    ///
    /// The server echoes the updated rows; an empty result means the filter
    /// matched nothing and is reported as [`RemoteError::NoMatch`].
    pub async fn update(
        &self,
        table: &str,
        id: &str,
        fields: &serde_json::Value,
    ) -> Result<(), RemoteError> {
        let encoded: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
        let url = format!("{}?id=eq.{encoded}", self.table_url(table));

        let resp = self
            .client
            .patch(&url)
            .header("apikey", self.api_key.as_str())
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(fields)
            .send()
            .await?;

        let body = ensure_success(resp).await?.text().await?;
        let rows: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap_or_default();
        if rows.is_empty() {
            return Err(RemoteError::NoMatch {
                table: table.to_string(),
                id: id.to_string(),
            });
        }

        Ok(())
    }

    /// Insert rows, merging into existing rows that collide on `on_conflict`.
    pub async fn upsert(
        &self,
        table: &str,
        rows: &serde_json::Value,
        on_conflict: Option<&str>,
    ) -> Result<(), RemoteError> {
        let url = match on_conflict {
            Some(columns) => format!("{}?on_conflict={columns}", self.table_url(table)),
            None => self.table_url(table),
        };

        let resp = self
            .client
            .post(&url)
            .header("apikey", self.api_key.as_str())
            .bearer_auth(&self.api_key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows)
            .send()
            .await?;

        ensure_success(resp).await?;
        Ok(())
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }
}

#[async_trait]
impl Probe for RemoteClient {
    /// Any HTTP response means the backend is reachable; only transport
    /// failures count as offline.
    async fn is_reachable(&self) -> bool {
        self.client
            .get(format!("{}/rest/v1/", self.base_url))
            .header("apikey", self.api_key.as_str())
            .send()
            .await
            .is_ok()
    }
}

async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(MAX_ERROR_BODY)
        .collect::<String>();

    Err(RemoteError::Status { status, body })
}
