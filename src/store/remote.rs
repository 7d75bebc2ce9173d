//! Client-library access to a hosted libSQL database (e.g. Turso).
//!
//! Statements are sent over blocking HTTP to the database's pipeline
//! endpoint (`POST {url}/v2/pipeline`) with a bearer token. The stream
//! baton returned by the server is echoed on the next request so that all
//! statements of one client run on the same server-side stream; the stream
//! is closed when the client is dropped.

use super::{ResultSet, Store, Value};
use crate::error::ClientError;
use anyhow::Result;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RemoteClient {
    http: Client,
    pipeline_url: String,
    auth_token: String,
    baton: Option<String>,
}

impl RemoteClient {
    /// Prepare a client for `url`. No request is made until the first statement.
    ///
    /// # Arguments
    /// * `url` - Database URL (`libsql://`, `https://` or `http://`).
    /// * `auth_token` - Token sent as `Authorization: Bearer ...`.
    pub fn connect(url: &str, auth_token: &str) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            http,
            pipeline_url: pipeline_url(url),
            auth_token: auth_token.to_string(),
            baton: None,
        })
    }

    fn send(&mut self, requests: Vec<StreamRequest<'_>>) -> Result<Vec<StreamResult>, ClientError> {
        let body = PipelineRequest {
            baton: self.baton.as_deref(),
            requests,
        };

        let resp = self
            .http
            .post(&self.pipeline_url)
            .bearer_auth(&self.auth_token)
            .json(&body)
            .send()
            .map_err(|source| ClientError::Transport {
                url: self.pipeline_url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PipelineResponse = resp
            .json()
            .map_err(|err| ClientError::Malformed(err.to_string()))?;

        self.baton = parsed.baton;
        if let Some(base) = parsed.base_url {
            self.pipeline_url = pipeline_url(&base);
        }
        Ok(parsed.results)
    }
}

impl Store for RemoteClient {
    fn label(&self) -> &'static str {
        "turso"
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet> {
        let args = params.iter().map(to_wire).collect::<Result<Vec<_>, _>>()?;
        let results = self.send(vec![StreamRequest::Execute {
            stmt: Stmt {
                sql,
                args,
                want_rows: true,
            },
        }])?;

        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Malformed("empty results array".to_string()))?;
        Ok(into_result_set(first)?)
    }
}

impl Drop for RemoteClient {
    fn drop(&mut self) {
        if self.baton.is_some() {
            if let Err(err) = self.send(vec![StreamRequest::Close]) {
                log::debug!("Failed to close remote stream: {err}");
            }
        }
    }
}

/// Derive the pipeline endpoint from a database URL.
pub fn pipeline_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    let url = match url.strip_prefix("libsql://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    };
    format!("{url}/v2/pipeline")
}

// ── Wire format ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PipelineRequest<'a> {
    baton: Option<&'a str>,
    requests: Vec<StreamRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamRequest<'a> {
    Execute { stmt: Stmt<'a> },
    Close,
}

#[derive(Debug, Serialize)]
struct Stmt<'a> {
    sql: &'a str,
    args: Vec<WireValue>,
    want_rows: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireValue {
    Null,
    /// Integers travel as decimal strings to survive JSON's f64 numbers.
    Integer { value: String },
    Float { value: f64 },
    Text { value: String },
    Blob { base64: String },
}

#[derive(Debug, Deserialize)]
struct PipelineResponse {
    baton: Option<String>,
    base_url: Option<String>,
    results: Vec<StreamResult>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamResult {
    Ok { response: StreamResponse },
    Error { error: WireError },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamResponse {
    Execute { result: StmtResult },
    Close,
}

#[derive(Debug, Deserialize)]
struct StmtResult {
    #[serde(default)]
    cols: Vec<Col>,
    #[serde(default)]
    rows: Vec<Vec<WireValue>>,
    #[serde(default)]
    affected_row_count: u64,
}

#[derive(Debug, Deserialize)]
struct Col {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
    code: Option<String>,
}

fn to_wire(value: &Value) -> Result<WireValue, ClientError> {
    Ok(match value {
        Value::Null => WireValue::Null,
        Value::Integer(i) => WireValue::Integer {
            value: i.to_string(),
        },
        Value::Real(f) => WireValue::Float { value: *f },
        Value::Text(s) => WireValue::Text { value: s.clone() },
        Value::Blob(_) => return Err(ClientError::UnsupportedValue("blob")),
    })
}

fn from_wire(value: WireValue) -> Result<Value, ClientError> {
    Ok(match value {
        WireValue::Null => Value::Null,
        WireValue::Integer { value } => Value::Integer(
            value
                .parse()
                .map_err(|_| ClientError::Malformed(format!("bad integer {value:?}")))?,
        ),
        WireValue::Float { value } => Value::Real(value),
        WireValue::Text { value } => Value::Text(value),
        WireValue::Blob { .. } => return Err(ClientError::UnsupportedValue("blob")),
    })
}

fn into_result_set(result: StreamResult) -> Result<ResultSet, ClientError> {
    let result = match result {
        StreamResult::Ok {
            response: StreamResponse::Execute { result },
        } => result,
        StreamResult::Ok {
            response: StreamResponse::Close,
        } => {
            return Err(ClientError::Malformed(
                "expected execute response, got close".to_string(),
            ))
        }
        StreamResult::Error { error } => {
            return Err(ClientError::Statement {
                message: error.message,
                code: error.code,
            })
        }
    };

    let columns = result
        .cols
        .into_iter()
        .map(|c| c.name.unwrap_or_default())
        .collect();
    let rows = result
        .rows
        .into_iter()
        .map(|row| row.into_iter().map(from_wire).collect::<Result<Vec<_>, _>>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResultSet {
        columns,
        rows,
        rows_affected: result.affected_row_count,
    })
}
