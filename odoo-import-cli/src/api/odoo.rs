//! JSON-RPC transport for the Odoo external API
//!
//! All calls go to `POST <url>/jsonrpc`. Authentication exchanges database,
//! login and password for a numeric user id once; every later call passes
//! `(db, uid, password)` to `object.execute_kw`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;
use serde_json::{Value, json};

use super::client::{FieldInfo, RecordClient, RecordId, RecordValues, RemoteCallError};
use super::domain::Domain;

/// Connection parameters for one run
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Base url, e.g. `http://localhost:8069`
    pub url: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

/// Authentication failure; fatal for the run
#[derive(Debug)]
pub enum AuthError {
    /// Server could not be reached or answered garbage
    Transport(String),
    /// Server answered with an RPC fault
    Fault(String),
    /// Login rejected
    Rejected { database: String, username: String },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Transport(msg) => write!(f, "could not reach server: {}", msg),
            AuthError::Fault(msg) => write!(f, "server refused authentication: {}", msg),
            AuthError::Rejected { database, username } => write!(
                f,
                "authentication failed for '{}' on database '{}', check credentials",
                username, database
            ),
        }
    }
}

impl std::error::Error for AuthError {}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcFault>,
}

#[derive(Debug, Deserialize)]
struct RpcFault {
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<RpcFaultData>,
}

#[derive(Debug, Deserialize)]
struct RpcFaultData {
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
}

impl std::fmt::Display for RpcFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.data {
            Some(data) if !data.message.is_empty() => write!(f, "{} ({})", data.message, data.name),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Authenticated client for one database
#[derive(Debug)]
pub struct OdooClient {
    http: reqwest::Client,
    endpoint: String,
    database: String,
    password: String,
    uid: i64,
    request_id: AtomicU64,
}

impl OdooClient {
    /// Authenticate and build a client bound to the returned user id
    pub async fn connect(credentials: &Credentials) -> Result<Self, AuthError> {
        let http = reqwest::Client::new();
        let endpoint = format!("{}/jsonrpc", credentials.url.trim_end_matches('/'));

        let mut client = Self {
            http,
            endpoint,
            database: credentials.database.clone(),
            password: credentials.password.clone(),
            uid: 0,
            request_id: AtomicU64::new(1),
        };

        let result = client
            .call(
                "common",
                "authenticate",
                json!([
                    credentials.database,
                    credentials.username,
                    credentials.password,
                    {}
                ]),
            )
            .await
            .map_err(|e| match e {
                CallError::Transport(msg) => AuthError::Transport(msg),
                CallError::Fault(msg) => AuthError::Fault(msg),
            })?;

        // authenticate answers `false` for bad credentials
        let uid = result.as_i64().filter(|uid| *uid > 0).ok_or_else(|| AuthError::Rejected {
            database: credentials.database.clone(),
            username: credentials.username.clone(),
        })?;

        client.uid = uid;
        info!("Connected to database '{}' as user id {}", client.database, uid);
        Ok(client)
    }

    async fn call(&self, service: &str, method: &str, args: Value) -> Result<Value, CallError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": {
                "service": service,
                "method": method,
                "args": args,
            },
            "id": id,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallError::Transport(format!("HTTP {}", status)));
        }

        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| CallError::Transport(format!("invalid JSON-RPC response: {}", e)))?;

        if let Some(fault) = parsed.error {
            return Err(CallError::Fault(fault.to_string()));
        }
        Ok(parsed.result.unwrap_or(Value::Null))
    }

    /// `object.execute_kw` on a model
    pub async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value, RemoteCallError> {
        debug!("execute_kw {}.{} args={}", model, method, args);
        self.call(
            "object",
            "execute_kw",
            json!([self.database, self.uid, self.password, model, method, args, kwargs]),
        )
        .await
        .map_err(|e| RemoteCallError::new(model, method, e.to_string()))
    }
}

#[derive(Debug)]
enum CallError {
    Transport(String),
    Fault(String),
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallError::Transport(msg) => write!(f, "transport error: {}", msg),
            CallError::Fault(msg) => write!(f, "{}", msg),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    model: &str,
    method: &str,
    value: Value,
) -> Result<T, RemoteCallError> {
    serde_json::from_value(value)
        .map_err(|e| RemoteCallError::new(model, method, format!("unexpected result: {}", e)))
}

#[async_trait]
impl RecordClient for OdooClient {
    async fn search(
        &self,
        model: &str,
        domain: &Domain,
        limit: Option<usize>,
    ) -> Result<Vec<RecordId>, RemoteCallError> {
        let kwargs = match limit {
            Some(limit) => json!({ "limit": limit }),
            None => json!({}),
        };
        let result = self
            .execute_kw(model, "search", json!([domain.to_json()]), kwargs)
            .await?;
        decode(model, "search", result)
    }

    async fn read(
        &self,
        model: &str,
        ids: &[RecordId],
        fields: &[&str],
    ) -> Result<Vec<RecordValues>, RemoteCallError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = self
            .execute_kw(model, "read", json!([ids]), json!({ "fields": fields }))
            .await?;
        decode(model, "read", result)
    }

    async fn create(&self, model: &str, values: &RecordValues) -> Result<RecordId, RemoteCallError> {
        let result = self
            .execute_kw(model, "create", json!([values]), json!({}))
            .await?;
        // newer servers answer a list of ids even for a single dict
        match result {
            Value::Array(ids) => ids
                .first()
                .and_then(|v| v.as_i64())
                .ok_or_else(|| RemoteCallError::new(model, "create", "empty id list returned")),
            other => decode(model, "create", other),
        }
    }

    async fn write(
        &self,
        model: &str,
        ids: &[RecordId],
        values: &RecordValues,
    ) -> Result<bool, RemoteCallError> {
        let result = self
            .execute_kw(model, "write", json!([ids, values]), json!({}))
            .await?;
        Ok(result.as_bool().unwrap_or(false))
    }

    async fn fields_get(&self, model: &str) -> Result<BTreeMap<String, FieldInfo>, RemoteCallError> {
        let result = self
            .execute_kw(
                model,
                "fields_get",
                json!([]),
                json!({ "attributes": ["string", "type", "readonly", "required", "relation"] }),
            )
            .await?;
        decode(model, "fields_get", result)
    }

    async fn search_count(&self, model: &str, domain: &Domain) -> Result<usize, RemoteCallError> {
        let result = self
            .execute_kw(model, "search_count", json!([domain.to_json()]), json!({}))
            .await?;
        decode(model, "search_count", result)
    }
}
