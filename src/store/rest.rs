use super::command::{Command, Reply};
use super::traits::KvStore;
use crate::config::StoreEndpoint;
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// One element of a REST response: either a result or a command error.
#[derive(Debug, Deserialize)]
struct RestReply {
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

/// Upstash-compatible REST backend.
///
/// Single commands are POSTed as a JSON argument array to the endpoint
/// root; batches go to `{url}/pipeline` as an array of argument arrays.
pub struct RestStore {
    name: String,
    url: String,
    token: String,
    client: Client,
}

pub fn build_store_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|_| Client::new())
}

impl RestStore {
    pub fn new(name: impl Into<String>, endpoint: &StoreEndpoint, timeout_secs: u64) -> Self {
        Self::with_client(name, endpoint, build_store_client(timeout_secs))
    }

    pub fn with_client(name: impl Into<String>, endpoint: &StoreEndpoint, client: Client) -> Self {
        Self {
            name: name.into(),
            url: endpoint.url.clone(),
            token: endpoint.token.clone(),
            client,
        }
    }

    async fn post(&self, url: String, body: serde_json::Value) -> Result<serde_json::Value, TransportError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|error| TransportError::Request {
                store: self.name.clone(),
                message: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                store: self.name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|error| TransportError::Request {
                store: self.name.clone(),
                message: format!("invalid response body: {error}"),
            })
    }

    fn decode(&self, command: &Command, raw: serde_json::Value) -> Result<Reply, TransportError> {
        let reply: RestReply =
            serde_json::from_value(raw).map_err(|error| TransportError::UnexpectedReply {
                command: command.to_string(),
                reply: error.to_string(),
            })?;
        if let Some(message) = reply.error {
            return Err(TransportError::Command {
                store: self.name.clone(),
                message: format!("{command}: {message}"),
            });
        }
        Ok(Reply::from_json(reply.result))
    }
}

#[async_trait]
impl KvStore for RestStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, command: Command) -> Result<Reply, TransportError> {
        let raw = self
            .post(self.url.clone(), serde_json::json!(command.to_args()))
            .await?;
        self.decode(&command, raw)
    }

    async fn pipeline(&self, commands: Vec<Command>) -> Result<Vec<Reply>, TransportError> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let body: Vec<Vec<String>> = commands.iter().map(Command::to_args).collect();
        let raw = self
            .post(format!("{}/pipeline", self.url), serde_json::json!(body))
            .await?;

        let serde_json::Value::Array(items) = raw else {
            return Err(TransportError::UnexpectedReply {
                command: "PIPELINE".into(),
                reply: raw.to_string(),
            });
        };
        if items.len() != commands.len() {
            return Err(TransportError::UnexpectedReply {
                command: "PIPELINE".into(),
                reply: format!("{} replies for {} commands", items.len(), commands.len()),
            });
        }

        commands
            .iter()
            .zip(items)
            .map(|(command, item)| self.decode(command, item))
            .collect()
    }
}
