//! HTTP adapter for the Pieces OS REST surface.
//!
//! Pieces OS listens on the loopback interface; this client covers the three
//! calls the panel needs: `POST /connect`, `GET /assets` and
//! `GET /activities`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use devinfo_core::{
    ConnectError, ConnectResult, Connector, SeededConnectorConnection, SnapshotSource,
};
use serde_json::Value;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:1000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiecesConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl PiecesConfig {
    pub fn parse(base_url: &str, timeout: Duration) -> ConnectResult<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout,
        })
    }
}

/// Parses a service root, keeping any path prefix joinable.
pub fn parse_base_url(raw: &str) -> ConnectResult<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|err| ConnectError::other(format!("invalid base url {raw:?}: {err}")))?;
    if url.cannot_be_a_base() {
        return Err(ConnectError::other(format!(
            "base url {raw:?} cannot carry a path"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct PiecesClient {
    config: Arc<PiecesConfig>,
    http: reqwest::Client,
}

impl PiecesClient {
    pub fn new() -> ConnectResult<Self> {
        Self::with_config(PiecesConfig::parse(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)?)
    }

    pub fn with_config(config: PiecesConfig) -> ConnectResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ConnectError::other(format!("http client: {err}")))?;
        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    fn endpoint(&self, path: &str) -> ConnectResult<Url> {
        self.config
            .base_url
            .join(path)
            .map_err(|err| ConnectError::other(format!("invalid endpoint {path}: {err}")))
    }

    async fn get_json(&self, path: &str) -> ConnectResult<Value> {
        let url = self.endpoint(path)?;
        debug!(event = "pieces_request", method = "GET", url = %url);
        let response = self.http.get(url).send().await.map_err(send_error)?;
        read_json(response).await
    }
}

fn send_error(err: reqwest::Error) -> ConnectError {
    if err.is_timeout() {
        ConnectError::unreachable(format!("request timed out: {err}"))
    } else {
        ConnectError::unreachable(err.to_string())
    }
}

async fn read_json(response: reqwest::Response) -> ConnectResult<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ConnectError::Status {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json::<Value>()
        .await
        .map_err(|err| ConnectError::invalid_response(err.to_string()))
}

#[async_trait]
impl Connector for PiecesClient {
    type Response = Value;

    fn name(&self) -> &'static str {
        "pieces-os"
    }

    async fn connect(&self, seeded: &SeededConnectorConnection) -> ConnectResult<Value> {
        let url = self.endpoint("connect")?;
        debug!(
            event = "pieces_request",
            method = "POST",
            url = %url,
            application = %seeded.application
        );
        let response = self
            .http
            .post(url)
            .json(seeded)
            .send()
            .await
            .map_err(send_error)?;
        read_json(response).await
    }
}

#[async_trait]
impl SnapshotSource for PiecesClient {
    async fn assets_snapshot(&self) -> ConnectResult<Value> {
        self.get_json("assets").await
    }

    async fn activities_snapshot(&self) -> ConnectResult<Value> {
        self.get_json("activities").await
    }
}
