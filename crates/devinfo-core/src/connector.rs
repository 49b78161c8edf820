//! Capability seams for the Pieces OS service.
//!
//! The binders only ever talk to the service through these traits, so the HTTP
//! adapter and test doubles are interchangeable.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::SeededConnectorConnection;

pub type ConnectResult<T> = Result<T, ConnectError>;

/// Any failure reported by the connect capability.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("service unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("response is not plain data: {0}")]
    Normalize(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ConnectError {
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable {
            reason: reason.into(),
        }
    }

    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    pub fn other(reason: impl Into<String>) -> Self {
        Self::Other(reason.into())
    }
}

#[async_trait]
pub trait Connector: Send + Sync {
    /// Provider-defined response shape; must serialize to plain data.
    type Response: Serialize + Send;

    /// Short name used in log events.
    fn name(&self) -> &'static str;

    async fn connect(&self, seeded: &SeededConnectorConnection)
        -> ConnectResult<Self::Response>;
}

/// Extra read-only fetches offered by the same service.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn assets_snapshot(&self) -> ConnectResult<Value>;

    async fn activities_snapshot(&self) -> ConnectResult<Value>;
}

/// Reduces a response to nested maps, sequences and primitives.
pub fn normalize<T: Serialize + ?Sized>(response: &T) -> ConnectResult<Value> {
    Ok(serde_json::to_value(response)?)
}
