//! One-shot mount binders.
//!
//! A binder value is one mount: creating it spawns the single attempt, and
//! dropping or unmounting it closes the state cell. The spawned task is the
//! only writer and checks the cell before writing, so an attempt that
//! resolves after unmount leaves nothing behind.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::connector::{normalize, ConnectResult, Connector, SnapshotSource};
use crate::{SeededConnectorConnection, TrackedApplication};

#[derive(Debug, Clone, PartialEq)]
pub enum MountState<T> {
    Pending,
    Ready(T),
    Failed,
}

impl<T> Default for MountState<T> {
    fn default() -> Self {
        Self::Pending
    }
}

impl<T> MountState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, MountState::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, MountState::Ready(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            MountState::Ready(value) => Some(value),
            MountState::Pending | MountState::Failed => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MountState::Pending => "pending",
            MountState::Ready(_) => "connected",
            MountState::Failed => "disconnected",
        }
    }

    /// Applies the attempt outcome. Only the first call on a pending state
    /// has any effect.
    fn settle(&mut self, outcome: Option<T>) -> bool {
        if !self.is_pending() {
            return false;
        }
        *self = match outcome {
            Some(value) => MountState::Ready(value),
            None => MountState::Failed,
        };
        true
    }
}

pub type ConnectionState = MountState<Value>;
pub type DeveloperState = MountState<DeveloperData>;

impl MountState<Value> {
    /// `None` until a connect attempt has succeeded.
    pub fn connection_status(&self) -> Option<&Value> {
        self.value()
    }
}

/// Descriptor sent and normalized result of a single connect call.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionAttempt {
    pub descriptor: TrackedApplication,
    pub result: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperData {
    pub connection: Value,
    pub assets: Value,
    pub activities: Value,
}

struct MountCell<T> {
    state: watch::Receiver<MountState<T>>,
    task: JoinHandle<bool>,
}

impl<T> MountCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn spawn<F>(binder: &'static str, attempt: F) -> Self
    where
        F: Future<Output = Option<T>> + Send + 'static,
    {
        let (tx, state) = watch::channel(MountState::Pending);
        let task = tokio::spawn(async move {
            let outcome = attempt.await;
            let written = tx.send_if_modified(|state| !tx.is_closed() && state.settle(outcome));
            if !written {
                debug!(event = "mount_result_dropped", binder = binder);
            }
            written
        });
        Self { state, task }
    }

    fn snapshot(&self) -> MountState<T> {
        self.state.borrow().clone()
    }

    fn is_pending(&self) -> bool {
        self.state.borrow().is_pending()
    }

    async fn changed(&mut self) {
        if self.state.changed().await.is_err() {
            // Writer is gone; nothing will ever change again.
            std::future::pending::<()>().await;
        }
    }

    async fn settled(&mut self) -> MountState<T> {
        let settled = self
            .state
            .wait_for(|state| !state.is_pending())
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }

    fn unmount(self) -> JoinHandle<bool> {
        drop(self.state);
        self.task
    }
}

/// Runs the connect capability once and normalizes the outcome.
///
/// Failures are logged and folded into an absent result; nothing is returned
/// as an error.
pub async fn connect_once<C>(
    connector: &C,
    seeded: &SeededConnectorConnection,
) -> ConnectionAttempt
where
    C: Connector + ?Sized,
{
    let outcome = connector
        .connect(seeded)
        .await
        .and_then(|response| normalize(&response));
    let result = match outcome {
        Ok(value) => {
            info!(
                event = "connect_ok",
                connector = connector.name(),
                response = %value
            );
            Some(value)
        }
        Err(err) => {
            warn!(
                event = "connect_failed",
                connector = connector.name(),
                error = %err
            );
            None
        }
    };
    ConnectionAttempt {
        descriptor: seeded.application.clone(),
        result,
    }
}

/// Connect, assets and activities fetched side by side. Any failure fails the
/// whole aggregate.
pub async fn fetch_developer_data<S>(
    source: &S,
    seeded: &SeededConnectorConnection,
) -> ConnectResult<DeveloperData>
where
    S: Connector + SnapshotSource + ?Sized,
{
    let (connection, assets, activities) = tokio::try_join!(
        async {
            source
                .connect(seeded)
                .await
                .and_then(|response| normalize(&response))
        },
        source.assets_snapshot(),
        source.activities_snapshot(),
    )?;
    Ok(DeveloperData {
        connection,
        assets,
        activities,
    })
}

/// Connection status component.
pub struct StatusBinder {
    descriptor: TrackedApplication,
    cell: MountCell<Value>,
}

impl StatusBinder {
    /// Mounts the component: spawns exactly one connect attempt.
    pub fn mount<C>(connector: Arc<C>, descriptor: TrackedApplication) -> Self
    where
        C: Connector + 'static,
    {
        let seeded = SeededConnectorConnection::new(descriptor.clone());
        let cell = MountCell::spawn("status", async move {
            connect_once(connector.as_ref(), &seeded).await.result
        });
        Self { descriptor, cell }
    }

    pub fn descriptor(&self) -> &TrackedApplication {
        &self.descriptor
    }

    pub fn state(&self) -> ConnectionState {
        self.cell.snapshot()
    }

    pub fn is_pending(&self) -> bool {
        self.cell.is_pending()
    }

    /// Resolves when the state transitions. Never resolves twice.
    pub async fn changed(&mut self) {
        self.cell.changed().await
    }

    pub async fn settled(&mut self) -> ConnectionState {
        self.cell.settled().await
    }

    /// Closes the state cell without cancelling the attempt. The returned
    /// handle yields `false` when the cell was already closed at write time;
    /// an attempt racing the unmount itself may still report `true`, but no
    /// mounted view observes that write.
    pub fn unmount(self) -> JoinHandle<bool> {
        self.cell.unmount()
    }
}

/// Developer information component.
pub struct DeveloperBinder {
    descriptor: TrackedApplication,
    cell: MountCell<DeveloperData>,
}

impl DeveloperBinder {
    pub fn mount<S>(source: Arc<S>, descriptor: TrackedApplication) -> Self
    where
        S: Connector + SnapshotSource + 'static,
    {
        let seeded = SeededConnectorConnection::new(descriptor.clone());
        let cell = MountCell::spawn("developer", async move {
            match fetch_developer_data(source.as_ref(), &seeded).await {
                Ok(data) => {
                    info!(
                        event = "developer_data_ok",
                        connector = source.name(),
                        connection = %data.connection
                    );
                    Some(data)
                }
                Err(err) => {
                    warn!(
                        event = "developer_data_failed",
                        connector = source.name(),
                        error = %err
                    );
                    None
                }
            }
        });
        Self { descriptor, cell }
    }

    pub fn descriptor(&self) -> &TrackedApplication {
        &self.descriptor
    }

    pub fn state(&self) -> DeveloperState {
        self.cell.snapshot()
    }

    pub fn is_pending(&self) -> bool {
        self.cell.is_pending()
    }

    pub async fn changed(&mut self) {
        self.cell.changed().await
    }

    pub async fn settled(&mut self) -> DeveloperState {
        self.cell.settled().await
    }

    pub fn unmount(self) -> JoinHandle<bool> {
        self.cell.unmount()
    }
}
