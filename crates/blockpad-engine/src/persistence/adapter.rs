//! Dispatches remote writes without blocking the editor.
//!
//! Every write runs on its own tokio task under the retry policy and drives
//! the shared save status. Results the session has to reconcile (created
//! ids, reorder outcomes) come back as [`PersistEvent`]s on an unbounded
//! channel; plain updates and deletes only affect the status.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::editing::block::BlockKey;
use crate::persistence::api::{ApiResult, BlockApi, BlockUpdate, NewBlock, OrderEntry, RemoteBlock};
use crate::persistence::error::ApiError;
use crate::persistence::retry::RetryPolicy;
use crate::persistence::status::StatusReporter;

/// Outcome of a write that the session must reconcile
#[derive(Debug, Clone, PartialEq)]
pub enum PersistEvent {
    Created { local: BlockKey, block: RemoteBlock },
    CreateFailed { local: BlockKey, error: ApiError },
    ReorderSaved { token: u64 },
    ReorderFailed { token: u64, error: ApiError },
}

pub type PersistEvents = mpsc::UnboundedReceiver<PersistEvent>;

#[derive(Clone)]
pub struct PersistenceAdapter {
    api: Arc<dyn BlockApi>,
    retry: RetryPolicy,
    status: StatusReporter,
    events: mpsc::UnboundedSender<PersistEvent>,
}

impl PersistenceAdapter {
    pub fn new(
        api: Arc<dyn BlockApi>,
        retry: RetryPolicy,
        status: StatusReporter,
    ) -> (Self, PersistEvents) {
        let (events, rx) = mpsc::unbounded_channel();
        let adapter = Self {
            api,
            retry,
            status,
            events,
        };
        (adapter, rx)
    }

    pub fn api(&self) -> &Arc<dyn BlockApi> {
        &self.api
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    pub fn create(&self, local: BlockKey, block: NewBlock) {
        let api = Arc::clone(&self.api);
        self.dispatch(
            format!("create {local}"),
            move || {
                let api = Arc::clone(&api);
                let block = block.clone();
                async move { api.create_block(block).await }
            },
            move |result| {
                Some(match result {
                    Ok(block) => PersistEvent::Created { local, block },
                    Err(error) => PersistEvent::CreateFailed { local, error },
                })
            },
        );
    }

    pub fn update(&self, id: Uuid, update: BlockUpdate) {
        let api = Arc::clone(&self.api);
        self.dispatch(
            format!("update {id}"),
            move || {
                let api = Arc::clone(&api);
                let update = update.clone();
                async move { api.update_block(id, update).await }
            },
            |_| None,
        );
    }

    pub fn delete(&self, id: Uuid) {
        let api = Arc::clone(&self.api);
        self.dispatch(
            format!("delete {id}"),
            move || {
                let api = Arc::clone(&api);
                async move { api.delete_block(id).await }
            },
            |_| None,
        );
    }

    pub fn reorder(&self, token: u64, entries: Vec<OrderEntry>) {
        let api = Arc::clone(&self.api);
        self.dispatch(
            format!("reorder #{token}"),
            move || {
                let api = Arc::clone(&api);
                let entries = entries.clone();
                async move { api.reorder_blocks(entries).await }
            },
            move |result| {
                Some(match result {
                    Ok(()) => PersistEvent::ReorderSaved { token },
                    Err(error) => PersistEvent::ReorderFailed { token, error },
                })
            },
        );
    }

    /// Best-effort synchronous write for shutdown; no retry, no status
    pub fn beacon(&self, id: Uuid, update: &BlockUpdate) -> bool {
        let queued = self.api.send_beacon(id, update);
        log::debug!("beacon for block {id} queued: {queued}");
        queued
    }

    fn dispatch<T, F, Fut, D>(&self, label: String, op: F, done: D)
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
        D: FnOnce(ApiResult<T>) -> Option<PersistEvent> + Send + 'static,
    {
        self.status.begin();
        let status = self.status.clone();
        let events = self.events.clone();
        let retry = self.retry;
        log::debug!("dispatching {label}");
        tokio::spawn(async move {
            let result = retry.run(&label, op).await;
            match &result {
                Ok(_) => status.succeeded(),
                Err(error) => status.failed(error.user_message()),
            }
            if let Some(event) = done(result)
                && events.send(event).is_err()
            {
                log::debug!("{label} finished after the editor closed");
            }
        });
    }
}
