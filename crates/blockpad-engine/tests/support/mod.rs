//! Shared fixtures for session tests: a `BlockApi` that records every call
//! and can be told to fail.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use blockpad_engine::editing::{BlockContent, BlockKey, BlockKind, KeyEvent, MenuAnchor};
use blockpad_engine::persistence::{
    ApiError, ApiResult, BlockApi, BlockUpdate, InMemoryBlockApi, NewBlock, OrderEntry,
    PersistEvents, RemoteBlock,
};
use blockpad_engine::{EditorConfig, EditorSession};
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(NewBlock),
    Update(Uuid, BlockUpdate),
    Delete(Uuid),
    Reorder(Vec<OrderEntry>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Create,
    Update,
    Delete,
    Reorder,
}

impl Call {
    fn op(&self) -> Op {
        match self {
            Call::Create(_) => Op::Create,
            Call::Update(..) => Op::Update,
            Call::Delete(_) => Op::Delete,
            Call::Reorder(_) => Op::Reorder,
        }
    }
}

#[derive(Default)]
pub struct RecordingApi {
    inner: InMemoryBlockApi,
    calls: Mutex<Vec<(Instant, Call)>>,
    failures: Mutex<Vec<(Op, ApiError)>>,
    rejected_orders: Mutex<Vec<(OrderEntry, ApiError)>>,
}

impl RecordingApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every subsequent `op` call fails with `error`
    pub fn fail(&self, op: Op, error: ApiError) {
        self.failures.lock().unwrap().push((op, error));
    }

    /// Every subsequent reorder batch that contains `entry` fails with `error`
    pub fn reject_order(&self, entry: OrderEntry, error: ApiError) {
        self.rejected_orders.lock().unwrap().push((entry, error));
    }

    pub fn heal(&self) {
        self.failures.lock().unwrap().clear();
        self.rejected_orders.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn timed_calls(&self, op: Op) -> Vec<(Instant, Call)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, c)| c.op() == op)
            .cloned()
            .collect()
    }

    pub fn count(&self, op: Op) -> usize {
        self.timed_calls(op).len()
    }

    pub fn updates(&self) -> Vec<(Uuid, BlockUpdate)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Update(id, update) => Some((id, update)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub async fn stored(&self, document_id: Uuid) -> Vec<RemoteBlock> {
        self.inner.list_blocks(document_id).await.unwrap()
    }

    /// Seed a document directly, bypassing the call log
    pub async fn seed(&self, document_id: Uuid, texts: &[&str]) {
        for (order, text) in texts.iter().enumerate() {
            self.inner
                .create_block(NewBlock {
                    document_id,
                    kind: BlockKind::Paragraph,
                    content: BlockContent::Text(text.to_string()),
                    order,
                })
                .await
                .unwrap();
        }
    }

    fn record(&self, call: Call) -> ApiResult<()> {
        let op = call.op();
        self.calls.lock().unwrap().push((Instant::now(), call));
        match self.failures.lock().unwrap().iter().find(|(o, _)| *o == op) {
            Some((_, error)) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BlockApi for RecordingApi {
    async fn list_blocks(&self, document_id: Uuid) -> ApiResult<Vec<RemoteBlock>> {
        self.inner.list_blocks(document_id).await
    }

    async fn create_block(&self, block: NewBlock) -> ApiResult<RemoteBlock> {
        self.record(Call::Create(block.clone()))?;
        self.inner.create_block(block).await
    }

    async fn update_block(&self, id: Uuid, update: BlockUpdate) -> ApiResult<RemoteBlock> {
        self.record(Call::Update(id, update.clone()))?;
        self.inner.update_block(id, update).await
    }

    async fn delete_block(&self, id: Uuid) -> ApiResult<()> {
        self.record(Call::Delete(id))?;
        self.inner.delete_block(id).await
    }

    async fn reorder_blocks(&self, entries: Vec<OrderEntry>) -> ApiResult<()> {
        self.record(Call::Reorder(entries.clone()))?;
        let rejected = self
            .rejected_orders
            .lock()
            .unwrap()
            .iter()
            .find(|(entry, _)| entries.contains(entry))
            .map(|(_, error)| error.clone());
        if let Some(error) = rejected {
            return Err(error);
        }
        self.inner.reorder_blocks(entries).await
    }

    fn send_beacon(&self, id: Uuid, update: &BlockUpdate) -> bool {
        self.inner.send_beacon(id, update)
    }
}

pub async fn open(api: &Arc<RecordingApi>, document_id: Uuid) -> (EditorSession, PersistEvents) {
    let shared: Arc<dyn BlockApi> = api.clone();
    EditorSession::load(shared, document_id, &EditorConfig::default())
        .await
        .unwrap()
}

/// Pump the session for `duration` of (virtual) time
pub async fn settle(session: &mut EditorSession, events: &mut PersistEvents, duration: Duration) {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        tokio::select! {
            _ = session.tick(events) => {}
            _ = tokio::time::sleep_until(deadline) => break,
        }
    }
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

pub fn press(session: &mut EditorSession, key: BlockKey, event: KeyEvent) {
    session.handle_key(key, &event, MenuAnchor::default());
}

pub fn texts(session: &EditorSession) -> Vec<String> {
    session
        .store()
        .blocks()
        .iter()
        .map(|b| b.text().to_string())
        .collect()
}

pub async fn stored_texts(api: &RecordingApi, document_id: Uuid) -> Vec<String> {
    api.stored(document_id)
        .await
        .iter()
        .map(|b| b.content.text().unwrap_or_default().to_string())
        .collect()
}

pub fn orders(session: &EditorSession) -> Vec<usize> {
    session.store().blocks().iter().map(|b| b.order).collect()
}
