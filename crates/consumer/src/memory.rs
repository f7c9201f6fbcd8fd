use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock, mpsc};

use crate::transport::{MessageSink, MessageSource, RawMessage, Result, TransportError};

/// In-memory broker standing in for the partitioned log in tests and local
/// runs: one inbound topic (source side) and one outbound topic (sink side),
/// with committed offsets tracked so tests can assert on them.
#[derive(Clone)]
pub struct InMemoryBroker {
    topic: String,
    tx: Arc<Mutex<Option<mpsc::UnboundedSender<RawMessage>>>>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<RawMessage>>>,
    next_offset: Arc<AtomicI64>,
    committed: Arc<RwLock<Vec<i64>>>,
    published: Arc<RwLock<Vec<RawMessage>>>,
    fail_publish: Arc<AtomicBool>,
}

impl InMemoryBroker {
    pub fn new(topic: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            topic: topic.into(),
            tx: Arc::new(Mutex::new(Some(tx))),
            rx: Arc::new(Mutex::new(rx)),
            next_offset: Arc::new(AtomicI64::new(0)),
            committed: Arc::new(RwLock::new(Vec::new())),
            published: Arc::new(RwLock::new(Vec::new())),
            fail_publish: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Enqueues a message on the inbound topic and returns its offset.
    pub async fn produce(&self, payload: Vec<u8>, headers: HashMap<String, String>) -> i64 {
        let offset = self.next_offset.fetch_add(1, Ordering::SeqCst);
        let message = RawMessage {
            topic: self.topic.clone(),
            partition: 0,
            offset,
            key: Vec::new(),
            payload,
            headers,
        };
        let tx = self.tx.lock().await;
        if let Some(tx) = tx.as_ref() {
            let _ = tx.send(message);
        }
        offset
    }

    /// Offsets committed so far, in commit order.
    pub async fn committed_offsets(&self) -> Vec<i64> {
        self.committed.read().await.clone()
    }

    /// Messages written to the outbound topic so far.
    pub async fn published_messages(&self) -> Vec<RawMessage> {
        self.published.read().await.clone()
    }

    /// Makes subsequent publishes fail, for exercising the error path.
    pub fn set_fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageSource for InMemoryBroker {
    async fn fetch(&self) -> Result<RawMessage> {
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(TransportError::Closed)
    }

    async fn commit(&self, message: &RawMessage) -> Result<()> {
        self.committed.write().await.push(message.offset);
        Ok(())
    }

    async fn close(&self) {
        self.tx.lock().await.take();
    }
}

#[async_trait]
impl MessageSink for InMemoryBroker {
    async fn publish(&self, key: Vec<u8>, payload: Vec<u8>) -> Result<()> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(TransportError::Publish("injected failure".to_string()));
        }
        let mut published = self.published.write().await;
        let offset = published.len() as i64;
        published.push(RawMessage {
            topic: format!("{}-responses", self.topic),
            partition: 0,
            offset,
            key,
            payload,
            headers: HashMap::new(),
        });
        Ok(())
    }
}
