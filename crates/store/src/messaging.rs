//! Message delivery contract and in-process sinks.
//!
//! Delivery is best-effort and at-most-once from the core's point of view: a
//! failure here is logged by the caller and never retried within CareBook.
//! Transient-delivery concerns (queueing, carrier backoff) belong to the real
//! provider behind this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use uuid::Uuid;

/// Errors returned by the messaging collaborator.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The provider did not accept the message.
    #[error("message delivery failed: {0}")]
    Delivery(String),
}

/// Receipt for an accepted message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageReceipt {
    pub id: String,
    pub recipients: usize,
    pub accepted_at: DateTime<Utc>,
}

/// The opaque message-delivery sink.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Dispatches `content` to every recipient id, returning a receipt when
    /// the provider accepts the message.
    async fn send_message(
        &self,
        content: &str,
        recipients: &[String],
    ) -> Result<MessageReceipt, NotifyError>;
}

fn receipt(recipients: &[String]) -> MessageReceipt {
    MessageReceipt {
        id: Uuid::new_v4().to_string(),
        recipients: recipients.len(),
        accepted_at: Utc::now(),
    }
}

/// Sink that logs each message instead of delivering it. Stands in for the
/// real provider in local runs.
#[derive(Clone, Debug, Default)]
pub struct LogSender;

impl LogSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MessageSender for LogSender {
    async fn send_message(
        &self,
        content: &str,
        recipients: &[String],
    ) -> Result<MessageReceipt, NotifyError> {
        tracing::info!(recipients = recipients.len(), %content, "message dispatched");
        Ok(receipt(recipients))
    }
}

/// A message captured by [`MemorySender`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub content: String,
    pub recipients: Vec<String>,
}

/// Sink that records every message it accepts. Doubles as the test fixture
/// for notification assertions.
#[derive(Default)]
pub struct MemorySender {
    sent: Mutex<Vec<SentMessage>>,
}

impl MemorySender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message accepted so far, in dispatch order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MessageSender for MemorySender {
    async fn send_message(
        &self,
        content: &str,
        recipients: &[String],
    ) -> Result<MessageReceipt, NotifyError> {
        self.sent
            .lock()
            .map_err(|_| NotifyError::Delivery("sender lock poisoned".to_owned()))?
            .push(SentMessage {
                content: content.to_owned(),
                recipients: recipients.to_vec(),
            });
        Ok(receipt(recipients))
    }
}
