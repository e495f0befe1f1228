use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;

use crate::models::message::{MessageError, QueueMessage};

/// The work queue between the ingest and summarize functions.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Publish one work item.
    async fn send(&self, message: &QueueMessage) -> Result<(), QueueError>;

    /// Acknowledge a delivery so it is not redelivered.
    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError>;
}

/// SQS-backed work queue. Redelivery and dead-lettering are configured on the
/// queue itself.
pub struct SqsQueue {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsQueue {
    pub fn new(client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }
}

#[async_trait]
impl WorkQueue for SqsQueue {
    async fn send(&self, message: &QueueMessage) -> Result<(), QueueError> {
        let body = message.to_body()?;
        let sent = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| QueueError::Sqs(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(message_id = sent.message_id().unwrap_or_default(), "Message sent");
        Ok(())
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Sqs(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("SQS error: {0}")]
    Sqs(String),

    #[error("Message encoding error: {0}")]
    Message(#[from] MessageError),
}
