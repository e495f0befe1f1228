use tracing::{error, info};

use crate::app_state::SummarizeState;
use crate::models::message::{Delivery, MessageError, QueueMessage};
use crate::models::summary::Summary;
use crate::services::model::{grocery_prompt, ModelError};
use crate::services::queue::QueueError;

#[derive(Debug, Default)]
pub struct SummarizeReport {
    /// Message ids summarized and deleted.
    pub processed: Vec<String>,
    /// Message ids left on the queue for redelivery.
    pub failures: Vec<String>,
}

/// Summarize every delivery in order. A failed delivery is logged, left on the
/// queue, and reported in `failures`; the rest of the batch continues.
pub async fn summarize_batch(state: &SummarizeState, deliveries: Vec<Delivery>) -> SummarizeReport {
    let mut report = SummarizeReport::default();

    for delivery in deliveries {
        match summarize_delivery(state, &delivery).await {
            Ok(_) => report.processed.push(delivery.message_id),
            Err(e) => {
                error!(message_id = %delivery.message_id, error = %e, "Failed to process message");
                report.failures.push(delivery.message_id);
            }
        }
    }

    info!(
        processed = report.processed.len(),
        failed = report.failures.len(),
        "Summarize batch complete"
    );
    report
}

/// Ask the model for a grocery list and delete the message once it answered.
pub async fn summarize_delivery(
    state: &SummarizeState,
    delivery: &Delivery,
) -> Result<Summary, SummarizeError> {
    let body = delivery.body.as_deref().ok_or(SummarizeError::MissingBody)?;
    let receipt_handle = delivery
        .receipt_handle
        .as_deref()
        .ok_or(SummarizeError::MissingReceipt)?;

    let message = QueueMessage::from_body(body)?;
    info!(
        message_id = %delivery.message_id,
        bucket = %message.bucket,
        key = %message.key,
        "Processing message"
    );

    let reply = state.model.generate(&grocery_prompt(&message.text)).await?;
    let summary = Summary::classify(&reply);

    match &summary {
        Summary::NoList => {
            info!(key = %message.key, "No grocery list found in the extracted text.");
        }
        Summary::List(list) => {
            let items = summary.items();
            info!(key = %message.key, items = items.len(), list = %list, "Grocery list extracted");
        }
    }

    state
        .queue
        .delete(receipt_handle)
        .await
        .map_err(SummarizeError::Delete)?;

    Ok(summary)
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("Queue record has no body")]
    MissingBody,

    #[error("Queue record has no receipt handle")]
    MissingReceipt,

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Failed to delete processed message: {0}")]
    Delete(QueueError),
}
