use aws_lambda_events::event::sqs::SqsMessage;
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::upload::ObjectRef;

/// Work item placed on the queue by the ingest function.
///
/// `bucket` and `key` name the uploaded source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct QueueMessage {
    #[garde(length(min = 1))]
    pub text: String,

    #[garde(length(min = 1))]
    pub bucket: String,

    #[garde(length(min = 1))]
    pub key: String,
}

impl QueueMessage {
    pub fn new(text: impl Into<String>, source: &ObjectRef) -> Result<Self, MessageError> {
        let message = Self {
            text: text.into(),
            bucket: source.bucket.clone(),
            key: source.key.clone(),
        };
        message.validate()?;
        Ok(message)
    }

    pub fn to_body(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_body(body: &str) -> Result<Self, MessageError> {
        let message: Self = serde_json::from_str(body)?;
        message.validate()?;
        Ok(message)
    }
}

/// One delivery of a queue message to the summarize function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delivery {
    pub message_id: String,
    pub body: Option<String>,
    pub receipt_handle: Option<String>,
}

impl From<SqsMessage> for Delivery {
    fn from(message: SqsMessage) -> Self {
        Self {
            message_id: message.message_id.unwrap_or_default(),
            body: message.body,
            receipt_handle: message.receipt_handle,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Malformed message body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid message: {0}")]
    Invalid(#[from] garde::Report),
}
