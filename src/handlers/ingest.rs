use serde_json::{json, Value};
use strum::Display;
use tracing::{error, info, warn};

use crate::app_state::IngestState;
use crate::models::message::QueueMessage;
use crate::models::upload::{FileKind, ObjectRef};

/// Body returned to the trigger once a batch has been attempted.
pub const INGEST_ACK: &str = "Text extraction and SQS sending complete!";

/// Why an uploaded object did not produce a queue message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    JobOutput,
    ConversionFailed,
    DetectionFailed,
    NoText,
    InvalidMessage,
    EnqueueFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Enqueued,
    Skipped(SkipReason),
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub outcomes: Vec<(ObjectRef, IngestOutcome)>,
}

impl IngestReport {
    pub fn enqueued(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == IngestOutcome::Enqueued)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.enqueued()
    }
}

/// Fixed acknowledgement for the storage trigger.
pub fn acknowledgement() -> Value {
    json!({
        "statusCode": 200,
        "body": Value::String(INGEST_ACK.to_string()).to_string(),
    })
}

/// Attempt every object in order. A failure on one object is logged and never
/// stops the rest of the batch.
pub async fn ingest_batch(state: &IngestState, objects: Vec<ObjectRef>) -> IngestReport {
    let mut report = IngestReport::default();

    for object in objects {
        let outcome = ingest_object(state, &object).await;
        report.outcomes.push((object, outcome));
    }

    info!(
        enqueued = report.enqueued(),
        skipped = report.skipped(),
        "Ingest batch complete"
    );
    report
}

/// Extract text from one uploaded object and publish it as a work item.
pub async fn ingest_object(state: &IngestState, object: &ObjectRef) -> IngestOutcome {
    if object.key.starts_with(&state.output_prefix) {
        info!(key = %object.key, "Skipping detection job output");
        return IngestOutcome::Skipped(SkipReason::JobOutput);
    }

    let kind = object.kind();
    info!(bucket = %object.bucket, key = %object.key, kind = %kind, "Processing uploaded file");

    let source = match kind {
        FileKind::Pdf => match state.converter.convert_pdf(object).await {
            Ok(converted) => converted,
            Err(e) => {
                error!(key = %object.key, error = %e, "PDF conversion failed");
                return IngestOutcome::Skipped(SkipReason::ConversionFailed);
            }
        },
        FileKind::Image => object.clone(),
        FileKind::Other => {
            warn!(key = %object.key, "Unrecognized file extension, attempting detection anyway");
            object.clone()
        }
    };

    let lines = match state.detector.detect_lines(&source).await {
        Ok(lines) => lines,
        Err(e) => {
            error!(key = %source.key, error = %e, "Text detection failed");
            return IngestOutcome::Skipped(SkipReason::DetectionFailed);
        }
    };

    let text = lines.join("\n");
    if text.trim().is_empty() {
        info!(key = %object.key, "No text detected in the file");
        return IngestOutcome::Skipped(SkipReason::NoText);
    }
    info!(key = %object.key, lines = lines.len(), "Text detected");

    let message = match QueueMessage::new(text, object) {
        Ok(message) => message,
        Err(e) => {
            error!(key = %object.key, error = %e, "Could not build queue message");
            return IngestOutcome::Skipped(SkipReason::InvalidMessage);
        }
    };

    match state.queue.send(&message).await {
        Ok(()) => {
            info!(bucket = %object.bucket, key = %object.key, "Detected text queued");
            IngestOutcome::Enqueued
        }
        Err(e) => {
            error!(key = %object.key, error = %e, "Failed to queue detected text");
            IngestOutcome::Skipped(SkipReason::EnqueueFailed)
        }
    }
}
