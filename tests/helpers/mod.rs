//! In-memory stand-ins for the pipeline's cloud collaborators.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use grocery_assistant::app_state::{IngestState, SummarizeState};
use grocery_assistant::models::message::QueueMessage;
use grocery_assistant::models::upload::ObjectRef;
use grocery_assistant::services::model::{ModelError, TextModel};
use grocery_assistant::services::ocr::{
    ConversionError, DocumentConverter, OcrError, TextDetector,
};
use grocery_assistant::services::queue::{QueueError, WorkQueue};

/// Ordered record of collaborator calls, shared across fakes.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Detector answering from a table of key → lines; unknown keys fail.
pub struct FakeDetector {
    pub results: HashMap<String, Result<Vec<String>, String>>,
    pub log: CallLog,
}

impl FakeDetector {
    pub fn new(log: CallLog) -> Self {
        Self {
            results: HashMap::new(),
            log,
        }
    }

    pub fn with_lines(mut self, key: &str, lines: &[&str]) -> Self {
        self.results.insert(
            key.to_string(),
            Ok(lines.iter().map(|l| l.to_string()).collect()),
        );
        self
    }

    pub fn with_error(mut self, key: &str, message: &str) -> Self {
        self.results.insert(key.to_string(), Err(message.to_string()));
        self
    }
}

#[async_trait]
impl TextDetector for FakeDetector {
    async fn detect_lines(&self, object: &ObjectRef) -> Result<Vec<String>, OcrError> {
        self.log.lock().unwrap().push(format!("detect:{}", object.key));
        match self.results.get(&object.key) {
            Some(Ok(lines)) => Ok(lines.clone()),
            Some(Err(message)) => Err(OcrError::Textract(message.clone())),
            None => Err(OcrError::Textract(format!("no such object {}", object.key))),
        }
    }
}

/// What the fake converter does with a given PDF key.
pub enum Conversion {
    To(String),
    Fail,
    TimeOut,
}

pub struct FakeConverter {
    pub outcomes: HashMap<String, Conversion>,
    pub log: CallLog,
}

impl FakeConverter {
    pub fn new(log: CallLog) -> Self {
        Self {
            outcomes: HashMap::new(),
            log,
        }
    }

    pub fn with(mut self, key: &str, outcome: Conversion) -> Self {
        self.outcomes.insert(key.to_string(), outcome);
        self
    }
}

#[async_trait]
impl DocumentConverter for FakeConverter {
    async fn convert_pdf(&self, object: &ObjectRef) -> Result<ObjectRef, ConversionError> {
        self.log.lock().unwrap().push(format!("convert:{}", object.key));
        match self.outcomes.get(&object.key) {
            Some(Conversion::To(key)) => Ok(ObjectRef::new(object.bucket.clone(), key.clone())),
            Some(Conversion::Fail) => Err(ConversionError::Failed {
                job_id: "job-1".to_string(),
                reason: "unsupported document".to_string(),
            }),
            Some(Conversion::TimeOut) | None => Err(ConversionError::TimedOut {
                job_id: "job-1".to_string(),
                attempts: 5,
            }),
        }
    }
}

/// Queue keeping sent messages and deleted receipt handles in memory.
pub struct FakeQueue {
    pub sent: Mutex<Vec<QueueMessage>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_send_for: Option<String>,
    pub fail_delete_for: Option<String>,
    pub log: CallLog,
}

impl FakeQueue {
    pub fn new(log: CallLog) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            fail_send_for: None,
            fail_delete_for: None,
            log,
        }
    }

    pub fn sent(&self) -> Vec<QueueMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkQueue for FakeQueue {
    async fn send(&self, message: &QueueMessage) -> Result<(), QueueError> {
        self.log.lock().unwrap().push(format!("send:{}", message.key));
        if self.fail_send_for.as_deref() == Some(message.key.as_str()) {
            return Err(QueueError::Sqs("queue unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.log.lock().unwrap().push(format!("delete:{receipt_handle}"));
        if self.fail_delete_for.as_deref() == Some(receipt_handle) {
            return Err(QueueError::Sqs("receipt handle expired".to_string()));
        }
        self.deleted.lock().unwrap().push(receipt_handle.to_string());
        Ok(())
    }
}

/// Model that answers with the sentinel when the text mentions no items,
/// fails when the text contains `FAIL`, and otherwise lists each line.
pub struct FakeModel {
    pub prompts: Mutex<Vec<String>>,
    pub log: CallLog,
}

impl FakeModel {
    pub fn new(log: CallLog) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            log,
        }
    }
}

#[async_trait]
impl TextModel for FakeModel {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.log.lock().unwrap().push("generate".to_string());
        self.prompts.lock().unwrap().push(prompt.to_string());

        let text = prompt
            .rsplit_once("Here is the text:\n")
            .map(|(_, text)| text)
            .unwrap_or_default();

        if text.contains("FAIL") {
            return Err(ModelError::Invoke("ThrottlingException".to_string()));
        }
        if text.contains("no relevant items") {
            return Ok("No grocery list found.".to_string());
        }
        Ok(text
            .lines()
            .map(|line| format!("- {line}, kg, count"))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

pub fn ingest_state(
    detector: FakeDetector,
    converter: FakeConverter,
    queue: Arc<FakeQueue>,
) -> IngestState {
    IngestState::new(Arc::new(detector), Arc::new(converter), queue, "converted/")
}

pub fn summarize_state(model: Arc<FakeModel>, queue: Arc<FakeQueue>) -> SummarizeState {
    SummarizeState::new(model, queue)
}
