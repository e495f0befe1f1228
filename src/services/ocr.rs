use async_trait::async_trait;
use aws_sdk_textract::error::DisplayErrorContext;
use aws_sdk_textract::types::{
    Block, BlockType, Document, DocumentLocation, JobStatus, OutputConfig, S3Object,
};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::models::upload::ObjectRef;
use crate::services::storage::{S3Storage, StorageError};

/// Line-level text detection on a stored document.
#[async_trait]
pub trait TextDetector: Send + Sync {
    /// Detected lines, in reading order.
    async fn detect_lines(&self, object: &ObjectRef) -> Result<Vec<String>, OcrError>;
}

/// Turns a PDF into something the detector can read.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Returns the location of the converted document.
    async fn convert_pdf(&self, object: &ObjectRef) -> Result<ObjectRef, ConversionError>;
}

/// Backoff schedule for waiting on an asynchronous detection job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(initial_delay: Duration, max_delay: Duration, timeout: Duration) -> Self {
        let initial_delay = initial_delay.max(Duration::from_millis(1));
        Self {
            initial_delay,
            max_delay: max_delay.max(initial_delay),
            timeout,
        }
    }
}

/// State reported by one job status check.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    InProgress,
    Succeeded,
    Failed(String),
}

/// Check a job until it finishes, doubling the delay between checks up to
/// `max_delay`. Gives up once the accumulated wait reaches `timeout`.
pub async fn poll_job<F, Fut>(
    policy: &PollPolicy,
    job_id: &str,
    mut check: F,
) -> Result<(), ConversionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<JobState, ConversionError>>,
{
    let mut delay = policy.initial_delay;
    let mut waited = Duration::ZERO;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match check().await? {
            JobState::Succeeded => return Ok(()),
            JobState::Failed(reason) => {
                return Err(ConversionError::Failed {
                    job_id: job_id.to_string(),
                    reason,
                })
            }
            JobState::InProgress => {}
        }

        if waited >= policy.timeout {
            return Err(ConversionError::TimedOut {
                job_id: job_id.to_string(),
                attempts,
            });
        }

        let pause = delay.min(policy.timeout - waited);
        tracing::debug!(job_id, attempts, delay_ms = pause.as_millis() as u64, "Job still running");
        sleep(pause).await;
        waited += pause;
        delay = (delay * 2).min(policy.max_delay);
    }
}

/// Collect `LINE` block text from one part of Textract's asynchronous job
/// output (the JSON files written under the job's output prefix).
pub fn lines_from_job_output(json: &[u8]) -> Result<Vec<String>, OcrError> {
    #[derive(Deserialize)]
    struct JobOutput {
        #[serde(rename = "Blocks", default)]
        blocks: Vec<OutputBlock>,
    }

    #[derive(Deserialize)]
    struct OutputBlock {
        #[serde(rename = "BlockType")]
        block_type: Option<String>,
        #[serde(rename = "Text")]
        text: Option<String>,
    }

    let output: JobOutput = serde_json::from_slice(json).map_err(OcrError::Parse)?;
    Ok(output
        .blocks
        .into_iter()
        .filter(|b| b.block_type.as_deref() == Some("LINE"))
        .filter_map(|b| b.text)
        .collect())
}

/// Numbered output parts under a job prefix, in page order.
///
/// Textract also drops an access-check marker next to the parts; anything
/// whose last path segment is not a number is ignored.
pub fn job_output_parts(keys: Vec<String>) -> Vec<String> {
    let mut parts: Vec<(u32, String)> = keys
        .into_iter()
        .filter_map(|key| {
            let n = key.rsplit('/').next()?.parse::<u32>().ok()?;
            Some((n, key))
        })
        .collect();
    parts.sort_by_key(|(n, _)| *n);
    parts.into_iter().map(|(_, key)| key).collect()
}

fn line_text(blocks: &[Block]) -> Vec<String> {
    blocks
        .iter()
        .filter(|b| b.block_type() == Some(&BlockType::Line))
        .filter_map(|b| b.text().map(str::to_string))
        .collect()
}

/// Amazon Textract client covering both the synchronous detection call and
/// the asynchronous PDF job.
pub struct TextractClient {
    client: aws_sdk_textract::Client,
    storage: Arc<S3Storage>,
    output_prefix: String,
    poll: PollPolicy,
}

impl TextractClient {
    pub fn new(
        client: aws_sdk_textract::Client,
        storage: Arc<S3Storage>,
        output_prefix: impl Into<String>,
        poll: PollPolicy,
    ) -> Self {
        Self {
            client,
            storage,
            output_prefix: output_prefix.into(),
            poll,
        }
    }

    fn s3_object(object: &ObjectRef) -> S3Object {
        S3Object::builder()
            .bucket(&object.bucket)
            .name(&object.key)
            .build()
    }

    async fn job_state(&self, job_id: &str) -> Result<JobState, ConversionError> {
        let status = self
            .client
            .get_document_text_detection()
            .job_id(job_id)
            .max_results(1)
            .send()
            .await
            .map_err(|e| ConversionError::Poll(DisplayErrorContext(&e).to_string()))?;

        Ok(match status.job_status() {
            Some(JobStatus::Succeeded) => JobState::Succeeded,
            Some(JobStatus::PartialSuccess) => {
                tracing::warn!(job_id, "Text detection job only partially succeeded");
                JobState::Succeeded
            }
            Some(JobStatus::InProgress) | None => JobState::InProgress,
            Some(JobStatus::Failed) => JobState::Failed(
                status
                    .status_message()
                    .unwrap_or("job reported FAILED")
                    .to_string(),
            ),
            Some(other) => JobState::Failed(format!("unexpected job status {}", other.as_str())),
        })
    }

    async fn read_job_output(&self, location: &ObjectRef) -> Result<Vec<String>, OcrError> {
        let keys = self
            .storage
            .list_keys(&location.bucket, &location.key)
            .await?;

        let mut lines = Vec::new();
        for key in job_output_parts(keys) {
            let part = ObjectRef::new(location.bucket.clone(), key);
            let bytes = self.storage.download(&part).await?;
            lines.extend(lines_from_job_output(&bytes)?);
        }
        Ok(lines)
    }
}

#[async_trait]
impl TextDetector for TextractClient {
    async fn detect_lines(&self, object: &ObjectRef) -> Result<Vec<String>, OcrError> {
        if object.key.starts_with(&self.output_prefix) {
            return self.read_job_output(object).await;
        }

        let document = Document::builder().s3_object(Self::s3_object(object)).build();
        let response = self
            .client
            .detect_document_text()
            .document(document)
            .send()
            .await
            .map_err(|e| OcrError::Textract(DisplayErrorContext(&e).to_string()))?;

        Ok(line_text(response.blocks()))
    }
}

#[async_trait]
impl DocumentConverter for TextractClient {
    async fn convert_pdf(&self, object: &ObjectRef) -> Result<ObjectRef, ConversionError> {
        let location = DocumentLocation::builder()
            .s3_object(Self::s3_object(object))
            .build();
        let output = OutputConfig::builder()
            .s3_bucket(&object.bucket)
            .s3_prefix(self.output_prefix.trim_end_matches('/'))
            .build()
            .map_err(|e| ConversionError::Start(e.to_string()))?;

        let started = self
            .client
            .start_document_text_detection()
            .document_location(location)
            .output_config(output)
            .send()
            .await
            .map_err(|e| ConversionError::Start(DisplayErrorContext(&e).to_string()))?;

        let job_id = started
            .job_id()
            .ok_or(ConversionError::MissingJobId)?
            .to_string();
        tracing::info!(job_id = %job_id, key = %object.key, "Started PDF text detection job");

        poll_job(&self.poll, &job_id, || self.job_state(&job_id)).await?;

        let converted = ObjectRef::new(
            object.bucket.clone(),
            format!("{}{}/", self.output_prefix, job_id),
        );
        tracing::info!(job_id = %job_id, output = %converted.key, "PDF text detection job finished");
        Ok(converted)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("Textract request failed: {0}")]
    Textract(String),

    #[error("Failed to read detection job output: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to parse detection job output: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Failed to start text detection job: {0}")]
    Start(String),

    #[error("Text detection job started without a job id")]
    MissingJobId,

    #[error("Failed to check text detection job status: {0}")]
    Poll(String),

    #[error("Text detection job {job_id} failed: {reason}")]
    Failed { job_id: String, reason: String },

    #[error("Text detection job {job_id} timed out after {attempts} status checks")]
    TimedOut { job_id: String, attempts: u32 },
}
