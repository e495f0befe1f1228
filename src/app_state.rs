use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::sync::Arc;

use crate::config::{AppConfig, ConfigError};
use crate::services::{
    model::{BedrockClient, TextModel},
    ocr::{DocumentConverter, TextDetector, TextractClient},
    queue::{SqsQueue, WorkQueue},
    storage::{S3Storage, StorageError},
};

/// Collaborators of the ingest function.
#[derive(Clone)]
pub struct IngestState {
    pub detector: Arc<dyn TextDetector>,
    pub converter: Arc<dyn DocumentConverter>,
    pub queue: Arc<dyn WorkQueue>,
    /// Prefix under which detection jobs write their output into the upload bucket.
    pub output_prefix: String,
}

impl IngestState {
    pub fn new(
        detector: Arc<dyn TextDetector>,
        converter: Arc<dyn DocumentConverter>,
        queue: Arc<dyn WorkQueue>,
        output_prefix: impl Into<String>,
    ) -> Self {
        Self {
            detector,
            converter,
            queue,
            output_prefix: output_prefix.into(),
        }
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        let queue_url = config.queue_url()?;
        let sdk = load_sdk_config().await;

        // Textract and the upload bucket are pinned to their own region.
        let textract_sdk = sdk
            .to_builder()
            .region(Region::new(config.textract_region.clone()))
            .build();

        let storage = Arc::new(S3Storage::new(&config.textract_region)?);
        let textract = Arc::new(TextractClient::new(
            aws_sdk_textract::Client::new(&textract_sdk),
            storage,
            config.textract_output_prefix.clone(),
            config.poll_policy(),
        ));
        let queue = Arc::new(SqsQueue::new(aws_sdk_sqs::Client::new(&sdk), queue_url));

        Ok(Self::new(
            textract.clone(),
            textract,
            queue,
            config.textract_output_prefix.clone(),
        ))
    }
}

/// Collaborators of the summarize function.
#[derive(Clone)]
pub struct SummarizeState {
    pub model: Arc<dyn TextModel>,
    pub queue: Arc<dyn WorkQueue>,
}

impl SummarizeState {
    pub fn new(model: Arc<dyn TextModel>, queue: Arc<dyn WorkQueue>) -> Self {
        Self { model, queue }
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        let queue_url = config.queue_url()?;
        let sdk = load_sdk_config().await;

        let model = Arc::new(BedrockClient::new(
            aws_sdk_bedrockruntime::Client::new(&sdk),
            config.bedrock_model_id.clone(),
        ));
        let queue = Arc::new(SqsQueue::new(aws_sdk_sqs::Client::new(&sdk), queue_url));

        Ok(Self::new(model, queue))
    }
}

/// Shared AWS SDK configuration from the Lambda environment.
pub async fn load_sdk_config() -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest()).load().await
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
