use async_trait::async_trait;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::primitives::Blob;
use serde::{Deserialize, Serialize};

use crate::models::summary::NO_LIST_SENTINEL;

/// Messages API version Bedrock requires for Anthropic models.
pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Hosted text generation.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Sampling settings sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvokeRequest<'a> {
    pub anthropic_version: &'static str,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> InvokeRequest<'a> {
    pub fn user(prompt: &'a str, params: GenerationParams) -> Self {
        Self {
            anthropic_version: ANTHROPIC_VERSION,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        }
    }
}

#[derive(Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

/// Text of the first content block of a messages-API response body.
pub fn reply_text(body: &[u8]) -> Result<String, ModelError> {
    let response: InvokeResponse = serde_json::from_slice(body)?;
    response
        .content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .ok_or(ModelError::EmptyReply)
}

/// Instruction asking the model to pull a grocery list out of detected text.
pub fn grocery_prompt(extracted_text: &str) -> String {
    format!(
        "You are a helpful assistant that extracts grocery items from text, together with \
their amount in kg and their count when those are available.\n\
If the text contains a grocery list, respond with ONLY the list of items, one per line, \
in the following format:\n\
- Item 1, kg, count\n\
- Item 2, kg, count\n\
- Item 3, kg, count\n\
Leave out the amount or the count when the text does not give it.\n\n\
If the text does NOT contain a grocery list, respond with: \"{NO_LIST_SENTINEL}\"\n\n\
Here is the text:\n\
{extracted_text}"
    )
}

/// Bedrock runtime client invoking an Anthropic model through the messages API.
pub struct BedrockClient {
    client: aws_sdk_bedrockruntime::Client,
    model_id: String,
    params: GenerationParams,
}

impl BedrockClient {
    pub fn new(client: aws_sdk_bedrockruntime::Client, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }
}

#[async_trait]
impl TextModel for BedrockClient {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let body = serde_json::to_vec(&InvokeRequest::user(prompt, self.params))?;

        let response = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| ModelError::Invoke(DisplayErrorContext(&e).to_string()))?;

        reply_text(response.body().as_ref())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model invocation failed: {0}")]
    Invoke(String),

    #[error("Failed to encode or decode model payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Model reply contained no text")]
    EmptyReply,
}
