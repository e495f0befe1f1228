use serde::Deserialize;
use std::time::Duration;

use crate::services::ocr::PollPolicy;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Work queue URL. Required by the ingest and summarize functions.
    pub sqs_queue_url: Option<String>,

    /// Catalog table name. Required by the catalog upload function.
    pub ecommerce_table_name: Option<String>,

    /// Stripe secret key. Required by the payment functions.
    pub stripe_api_key: Option<String>,

    /// Stripe API base URL
    #[serde(default = "default_stripe_api_base")]
    pub stripe_api_base: String,

    /// Bedrock model used for grocery list extraction
    #[serde(default = "default_bedrock_model_id")]
    pub bedrock_model_id: String,

    /// Region hosting Textract and the upload bucket
    #[serde(default = "default_textract_region")]
    pub textract_region: String,

    /// Key prefix Textract writes asynchronous job output under
    #[serde(default = "default_textract_output_prefix")]
    pub textract_output_prefix: String,

    /// First delay between PDF job status checks
    #[serde(default = "default_pdf_poll_initial_ms")]
    pub pdf_poll_initial_ms: u64,

    /// Upper bound for the delay between PDF job status checks
    #[serde(default = "default_pdf_poll_max_ms")]
    pub pdf_poll_max_ms: u64,

    /// Total time spent waiting on one PDF job before giving up
    #[serde(default = "default_pdf_poll_timeout_secs")]
    pub pdf_poll_timeout_secs: u64,

    /// Product list bundled with the Stripe seeding function
    #[serde(default = "default_product_list_path")]
    pub product_list_path: String,
}

fn default_stripe_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_bedrock_model_id() -> String {
    "anthropic.claude-3-5-sonnet-20240620-v1:0".to_string()
}

fn default_textract_region() -> String {
    "us-east-1".to_string()
}

fn default_textract_output_prefix() -> String {
    "converted/".to_string()
}

fn default_pdf_poll_initial_ms() -> u64 {
    500
}

fn default_pdf_poll_max_ms() -> u64 {
    4_000
}

fn default_pdf_poll_timeout_secs() -> u64 {
    20
}

fn default_product_list_path() -> String {
    "product_list.json".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Build from explicit key/value pairs (upper-case names, as in the environment).
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs.into_iter().map(|(k, v)| (k.into(), v.into()));
        Ok(envy::from_iter(pairs)?)
    }

    pub fn queue_url(&self) -> Result<&str, ConfigError> {
        required(self.sqs_queue_url.as_deref(), "SQS_QUEUE_URL")
    }

    pub fn table_name(&self) -> Result<&str, ConfigError> {
        required(self.ecommerce_table_name.as_deref(), "ECOMMERCE_TABLE_NAME")
    }

    pub fn stripe_api_key(&self) -> Result<&str, ConfigError> {
        required(self.stripe_api_key.as_deref(), "STRIPE_API_KEY")
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            Duration::from_millis(self.pdf_poll_initial_ms),
            Duration::from_millis(self.pdf_poll_max_ms),
            Duration::from_secs(self.pdf_poll_timeout_secs),
        )
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Missing required setting {0}")]
    Missing(&'static str),
}
