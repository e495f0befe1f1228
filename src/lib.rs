//! Grocery Assistant
//!
//! Lambda handlers for the grocery ordering assistant: uploaded grocery lists
//! are read with Amazon Textract, queued on SQS, and summarized by a Bedrock
//! hosted model; catalog products are stored in DynamoDB and sold through
//! Stripe payment links.

pub mod app_state;
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod telemetry;
