use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use std::collections::HashMap;

use crate::models::product::Product;

/// BatchWriteItem accepts at most this many requests per call.
const BATCH_SIZE: usize = 25;

/// Resend attempts for items DynamoDB reports as unprocessed.
const MAX_UNPROCESSED_RETRIES: usize = 3;

/// Partition key shared by every catalog product.
pub const PRODUCT_PARTITION: &str = "PRODUCT";

/// Storage for catalog products.
#[async_trait]
pub trait CatalogTable: Send + Sync {
    /// Write every product, returning how many were stored.
    async fn put_products(&self, products: &[Product]) -> Result<usize, CatalogError>;
}

/// Table item for a product: single-table keys plus every product attribute.
pub fn product_item(product: &Product) -> HashMap<String, AttributeValue> {
    let package = HashMap::from([
        ("height".to_string(), number(product.package.height)),
        ("length".to_string(), number(product.package.length)),
        ("weight".to_string(), number(product.package.weight)),
        ("width".to_string(), number(product.package.width)),
    ]);

    HashMap::from([
        ("PK".to_string(), string(PRODUCT_PARTITION)),
        ("SK".to_string(), string(product.sort_key())),
        ("productId".to_string(), string(&product.product_id)),
        ("category".to_string(), string(&product.category)),
        ("createdDate".to_string(), string(product.created_date.to_rfc3339())),
        ("description".to_string(), string(&product.description)),
        ("modifiedDate".to_string(), string(product.modified_date.to_rfc3339())),
        ("name".to_string(), string(&product.name)),
        ("package".to_string(), AttributeValue::M(package)),
        ("pictures".to_string(), string_list(&product.pictures)),
        ("price".to_string(), number(product.price)),
        ("tags".to_string(), string_list(&product.tags)),
    ])
}

fn string(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

fn number(value: i64) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

fn string_list(values: &[String]) -> AttributeValue {
    AttributeValue::L(values.iter().map(string).collect())
}

/// Catalog stored in a DynamoDB single table.
pub struct DynamoCatalog {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl DynamoCatalog {
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    async fn write_chunk(&self, mut requests: Vec<WriteRequest>) -> Result<(), CatalogError> {
        for attempt in 0..=MAX_UNPROCESSED_RETRIES {
            let output = self
                .client
                .batch_write_item()
                .request_items(&self.table_name, requests)
                .send()
                .await
                .map_err(|e| CatalogError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

            requests = output
                .unprocessed_items
                .and_then(|mut items| items.remove(&self.table_name))
                .unwrap_or_default();

            if requests.is_empty() {
                return Ok(());
            }
            tracing::warn!(
                table = %self.table_name,
                attempt,
                unprocessed = requests.len(),
                "Resending unprocessed catalog items"
            );
        }

        Err(CatalogError::Unprocessed(requests.len()))
    }
}

#[async_trait]
impl CatalogTable for DynamoCatalog {
    async fn put_products(&self, products: &[Product]) -> Result<usize, CatalogError> {
        for chunk in products.chunks(BATCH_SIZE) {
            let requests = chunk
                .iter()
                .map(|product| {
                    let put = PutRequest::builder()
                        .set_item(Some(product_item(product)))
                        .build()
                        .map_err(|e| CatalogError::Request(e.to_string()))?;
                    Ok(WriteRequest::builder().put_request(put).build())
                })
                .collect::<Result<Vec<_>, CatalogError>>()?;

            self.write_chunk(requests).await?;
        }

        Ok(products.len())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),

    #[error("Failed to build write request: {0}")]
    Request(String),

    #[error("{0} catalog items remained unprocessed after retries")]
    Unprocessed(usize),
}
