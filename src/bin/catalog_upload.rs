use grocery_assistant::{
    app_state::load_sdk_config, config::AppConfig, handlers::catalog, services::catalog::DynamoCatalog,
    telemetry,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::Deserialize;
use serde_json::Value;

/// Products arrive either as a bare array or wrapped in `{"products": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum UploadRequest {
    Items(Vec<Value>),
    Wrapped { products: Vec<Value> },
}

impl UploadRequest {
    fn into_items(self) -> Vec<Value> {
        match self {
            UploadRequest::Items(items) => items,
            UploadRequest::Wrapped { products } => products,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init_tracing();

    let config = AppConfig::from_env()?;
    let table_name = config.table_name()?;

    tracing::info!(table = %table_name, "Initializing catalog upload function");
    let sdk = load_sdk_config().await;
    let table = DynamoCatalog::new(aws_sdk_dynamodb::Client::new(&sdk), table_name);
    let table = &table;

    run(service_fn(move |event: LambdaEvent<UploadRequest>| async move {
        Ok::<bool, Error>(catalog::upload_products(table, event.payload.into_items()).await)
    }))
    .await
}
