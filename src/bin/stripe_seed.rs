use grocery_assistant::{
    config::AppConfig, handlers::catalog, models::product::Product,
    services::payments::StripeClient, telemetry,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::{json, Value};

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init_tracing();

    let config = AppConfig::from_env()?;
    let stripe = StripeClient::new(config.stripe_api_key()?, config.stripe_api_base.clone())?;

    let raw = std::fs::read_to_string(&config.product_list_path)?;
    let products: Vec<Product> = serde_json::from_str(&raw)?;
    tracing::info!(
        path = %config.product_list_path,
        count = products.len(),
        "Loaded product list"
    );

    let stripe = &stripe;
    let products = &products;

    run(service_fn(move |_event: LambdaEvent<Value>| async move {
        let report = catalog::seed_stripe_products(stripe, products).await;
        Ok::<Value, Error>(json!({
            "message": report.message(),
            "created": report.created,
            "failed": report.failed,
        }))
    }))
    .await
}
