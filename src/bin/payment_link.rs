use grocery_assistant::{
    config::AppConfig, handlers::catalog, services::payments::StripeClient, telemetry,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::Deserialize;

#[derive(Deserialize)]
struct PaymentLinkRequest {
    product_name: String,
    qty: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init_tracing();

    let config = AppConfig::from_env()?;
    let stripe = StripeClient::new(config.stripe_api_key()?, config.stripe_api_base.clone())?;
    let stripe = &stripe;

    run(service_fn(move |event: LambdaEvent<PaymentLinkRequest>| async move {
        let request = event.payload;
        Ok::<String, Error>(catalog::payment_link(stripe, &request.product_name, request.qty).await)
    }))
    .await
}
