use aws_lambda_events::event::sqs::{BatchItemFailure, SqsBatchResponse, SqsEvent};
use grocery_assistant::{
    app_state::SummarizeState, config::AppConfig, handlers::summarize, models::message::Delivery,
    telemetry,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init_tracing();

    let config = AppConfig::from_env()?;

    tracing::info!(model_id = %config.bedrock_model_id, "Initializing summarize function");
    let state = SummarizeState::from_config(&config).await?;
    let state = &state;

    run(service_fn(move |event: LambdaEvent<SqsEvent>| async move {
        handle(state, event).await
    }))
    .await
}

/// Messages that failed are returned as batch item failures so only they are
/// redelivered (and dead-lettered once the queue's receive limit is reached).
async fn handle(
    state: &SummarizeState,
    event: LambdaEvent<SqsEvent>,
) -> Result<SqsBatchResponse, Error> {
    let records = event.payload.records;
    tracing::info!(
        request_id = %event.context.request_id,
        records = records.len(),
        "Received queue event"
    );

    let deliveries: Vec<Delivery> = records.into_iter().map(Delivery::from).collect();
    let report = summarize::summarize_batch(state, deliveries).await;

    let mut response = SqsBatchResponse::default();
    for message_id in report.failures {
        let mut failure = BatchItemFailure::default();
        failure.item_identifier = message_id;
        response.batch_item_failures.push(failure);
    }
    Ok(response)
}
