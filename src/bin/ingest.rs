use aws_lambda_events::event::s3::S3Event;
use grocery_assistant::{
    app_state::IngestState, config::AppConfig, handlers::ingest, models::upload::ObjectRef,
    telemetry,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init_tracing();

    let config = AppConfig::from_env()?;

    tracing::info!("Initializing ingest function");
    let state = IngestState::from_config(&config).await?;
    let state = &state;

    run(service_fn(move |event: LambdaEvent<S3Event>| async move {
        handle(state, event).await
    }))
    .await
}

async fn handle(state: &IngestState, event: LambdaEvent<S3Event>) -> Result<Value, Error> {
    let records = event.payload.records;
    tracing::info!(
        request_id = %event.context.request_id,
        records = records.len(),
        "Received storage event"
    );

    let objects = records
        .iter()
        .filter_map(|record| {
            let object = ObjectRef::from_event_record(record);
            if object.is_none() {
                tracing::warn!(event_name = ?record.event_name, "Record without bucket or key");
            }
            object
        })
        .collect();

    ingest::ingest_batch(state, objects).await;
    Ok(ingest::acknowledgement())
}
