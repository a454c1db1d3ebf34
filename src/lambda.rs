use busbreakdown::storage::aws_stores;
use busbreakdown::{APP_NAME, Config, IncidentProcessor};
use jluszcz_rust_utils::lambda;
use lambda_runtime::{LambdaEvent, service_fn};
use log::debug;
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    lambda::init(APP_NAME, module_path!(), false).await?;

    let config = Config::from_env()?;
    let (blobs, records) = aws_stores().await;
    let processor = IncidentProcessor::new(config, blobs, records);

    let processor = &processor;
    let func = service_fn(move |event| handler(processor, event));
    lambda_runtime::run(func).await?;
    Ok(())
}

async fn handler(
    processor: &IncidentProcessor,
    event: LambdaEvent<Value>,
) -> Result<Value, lambda_runtime::Error> {
    debug!("Handling request {}", event.context.request_id);
    let response = processor.handle_value(&event.payload).await;
    Ok(serde_json::to_value(response)?)
}
