use aws_sdk_cloudwatchlogs::Client as CwClient;
use aws_sdk_eventbridge::Client as EventsClient;
use aws_sdk_lambda::Client as LambdaClient;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use onboarding_lambdas::{ship_api_gateway_logs, LogShipper, ShipperConfig};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();

    let settings = ShipperConfig::from_env()?;

    // Get AWS Configuration
    let config = aws_config::load_from_env().await;
    let logs = CwClient::new(&config);
    let events = EventsClient::new(&config);
    let lambda = LambdaClient::new(&config);
    let shipper = LogShipper::new(&settings.endpoint);

    run(service_fn(|_event: LambdaEvent<Value>| {
        ship_api_gateway_logs(
            &logs,
            &events,
            &lambda,
            &shipper,
            &settings,
            chrono::Utc::now(),
        )
    }))
    .await
}
