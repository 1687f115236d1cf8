use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_ram::Client as RamClient;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use onboarding_lambdas::{config, mirror_instance_traffic, MirrorConfig};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();

    let settings = MirrorConfig::from_env()?;
    let instance_id = config::source_instance_from_env()?;

    // Get AWS Configuration
    let aws_config = aws_config::load_from_env().await;
    let ec2 = Ec2Client::new(&aws_config);
    let ram = RamClient::new(&aws_config);

    run(service_fn(|_event: LambdaEvent<Value>| {
        mirror_instance_traffic(&ec2, &ram, &settings, &instance_id)
    }))
    .await
}
