use alb_login_metrics::{handle_event, Classifier, Config, DatadogClient, S3Event, S3ObjectStore};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::from_env()?;

    let level = if config.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();
    tracing::info!(?config, "starting");

    // Get AWS Configuration
    let aws_config = aws_config::load_from_env().await;
    let store = S3ObjectStore::new(&aws_config, config.s3_assume_role_arn.as_deref()).await?;

    let backend = DatadogClient::new(&config)?;
    let classifier = Classifier::new(config.url_pattern, &config.metric_name)?;

    run(service_fn(|event: LambdaEvent<S3Event>| {
        handle_event(&store, &backend, &classifier, event)
    }))
    .await
}
