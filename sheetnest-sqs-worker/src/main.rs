use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_sqs::Client as SqsClient;
use log::{info, warn};
use sheetnest_sqs_worker::storage::ArtifactStore;
use sheetnest_sqs_worker::worker::NestWorker;
use std::env;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("starting sheetnest-sqs-worker");

    let input_queue_url =
        env::var("INPUT_QUEUE_URL").context("INPUT_QUEUE_URL environment variable is required")?;
    let output_queue_url = env::var("OUTPUT_QUEUE_URL")
        .context("OUTPUT_QUEUE_URL environment variable is required")?;
    let artifact_bucket =
        env::var("ARTIFACT_BUCKET").context("ARTIFACT_BUCKET environment variable is required")?;

    info!("configuration:");
    info!("  INPUT_QUEUE_URL: {input_queue_url}");
    info!("  OUTPUT_QUEUE_URL: {output_queue_url}");
    info!("  ARTIFACT_BUCKET: {artifact_bucket}");

    let mut config_loader = aws_config::defaults(BehaviorVersion::latest());

    // LocalStack / custom endpoint support
    if let Ok(endpoint_url) = env::var("AWS_ENDPOINT_URL") {
        config_loader = config_loader.endpoint_url(&endpoint_url);
        info!("using AWS endpoint: {endpoint_url}");
    }

    let config = config_loader.load().await;
    let sqs_client = SqsClient::new(&config);
    let s3_client = S3Client::new(&config);

    let store = ArtifactStore::new(s3_client, artifact_bucket);
    let worker = NestWorker::new(sqs_client, store, input_queue_url, output_queue_url);

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);

    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .context("failed to register SIGTERM handler")?;
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .context("failed to register SIGINT handler")?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("received SIGTERM, initiating graceful shutdown...");
                let _ = shutdown_tx.send(());
            }
            _ = sigint.recv() => {
                info!("received SIGINT, initiating graceful shutdown...");
                let _ = shutdown_tx.send(());
            }
        }
    });

    let result = worker.listen_and_process(shutdown_rx).await;

    if let Err(e) = &result {
        warn!("worker exited with error: {e}");
    }

    result
}
