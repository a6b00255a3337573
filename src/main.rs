use anyhow::{Context, Result};
use clap::Parser;
use lambda_runtime::{service_fn, LambdaEvent};
use std::io::Read;
use std::sync::Arc;

use pstn_transfer::auth::{DefaultTokenFetcher, SecretsManagerStore, TokenCache};
use pstn_transfer::config::{CliArgs, Config};
use pstn_transfer::http_client::RetryHttpClient;
use pstn_transfer::models::{ConnectEvent, ConnectResponse};
use pstn_transfer::service::HandlerService;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = Config::load()?;

    init_logging(args.log_level.as_deref().unwrap_or(&config.log_level));

    tracing::debug!(version = %config.version, "PSTN transfer handler starting");

    // One cache, connection pool and fetcher for the whole process
    let http = RetryHttpClient::new(&config.http)?;
    let token_cache = Arc::new(TokenCache::new());
    let token_fetcher = Arc::new(DefaultTokenFetcher::new(
        Arc::new(http.clone()),
        token_cache,
    ));
    let service = HandlerService::new(
        Arc::new(config),
        http,
        token_fetcher,
        Arc::new(SecretsManagerStore),
    );

    if args.test {
        return run_test_mode(&service, args.event_file.as_deref()).await;
    }

    lambda_runtime::run(service_fn(|event: LambdaEvent<ConnectEvent>| {
        let service = service.clone();
        async move { handle_invocation(&service, event).await }
    }))
    .await
    .map_err(|e| anyhow::anyhow!("Lambda runtime error: {}", e))
}

/// Initialize tracing: JSON under the Lambda runtime, plain text otherwise
fn init_logging(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level.to_lowercase()));

    if std::env::var_os("AWS_LAMBDA_FUNCTION_NAME").is_some() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_current_span(false)
            .without_time()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn handle_invocation(
    service: &HandlerService,
    event: LambdaEvent<ConnectEvent>,
) -> std::result::Result<ConnectResponse, lambda_runtime::Error> {
    let (payload, context) = event.into_parts();
    tracing::debug!(request_id = %context.request_id, "Lambda invocation");

    service.handle(&payload).await.map_err(|e| {
        tracing::error!(request_id = %context.request_id, error = %e, "Invocation failed");
        e.into()
    })
}

/// Run one invocation from a file or stdin and print the response
async fn run_test_mode(
    service: &HandlerService,
    event_file: Option<&std::path::Path>,
) -> Result<()> {
    let raw = match event_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Error reading event file {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Error reading event from stdin")?;
            buf
        }
    };

    let event: ConnectEvent = serde_json::from_str(&raw).context("Error decoding event")?;
    let response = service.handle(&event).await?;

    println!(
        "{}",
        serde_json::to_string(&response).context("Error encoding response")?
    );
    Ok(())
}
