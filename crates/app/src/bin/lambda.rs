//! Mailroom Admin API - AWS Lambda Runtime

use lambda_http::{run, Error};
use tracing::info;

use mailroom_app::{create_app, open_stores, with_middleware};
use mailroom_common::Config;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .without_time()
        .init();

    info!("Initializing Mailroom Admin API Lambda");

    let config =
        Config::from_env().map_err(|e| Error::from(format!("Configuration error: {}", e)))?;

    let stores = open_stores(&config)
        .await
        .map_err(|e| Error::from(format!("Store error: {}", e)))?;

    info!("Directory store ready");

    let app = create_app(&config, stores)
        .map_err(|e| Error::from(format!("App initialization error: {}", e)))?;

    let app = with_middleware(app, &config);

    info!("Mailroom Admin API Lambda ready to serve requests");

    run(app).await
}
