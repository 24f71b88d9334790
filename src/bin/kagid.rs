use std::sync::Arc;

use clap::Parser;
use tracing::{event, Level};
use tracing_subscriber::EnvFilter;

use kagi::config::{load_credentials, Options, Settings};
use kagi::core::types::RedirectUri;
use kagi::db::DbStore;
use kagi::http::Server;
use kagi::provider::OAuth2Provider;
use kagi::util::hash::HashingService;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn kagid(opts: Options) -> Result<(), BoxError> {
    let settings = Settings::load(&opts.settings_file)?;
    let client = settings.client()?;
    let credentials = load_credentials(&opts.credentials_path())?;

    if opts.hash_secret.is_none() {
        event!(Level::WARN, "HASH_SECRET is not set, hashed passwords use an empty secret");
    }
    let hasher = HashingService::with_secret_key(opts.hash_secret.clone().unwrap_or_default());
    let store = DbStore::open(&opts.data_dir).await?;

    let provider = Arc::new(OAuth2Provider::new(
        client,
        credentials,
        store,
        hasher,
        opts.lifetimes(),
    ));

    let worker = {
        let provider = Arc::clone(&provider);
        let period = opts.clean_up_period();
        tokio::spawn(async move { provider.start_clean_up_worker(period).await })
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            event!(Level::ERROR, error = %e, "Failed to listen for shutdown signal");
        }
        event!(Level::INFO, "Shutting down");
    };

    let server = Server::new(Arc::clone(&provider), RedirectUri(opts.signin_path.clone()));
    let served = server.serve(opts.socket_addr(), shutdown).await;

    worker.abort();
    provider.store().persist().await?;
    served?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Options::parse();
    event!(
        Level::DEBUG,
        settings = %opts.settings_file.display(),
        data_dir = %opts.data_dir.display(),
        "Starting kagid"
    );
    kagid(opts).await
}
