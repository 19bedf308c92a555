use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};
use tracing::info;

use crate::{
    api::handler::AppState,
    api::quotes::QuoteProxy,
    config::Config,
    error::AppResult,
    ingest::TransactionIngestService,
    ledger::{models::Chain, LedgerRepository},
    verifier::{ChainVerifier, NearReceipts, SolanaReceipts, StellarReceipts},
};

pub async fn initialize_app_state(config: &Config) -> AppResult<AppState> {
    info!("Initializing application components ...");

    let pool = initialize_database(&config.database_url).await?;

    let ledger = Arc::new(LedgerRepository::new(pool));

    // Chain receipt lookups, one per supported chain. Each lookup is a
    // single best-effort fetch bounded by the configured timeout.
    let verify_timeout = Duration::from_secs(config.verify_timeout_secs);

    let mut verifier = ChainVerifier::new();
    verifier.register_lookup(
        Chain::Solana,
        Arc::new(SolanaReceipts::new(
            config.solana_rpc_url.clone(),
            verify_timeout,
        )),
    );
    verifier.register_lookup(
        Chain::Near,
        Arc::new(NearReceipts::new(
            config.near_rpc_url.clone(),
            verify_timeout,
        )),
    );
    verifier.register_lookup(
        Chain::Stellar,
        Arc::new(StellarReceipts::new(
            config.stellar_horizon_url.clone(),
            verify_timeout,
        )),
    );
    let verifier = Arc::new(verifier);

    info!("Chains supported for receipt verification:");
    for chain in Chain::all() {
        if verifier.supports_chain(chain) {
            info!("   {:?}", chain);
        }
    }

    let ingest = Arc::new(TransactionIngestService::new(
        verifier.clone(),
        ledger.clone(),
    ));
    info!("Transaction ingest service initialized");

    let quote_proxy = Arc::new(QuoteProxy::new(
        config.quote_api_url.clone(),
        verify_timeout,
    ));
    info!("Swap-quote proxy initialized: {}", config.quote_api_url);

    Ok(AppState {
        ledger,
        verifier,
        ingest,
        quote_proxy,
    })
}

async fn initialize_database(database_url: &str) -> AppResult<PgPool> {
    info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(50)
        .min_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("Database initialized");
    Ok(pool)
}
