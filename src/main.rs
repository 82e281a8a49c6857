use std::sync::Arc;
use std::time::Duration;

use color_eyre::Result;
use dotenvy::dotenv;
use log::info;

use ckb_tx_relayer::config::RelayerConfig;
use ckb_tx_relayer::domain::{RelayPolicy, RelayService};
use ckb_tx_relayer::logging::setup_logging;
use ckb_tx_relayer::repositories::InMemoryTransactionRepository;
use ckb_tx_relayer::services::ledger::{HttpLedgerClient, NetworkProfile};
use ckb_tx_relayer::utils::run_periodically;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();
    setup_logging();

    let config = RelayerConfig::from_env();
    let profile = NetworkProfile::from_is_mainnet(config.is_mainnet);
    info!("Starting relayer against {profile:?}");

    let transactions = Arc::new(InMemoryTransactionRepository::new());
    let ledger = Arc::new(HttpLedgerClient::new(profile, config.rpc_url.clone())?);
    let policy = RelayPolicy {
        max_pending_txs: config.max_pending_txs,
        mempool_stale: chrono::Duration::milliseconds(config.mempool_stale_ms),
        block_stale: chrono::Duration::milliseconds(config.block_stale_ms),
        confirmation_depth: config.confirmation_depth,
    };
    let service = Arc::new(RelayService::new(ledger, transactions, policy));
    let period = Duration::from_millis(config.send_interval_ms);

    run_periodically("submission", period, {
        let service = Arc::clone(&service);
        move || {
            let service = Arc::clone(&service);
            async move { service.process_prepared().await.map_err(Into::into) }
        }
    });
    run_periodically("mempool-tracker", period, {
        let service = Arc::clone(&service);
        move || {
            let service = Arc::clone(&service);
            async move { service.process_sent().await.map_err(Into::into) }
        }
    });
    run_periodically("finality-tracker", period, {
        let service = Arc::clone(&service);
        move || {
            let service = Arc::clone(&service);
            async move { service.process_committed().await.map_err(Into::into) }
        }
    });

    info!("Relayer started; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}
