use dotenvy::dotenv;
use spendwatch::{
    api::{self, AppState},
    config::{self, signer::load_signer},
    core::{monitor::RefreshMonitor, units::CurrencyConverter},
    errors::Result,
    ledger::{Ledger, LedgerWriter, rpc::{RpcLedger, RpcLedgerWriter}},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment directly
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the main application configuration
    let app_config = config::load_app_configuration()?;

    // 4. Connect the read adapter
    let reader = RpcLedger::connect(&app_config.chain)
        .await
        .inspect_err(|e| error!("Failed to connect to the ledger: {e}"))?;
    let ledger = Ledger::from_shared(Arc::new(reader));

    // 5. Optional write path, keyed by PRIVATE_KEY
    let writer: Option<Arc<dyn LedgerWriter>> = match load_signer()? {
        Some(signer) => {
            let writer = RpcLedgerWriter::connect(&app_config.chain, signer).await?;
            Some(Arc::new(writer))
        }
        None => {
            warn!("PRIVATE_KEY not set, running read-only");
            None
        }
    };

    // 6. Background refresh
    let currency = CurrencyConverter::from(&app_config.currency);
    let monitor = Arc::new(RefreshMonitor::new(
        ledger.clone(),
        app_config.refresh.interval(),
        currency.clone(),
    ));
    let refresh_task = tokio::spawn(Arc::clone(&monitor).run());

    // 7. Serve until Ctrl-C
    let state = AppState {
        ledger,
        writer,
        catalog: Arc::new(app_config.catalog()),
        currency: Arc::new(currency),
        network: app_config.chain.network.clone(),
        monitor,
    };
    let served = api::serve(&app_config.server.bind, state).await;

    refresh_task.abort();
    served.inspect_err(|e| error!("API server failed: {e}"))
}
