use anyhow::{Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use odds_scanner::clob::ClobClient;
use odds_scanner::config::Config;
use odds_scanner::executor::ClobExecutor;
use odds_scanner::signer::OrderSigner;
use odds_scanner::trader::{run_scan, TradeSettings};

#[tokio::main]
async fn main() -> Result<()> {
    // Load config
    let config = Config::from_env()?;

    // Setup logging
    FmtSubscriber::builder()
        .with_max_level(match config.log_level.as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("╔═══════════════════════════════════════╗");
    info!("║     Polymarket Odds Scanner           ║");
    info!("╠═══════════════════════════════════════╣");
    info!("║ Mode: {:31} ║", if config.dry_run { "DRY RUN (no real orders)" } else { "LIVE TRADING" });
    info!("║ Strategy: {:27} ║", config.strategy);
    info!("║ Order size: ${:25} ║", config.order_size_usd);
    info!("╚═══════════════════════════════════════╝");

    let signer = OrderSigner::new(
        &config.private_key,
        config.chain_id,
        config.funder_address.as_deref(),
    )?
    .with_signature_type(config.signature_type);
    let address = format!("{:?}", signer.address());
    info!("Wallet: {}", address);

    // Credentials must exist before any market is touched
    let creds = ClobClient::new(&config.clob_url)?
        .create_or_derive_api_creds(signer.wallet())
        .await
        .context("Error creating or deriving API credentials")?;
    info!("API Key: {}", creds.api_key);

    let signer = signer.with_owner(&creds.api_key);
    let clob = ClobClient::new(&config.clob_url)?.with_credentials(creds, &address);
    let executor = ClobExecutor::new(signer, clob.clone(), config.dry_run);

    let settings = TradeSettings {
        mode: config.strategy,
        order_size_usd: config.order_size_usd,
    };

    let summary = run_scan(&clob, &executor, &settings).await?;
    summary.log();

    info!("Done placing orders.");
    Ok(())
}
