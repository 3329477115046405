//! NextGCore UDM (Unified Data Management)
//!
//! UE context management (nudm-uecm): serving AMF and SMF registrations,
//! persisted in the UDR, with deregistration notifications to superseded AMFs.

use anyhow::{Context, Result};
use clap::Parser;
use nextgcore_udmd::{
    udm_sbi_open, DeregNotifier, NrfDiscovery, SbiCallbackClient, SbiDataRepository, UdmConfig,
    UdmContext, UecmHandler,
};
use ogs_sbi::SbiClientPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// NextGCore UDM - Unified Data Management
#[derive(Parser, Debug)]
#[command(name = "nextgcore-udmd")]
#[command(author = "NextGCore")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "5G Core Unified Data Management", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, default_value = "/etc/nextgcore/udm.yaml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'e', long, default_value = "info")]
    log_level: String,

    /// Disable color output
    #[arg(short = 'm', long)]
    no_color: bool,

    /// SBI server address (overrides udm.sbi.addr)
    #[arg(long)]
    sbi_addr: Option<String>,

    /// SBI server port (overrides udm.sbi.port)
    #[arg(long)]
    sbi_port: Option<u16>,

    /// Maximum number of UEs (overrides udm.max_ue)
    #[arg(long)]
    max_ue: Option<usize>,
}

impl Args {
    fn apply(&self, config: &mut UdmConfig) {
        if let Some(addr) = &self.sbi_addr {
            config.sbi.addr = addr.clone();
        }
        if let Some(port) = self.sbi_port {
            config.sbi.port = port;
        }
        if let Some(max_ue) = self.max_ue {
            config.max_ue = max_ue;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    log::info!("NextGCore UDM v{} starting...", env!("CARGO_PKG_VERSION"));

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    let mut config = UdmConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;
    args.apply(&mut config);

    let sbi_addr = config.sbi_addr().context("Invalid SBI address")?;
    let sbi_uri = config.sbi_uri().context("Invalid SBI advertise address")?;
    let context = Arc::new(UdmContext::new(sbi_uri, config.max_ue));

    let clients = Arc::new(SbiClientPool::new());
    let nf_instance_id = uuid::Uuid::new_v4().to_string();
    log::info!("NF instance ID: {nf_instance_id}");

    let discovery = Arc::new(NrfDiscovery::new(
        clients.clone(),
        config.nrf.uri.clone(),
        config.udr.uri.clone(),
        nf_instance_id,
    ));
    if config.nrf.uri.is_none() && config.udr.uri.is_none() {
        log::warn!("Neither NRF nor UDR configured; every request will fail UDR resolution");
    }

    let notifier = Arc::new(DeregNotifier::new(
        Arc::new(SbiCallbackClient::new(clients.clone())),
        config.notifier.workers,
        config.notifier.queue_depth,
    ));

    let handler = Arc::new(UecmHandler::new(
        context.clone(),
        discovery,
        Arc::new(SbiDataRepository::new(clients)),
        notifier.clone(),
    ));

    let (sbi_server, bound) = udm_sbi_open(sbi_addr, handler)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start SBI server: {}", e))?;

    log::info!("SBI HTTP/2 server listening on {}", bound);
    log::info!("NextGCore UDM ready");

    run_event_loop_async(&context, shutdown).await?;

    log::info!("Shutting down...");

    sbi_server
        .stop()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to stop SBI server: {}", e))?;
    log::info!("SBI HTTP/2 server stopped");

    notifier.shutdown().await;
    log::info!(
        "Deregistration notifier stopped ({} dropped)",
        notifier.dropped()
    );

    log::info!("NextGCore UDM stopped ({} UE contexts)", context.ue_count());
    Ok(())
}

/// Initialize logging based on command line arguments
fn init_logging(args: &Args) -> Result<()> {
    let mut builder = env_logger::Builder::new();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };
    builder.filter_level(level);

    builder.format_timestamp_millis();

    if args.no_color {
        builder.write_style(env_logger::WriteStyle::Never);
    }

    builder.init();

    Ok(())
}

/// Set up signal handlers for graceful shutdown
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        shutdown.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    Ok(())
}

/// Wait for shutdown, reporting the UE load now and then
async fn run_event_loop_async(context: &UdmContext, shutdown: Arc<AtomicBool>) -> Result<()> {
    log::debug!("Entering async main event loop");

    let mut interval = tokio::time::interval(Duration::from_millis(100));
    let mut ticks: u64 = 0;

    while !shutdown.load(Ordering::SeqCst) {
        interval.tick().await;

        ticks += 1;
        if ticks % 600 == 0 {
            log::debug!(
                "UE contexts: {} (load {}%)",
                context.ue_count(),
                context.get_ue_load()
            );
        }
    }

    log::debug!("Exiting async main event loop");
    Ok(())
}
