//! lanscan Daemon - Main entry point
//!
//! Scans the local network on a fixed interval and posts the devices it
//! finds to an HTTP collector.

mod config;
mod report;
mod service;

use anyhow::Result;
use clap::Parser;
use lanscan_discovery::{DiscoveryScanner, Platform, ScanContext};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::report::Reporter;
use crate::service::ScanService;

#[derive(Parser, Debug)]
#[command(name = "lanscan")]
#[command(about = "Local network device discovery daemon")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "lanscan.toml")]
    config: PathBuf,

    /// Collector endpoint receiving the device list
    #[arg(short = 'u', long)]
    collector_url: Option<String>,

    /// Seconds between scans
    #[arg(short, long)]
    interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Run a single scan, print the devices and exit
    #[arg(long)]
    scan_once: bool,
}

// Strategies and probes run one at a time; a single thread is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let mut config = config::load_config(&args.config)?;

    if let Some(url) = args.collector_url {
        config.collector.url = url;
    }
    if let Some(interval) = args.interval {
        config.scan.interval_secs = interval;
    }

    let platform = Platform::detect();
    info!(platform = %platform, "lanscan v{} starting", env!("CARGO_PKG_VERSION"));

    let scanner_config = config.to_scanner_config(is_root::is_root());
    let ctx = ScanContext::system(
        platform,
        Duration::from_secs(scanner_config.command_timeout_secs),
        Duration::from_millis(scanner_config.hostname_timeout_ms),
    );

    log_environment(&ctx, scanner_config.privileged).await;

    let scanner = DiscoveryScanner::from_context(&scanner_config, ctx);

    if args.scan_once {
        info!("Running single discovery scan");
        let report = scanner.scan_report().await;
        let strategy = report
            .strategy
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".to_string());
        println!("Discovered {} devices (via {}):", report.devices.len(), strategy);
        for device in &report.devices {
            println!(
                "  - {} [{}] {} (seen {})",
                device.ip(),
                device.mac(),
                device.hostname(),
                device.last_seen().to_rfc3339()
            );
        }
        return Ok(());
    }

    let reporter = Reporter::new(
        &config.collector.url,
        Duration::from_secs(config.collector.timeout_secs),
    )?;
    info!(
        collector = %reporter.url(),
        interval_secs = config.scan.interval_secs,
        "Configuration loaded"
    );

    let service = ScanService::new(
        scanner,
        reporter,
        Duration::from_secs(config.scan.interval_secs),
    );

    tokio::select! {
        _ = service.run() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for interrupt");
            }
            info!("Stopping network scanner");
        }
    }

    Ok(())
}

/// Log which discovery tools and network scope are available
async fn log_environment(ctx: &ScanContext, privileged: bool) {
    let has_arp_scan = ctx.runner.is_available("arp-scan").await;

    if has_arp_scan {
        info!("arp-scan is available");
        if !privileged {
            warn!("Running without root privileges; arp-scan will be skipped");
        }
    } else {
        warn!("arp-scan is not installed, using alternative methods");
    }

    match ctx.interfaces.resolve().await {
        Some(iface) => info!(interface = %iface.name, ip = %iface.ip, "Default network interface"),
        None => warn!("Could not determine default interface; ping sweep disabled"),
    }
}
