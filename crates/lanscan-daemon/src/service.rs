//! Periodic scan-and-report loop

use lanscan_discovery::DiscoveryScanner;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::report::Reporter;

/// Devices logged individually at debug level after each scan
const LOGGED_DEVICES: usize = 3;

/// Runs one discovery scan per interval and reports the results
pub struct ScanService {
    scanner: DiscoveryScanner,
    reporter: Reporter,
    interval: Duration,
}

impl ScanService {
    pub fn new(scanner: DiscoveryScanner, reporter: Reporter, interval: Duration) -> Self {
        Self {
            scanner,
            reporter,
            interval,
        }
    }

    /// Scan once and hand the devices to the collector
    ///
    /// Delivery failures are logged; they never affect the next cycle.
    pub async fn run_cycle(&self) -> usize {
        info!("Scan started");

        let report = self.scanner.scan_report().await;
        let devices = report.devices;

        if devices.is_empty() {
            warn!("No devices found on the network");
        } else {
            info!(
                found = devices.len(),
                strategy = %report.strategy.map(|s| s.to_string()).unwrap_or_default(),
                "Found devices on the network"
            );
            for (i, device) in devices.iter().take(LOGGED_DEVICES).enumerate() {
                debug!("Device {}: {}", i + 1, device);
            }

            match self.reporter.send(&devices).await {
                Ok(()) => info!(url = %self.reporter.url(), "Device list delivered"),
                Err(e) => warn!(error = %e, "Failed to deliver device list"),
            }
        }

        info!("Scan finished");
        devices.len()
    }

    /// Scan and report forever, idling `interval` between cycles
    pub async fn run(&self) {
        loop {
            self.run_cycle().await;
            info!("Waiting {} seconds before next scan", self.interval.as_secs());
            tokio::time::sleep(self.interval).await;
        }
    }
}
