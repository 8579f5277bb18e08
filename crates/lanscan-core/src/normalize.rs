//! Validation and MAC-based deduplication of raw scan results

use chrono::{DateTime, Local};
use std::collections::HashSet;
use tracing::debug;

use crate::address::{is_valid_ipv4, is_valid_mac};
use crate::device::{Device, RawDevice};

/// Turn a raw device list into the canonical list for one scan cycle.
///
/// Records with an invalid IP or MAC are dropped. The MAC is the identity:
/// when two records share a normalized MAC only the first one is kept.
/// Every surviving device is stamped with the same `last_seen`.
pub fn normalize(raw: &[RawDevice], last_seen: DateTime<Local>) -> Vec<Device> {
    let mut seen_macs = HashSet::new();
    let mut devices = Vec::with_capacity(raw.len());

    for record in raw {
        if !is_valid_ipv4(&record.ip) || !is_valid_mac(&record.mac) {
            debug!(ip = %record.ip, mac = %record.mac, "Skipping record with invalid address");
            continue;
        }

        let device = match Device::from_raw(record, last_seen) {
            Ok(device) => device,
            Err(e) => {
                debug!(ip = %record.ip, error = %e, "Skipping malformed record");
                continue;
            }
        };

        if !seen_macs.insert(device.mac().to_string()) {
            debug!(ip = %device.ip(), mac = %device.mac(), "Skipping duplicate MAC");
            continue;
        }

        devices.push(device);
    }

    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_seen() {
        let raw = vec![
            RawDevice::unnamed("10.0.0.1", "AA:BB:CC:DD:EE:FF"),
            RawDevice::unnamed("10.0.0.2", "aa:bb:cc:dd:ee:ff"),
        ];
        let devices = normalize(&raw, Local::now());
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].ip().to_string(), "10.0.0.1");
        assert_eq!(devices[0].mac(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_dedup_across_separators() {
        let raw = vec![
            RawDevice::unnamed("10.0.0.1", "aa-bb-cc-dd-ee-ff"),
            RawDevice::unnamed("10.0.0.1", "aa:bb:cc:dd:ee:ff"),
            RawDevice::unnamed("10.0.0.3", "11:22:33:44:55:66"),
        ];
        let devices = normalize(&raw, Local::now());
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[1].mac(), "11:22:33:44:55:66");
    }

    #[test]
    fn test_invalid_records_skipped() {
        let raw = vec![
            RawDevice::unnamed("10.0.0.1", "zz:zz:zz:zz:zz:zz"),
            RawDevice::unnamed("300.0.0.1", "aa:bb:cc:dd:ee:01"),
            RawDevice::unnamed("10.0.0.2", "(incomplete)"),
            RawDevice::unnamed("10.0.0.3", "aa:bb:cc:dd:ee:03"),
        ];
        let devices = normalize(&raw, Local::now());
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].ip().to_string(), "10.0.0.3");
    }

    #[test]
    fn test_single_timestamp_per_cycle() {
        let now = Local::now();
        let raw = vec![
            RawDevice::unnamed("10.0.0.1", "aa:bb:cc:dd:ee:01"),
            RawDevice::unnamed("10.0.0.2", "aa:bb:cc:dd:ee:02"),
        ];
        let devices = normalize(&raw, now);
        assert!(devices.iter().all(|d| d.last_seen() == now));
    }

    #[test]
    fn test_preserves_input_order() {
        let raw = vec![
            RawDevice::unnamed("10.0.0.9", "aa:bb:cc:dd:ee:09"),
            RawDevice::unnamed("10.0.0.1", "aa:bb:cc:dd:ee:01"),
            RawDevice::unnamed("10.0.0.5", "aa:bb:cc:dd:ee:05"),
        ];
        let ips: Vec<String> = normalize(&raw, Local::now())
            .iter()
            .map(|d| d.ip().to_string())
            .collect();
        assert_eq!(ips, vec!["10.0.0.9", "10.0.0.1", "10.0.0.5"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let now = Local::now();
        let raw = vec![
            RawDevice::new("10.0.0.1", "AA:BB:CC:DD:EE:FF", "router"),
            RawDevice::unnamed("10.0.0.2", "aa-bb-cc-dd-ee-ff"),
            RawDevice::unnamed("10.0.0.3", "0:1b:63:84:45:e6"),
        ];
        let first = normalize(&raw, now);
        let again: Vec<RawDevice> = first.iter().map(RawDevice::from).collect();
        let second = normalize(&again, now);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize(&[], Local::now()).is_empty());
    }
}
