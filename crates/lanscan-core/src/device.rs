//! Device types produced by a discovery scan

use chrono::{DateTime, Local};
use serde::Serialize;
use std::net::Ipv4Addr;

use crate::address::{normalize_mac, parse_ipv4, AddressError};

/// Hostname reported when no name could be resolved
pub const UNKNOWN_HOSTNAME: &str = "Unknown";

/// A device record as extracted from tool output, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDevice {
    pub ip: String,
    pub mac: String,
    pub hostname: String,
}

impl RawDevice {
    pub fn new(ip: impl Into<String>, mac: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            mac: mac.into(),
            hostname: hostname.into(),
        }
    }

    /// Create a record whose hostname is not known
    pub fn unnamed(ip: impl Into<String>, mac: impl Into<String>) -> Self {
        Self::new(ip, mac, UNKNOWN_HOSTNAME)
    }
}

impl From<&Device> for RawDevice {
    fn from(device: &Device) -> Self {
        Self::new(device.ip.to_string(), device.mac.clone(), device.hostname.clone())
    }
}

/// A validated device seen during one scan cycle
///
/// Fields are read-only; a `Device` can only be built from addresses that
/// pass validation, and its MAC is always in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    ip: Ipv4Addr,
    mac: String,
    hostname: String,
    last_seen: DateTime<Local>,
}

impl Device {
    /// Build a device from already-parsed parts, normalizing the MAC
    pub fn new(
        ip: Ipv4Addr,
        mac: &str,
        hostname: &str,
        last_seen: DateTime<Local>,
    ) -> Result<Self, AddressError> {
        let hostname = hostname.trim();
        Ok(Self {
            ip,
            mac: normalize_mac(mac)?,
            hostname: if hostname.is_empty() {
                UNKNOWN_HOSTNAME.to_string()
            } else {
                hostname.to_string()
            },
            last_seen,
        })
    }

    /// Build a device from a raw record
    pub fn from_raw(raw: &RawDevice, last_seen: DateTime<Local>) -> Result<Self, AddressError> {
        let ip = parse_ipv4(&raw.ip).ok_or_else(|| AddressError::InvalidFormat(raw.ip.clone()))?;
        Self::new(ip, &raw.mac, &raw.hostname, last_seen)
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn mac(&self) -> &str {
        &self.mac
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn last_seen(&self) -> DateTime<Local> {
        self.last_seen
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.ip, self.mac, self.hostname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_from_raw() {
        let now = Local::now();
        let raw = RawDevice::new("192.168.1.10", "AA-BB-CC-DD-EE-FF", "printer.lan");
        let device = Device::from_raw(&raw, now).unwrap();
        assert_eq!(device.ip(), Ipv4Addr::new(192, 168, 1, 10));
        assert_eq!(device.mac(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(device.hostname(), "printer.lan");
        assert_eq!(device.last_seen(), now);
    }

    #[test]
    fn test_blank_hostname_becomes_unknown() {
        let raw = RawDevice::new("10.0.0.1", "aa:bb:cc:dd:ee:ff", "  ");
        let device = Device::from_raw(&raw, Local::now()).unwrap();
        assert_eq!(device.hostname(), UNKNOWN_HOSTNAME);
    }

    #[test]
    fn test_invalid_ip_rejected() {
        let raw = RawDevice::unnamed("10.0.0", "aa:bb:cc:dd:ee:ff");
        assert!(Device::from_raw(&raw, Local::now()).is_err());
    }

    #[test]
    fn test_wire_shape() {
        let raw = RawDevice::unnamed("10.0.0.1", "aa:bb:cc:dd:ee:ff");
        let device = Device::from_raw(&raw, Local::now()).unwrap();
        let json = serde_json::to_value(&device).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 4);
        assert_eq!(object["ip"], "10.0.0.1");
        assert_eq!(object["mac"], "aa:bb:cc:dd:ee:ff");
        assert_eq!(object["hostname"], "Unknown");

        let last_seen = object["last_seen"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(last_seen).is_ok());
    }

    #[test]
    fn test_raw_round_trip_from_device() {
        let raw = RawDevice::new("10.0.0.1", "aa:bb:cc:dd:ee:ff", "nas");
        let device = Device::from_raw(&raw, Local::now()).unwrap();
        assert_eq!(RawDevice::from(&device), raw);
    }
}
