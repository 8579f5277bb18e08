//! lanscan Core - Device model, address validation, and normalization
//!
//! This crate provides the foundational types for lanscan:
//! - IPv4 and MAC address validation and MAC canonicalization
//! - Raw and validated device records
//! - The per-cycle normalization and MAC deduplication pass

pub mod address;
pub mod device;
pub mod normalize;

pub use address::{is_valid_ipv4, is_valid_mac, normalize_mac, parse_ipv4, AddressError};
pub use device::{Device, RawDevice, UNKNOWN_HOSTNAME};
pub use normalize::normalize;
