//! IPv4 and MAC address validation
//!
//! Platform tools print addresses in slightly different shapes. These
//! functions decide what counts as a usable address and bring MACs into the
//! canonical `aa:bb:cc:dd:ee:ff` form used as the dedup key.

use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address format: {0}")]
    InvalidFormat(String),
}

/// Number of hex digits in a 48-bit hardware address
const MAC_HEX_DIGITS: usize = 12;

/// Parse a dotted-quad IPv4 address.
///
/// Each of the four octets must be 1-3 ASCII digits with a value in
/// `0..=255`. Leading zeros are read as decimal (`010` is 10), but an octet
/// longer than three digits is rejected even when its value fits, so
/// `0001.2.3.4` is not an address.
pub fn parse_ipv4(s: &str) -> Option<Ipv4Addr> {
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() != 4 {
        return None;
    }

    let mut octets = [0u8; 4];
    for (slot, part) in octets.iter_mut().zip(&parts) {
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse::<u8>().ok()?;
    }

    Some(Ipv4Addr::from(octets))
}

/// Check whether a string is a well-formed IPv4 address
pub fn is_valid_ipv4(s: &str) -> bool {
    parse_ipv4(s).is_some()
}

/// Check whether a string is a MAC address
///
/// Accepts six groups of 1-2 hex digits separated uniformly by `:` or `-`,
/// e.g. `aa:bb:cc:dd:ee:ff`, `AA-BB-CC-DD-EE-FF` or `0:1b:63:84:45:e6`.
pub fn is_valid_mac(s: &str) -> bool {
    mac_groups(s).is_some()
}

/// Split a grouped MAC into its six groups, or `None` if it is not one
fn mac_groups(s: &str) -> Option<Vec<&str>> {
    let separator = if s.contains(':') {
        ':'
    } else if s.contains('-') {
        '-'
    } else {
        return None;
    };

    let groups: Vec<&str> = s.split(separator).collect();
    if groups.len() != 6 {
        return None;
    }

    let well_formed = groups
        .iter()
        .all(|g| (1..=2).contains(&g.len()) && g.chars().all(|c| c.is_ascii_hexdigit()));

    well_formed.then_some(groups)
}

/// Normalize a MAC address to lowercase colon-separated pairs.
///
/// Grouped input has each group zero-padded first, so the short form that
/// BSD `arp` prints keeps its meaning. Anything else has its non-hex
/// characters stripped. Only the first 12 hex digits are used; some tools
/// append trailing garbage.
pub fn normalize_mac(s: &str) -> Result<String, AddressError> {
    let hex: String = match mac_groups(s) {
        Some(groups) => groups.iter().map(|g| format!("{:0>2}", g)).collect(),
        None => s.chars().filter(|c| c.is_ascii_hexdigit()).collect(),
    };

    if hex.len() < MAC_HEX_DIGITS {
        return Err(AddressError::InvalidFormat(s.to_string()));
    }

    let hex = hex[..MAC_HEX_DIGITS].to_ascii_lowercase();
    let pairs: Vec<&str> = (0..MAC_HEX_DIGITS)
        .step_by(2)
        .map(|i| &hex[i..i + 2])
        .collect();

    Ok(pairs.join(":"))
}
