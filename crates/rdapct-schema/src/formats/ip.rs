//! IP address syntax and registry checks.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;

/// Dot-decimal IPv4 pattern used by the shipped schemas.
pub const IPV4_DOT_DECIMAL_PATTERN: &str = r"^(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])(\.(25[0-5]|2[0-4][0-9]|1[0-9]{2}|[1-9]?[0-9])){3}$";

static DOT_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{1,3}(\.[0-9]{1,3}){3}$").expect("static regex"));

/// Whether a string in an address slot counts as an attempt at an IP
/// address. Anything non-blank does, however malformed.
pub fn looks_like_ip_attempt(subject: &str) -> bool {
    !subject.trim().is_empty()
}

/// Strict dot-decimal IPv4 syntax: four decimal octets in range, no
/// leading zeros.
pub fn is_valid_ipv4_syntax(subject: &str) -> bool {
    DOT_DECIMAL.is_match(subject) && subject.parse::<Ipv4Addr>().is_ok()
}

pub fn is_valid_ipv6_syntax(subject: &str) -> bool {
    subject.parse::<Ipv6Addr>().is_ok()
}

/// An address prefix in CIDR notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpPrefix {
    network: IpAddr,
    length: u8,
}

impl IpPrefix {
    /// Parse `a.b.c.d/n` or `x::/n`. A bare address is a host prefix.
    pub fn parse(text: &str) -> Option<Self> {
        let (addr, length) = match text.split_once('/') {
            Some((addr, len)) => (addr, Some(len.parse::<u8>().ok()?)),
            None => (text, None),
        };
        let network: IpAddr = addr.trim().parse().ok()?;
        let max = match network {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        let length = length.unwrap_or(max);
        (length <= max).then_some(Self { network, length })
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self.network, addr) {
            (IpAddr::V4(net), IpAddr::V4(a)) => {
                let mask = mask_u32(self.length);
                u32::from(net) & mask == u32::from(a) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(a)) => {
                let mask = mask_u128(self.length);
                u128::from(net) & mask == u128::from(a) & mask
            }
            _ => false,
        }
    }
}

fn mask_u32(length: u8) -> u32 {
    if length == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(length))
    }
}

fn mask_u128(length: u8) -> u128 {
    if length == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(length))
    }
}

/// Whether any prefix in `prefixes` contains `addr`. Unparseable prefixes
/// are skipped.
pub fn any_contains<'a>(prefixes: impl IntoIterator<Item = &'a String>, addr: IpAddr) -> bool {
    prefixes
        .into_iter()
        .filter_map(|p| IpPrefix::parse(p))
        .any(|p| p.contains(addr))
}
