//! Host canonicalization: IP literals and registrable names.

use crate::idna;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Canonicalize a percent-decoded host. Returns the canonical text: a
/// dotted-quad IPv4, an RFC 5952 IPv6 without brackets, or a lower-cased
/// A-label domain. `None` if the host is not valid.
pub fn canonicalize_host(host: &str) -> Option<String> {
    if host.contains(':') {
        // ipv6 literals arrive with or without brackets; the canonical
        // form carries none
        let inner = match (host.starts_with('['), host.ends_with(']')) {
            (true, true) => &host[1..host.len() - 1],
            (false, false) => host,
            _ => return None,
        };
        let address: Ipv6Addr = inner.parse().ok()?;
        return Some(address.to_string());
    }

    if looks_like_ipv4(host) {
        let address: Ipv4Addr = host.parse().ok()?;
        return Some(address.to_string());
    }

    let ascii = idna::to_ascii(host)?;
    let ascii = ascii.strip_suffix('.').unwrap_or(&ascii).to_string();
    if ascii.is_empty() || ascii.bytes().any(is_forbidden_host_byte) {
        return None;
    }
    Some(ascii)
}

/// Whether `host` is an IP address literal rather than a name. Purely
/// syntactic: all digits-and-dots reads as an IPv4 candidate, anything with
/// a colon as IPv6.
pub fn can_parse_as_ip_address(host: &str) -> bool {
    if host.contains(':') {
        return true;
    }
    looks_like_ipv4(host)
}

fn looks_like_ipv4(host: &str) -> bool {
    !host.is_empty() && host.bytes().all(|b| b.is_ascii_digit() || b == b'.')
}

fn is_forbidden_host_byte(byte: u8) -> bool {
    matches!(
        byte,
        0x00..=0x1f | 0x7f | b' ' | b'#' | b'%' | b'/' | b':' | b'?' | b'@' | b'[' | b'\\' | b']'
    )
}
