//! Normalisation of operator-supplied text
//!
//! DNS lists and endpoints arrive as free text from the command line or the
//! settings file. DNS entries that are not IPv4 addresses are dropped, and an
//! endpoint that does not parse falls back to a caller-chosen default.

use crate::error::{ProvisionError, Result};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use tracing::{debug, warn};

/// Parse a comma-separated DNS list, keeping IPv4 addresses in input order.
///
/// Blank, unparseable and IPv6 entries are skipped without error. IPv4-mapped
/// IPv6 addresses (`::ffff:a.b.c.d`) count as IPv4.
pub fn parse_dns_list(text: &str) -> Vec<IpAddr> {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<IpAddr>() {
            Ok(IpAddr::V4(v4)) => Some(IpAddr::V4(v4)),
            Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
                Some(v4) => Some(IpAddr::V4(v4)),
                None => {
                    debug!(entry, "Dropping non-IPv4 DNS server");
                    None
                }
            },
            Err(_) => {
                debug!(entry, "Dropping unparseable DNS server");
                None
            }
        })
        .collect()
}

/// Externally reachable `host:port` of the server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host name or IP address
    pub host: String,
    /// UDP port
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint from its parts
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Endpoint on the loopback address, used when nothing better is known
    pub fn localhost(port: u16) -> Self {
        Self::new(Ipv4Addr::LOCALHOST.to_string(), port)
    }
}

impl FromStr for Endpoint {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = |reason: &str| {
            ProvisionError::Config(format!(
                "Invalid endpoint '{}': {} (expected host:port)",
                s, reason
            ))
        };

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, port) = rest
                .split_once("]:")
                .ok_or_else(|| invalid("missing ']:' after IPv6 host"))?;
            host.parse::<std::net::Ipv6Addr>()
                .map_err(|_| invalid("bracketed host is not an IPv6 address"))?;
            (host, port)
        } else {
            let (host, port) = s.rsplit_once(':').ok_or_else(|| invalid("missing port"))?;
            if host.contains(':') {
                return Err(invalid("too many colons"));
            }
            (host, port)
        };

        if host.is_empty() {
            return Err(invalid("empty host"));
        }

        let port: u16 = port.parse().map_err(|_| invalid("port is not a number"))?;
        if port == 0 {
            return Err(invalid("port cannot be 0"));
        }

        Ok(Self::new(host, port))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Parse `input` as an endpoint, or use `default` when it is blank or invalid
pub fn resolve_endpoint(input: Option<&str>, default: Endpoint) -> Endpoint {
    match input.map(str::trim).filter(|s| !s.is_empty()) {
        None => default,
        Some(text) => match text.parse::<Endpoint>() {
            Ok(endpoint) => endpoint,
            Err(e) => {
                warn!("{}; falling back to {}", e, default);
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ips(list: &[&str]) -> Vec<IpAddr> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_dns_list_keeps_order() {
        assert_eq!(parse_dns_list("8.8.8.8, 1.1.1.1"), ips(&["8.8.8.8", "1.1.1.1"]));
    }

    #[test]
    fn test_dns_list_drops_invalid_entries() {
        assert_eq!(parse_dns_list("not-an-ip, 1.1.1.1"), ips(&["1.1.1.1"]));
        assert_eq!(parse_dns_list("2001:4860:4860::8888,9.9.9.9"), ips(&["9.9.9.9"]));
        assert_eq!(parse_dns_list(" , ,"), Vec::<IpAddr>::new());
        assert_eq!(parse_dns_list(""), Vec::<IpAddr>::new());
    }

    #[test]
    fn test_dns_list_accepts_mapped_ipv4() {
        assert_eq!(parse_dns_list("::ffff:8.8.4.4"), ips(&["8.8.4.4"]));
    }

    #[test]
    fn test_endpoint_parse() {
        let ep: Endpoint = "vpn.example.com:51820".parse().unwrap();
        assert_eq!(ep, Endpoint::new("vpn.example.com", 51820));
        assert_eq!(ep.to_string(), "vpn.example.com:51820");

        let ep: Endpoint = "[2001:db8::1]:51820".parse().unwrap();
        assert_eq!(ep.host, "2001:db8::1");
        assert_eq!(ep.to_string(), "[2001:db8::1]:51820");
    }

    #[test]
    fn test_endpoint_parse_errors() {
        assert!("vpn.example.com".parse::<Endpoint>().is_err());
        assert!(":51820".parse::<Endpoint>().is_err());
        assert!("host:0".parse::<Endpoint>().is_err());
        assert!("host:70000".parse::<Endpoint>().is_err());
        assert!("2001:db8::1:51820".parse::<Endpoint>().is_err());
        assert!("[nothost]:51820".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_resolve_endpoint_fallback() {
        let default = Endpoint::localhost(40000);
        assert_eq!(resolve_endpoint(None, default.clone()), default);
        assert_eq!(resolve_endpoint(Some("  "), default.clone()), default);
        assert_eq!(resolve_endpoint(Some("garbage"), default.clone()), default);
        assert_eq!(
            resolve_endpoint(Some("198.51.100.7:51820"), default),
            Endpoint::new("198.51.100.7", 51820)
        );
    }
}
