//! Conversion of the multiaddr strings stored in the config
//! (`/ip4/127.0.0.1/tcp/5001`) into something a TCP client can dial.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// A connectable network / host pair derived from a multiaddr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialArgs {
    /// Transport protocol, currently always `tcp`
    pub network: &'static str,
    /// `host:port`, with IPv6 hosts bracketed
    pub host: String,
}

impl fmt::Display for DialArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.host)
    }
}

/// Derive dial arguments from a multiaddr of the form
/// `/<ip4|ip6|dns|dns4|dns6>/<host>/tcp/<port>`.
///
/// Only those dialable TCP forms are accepted. `/unix`, `/dnsaddr` and
/// encapsulated addresses such as `/p2p/...` suffixes are rejected.
pub fn dial_args(multiaddr: &str) -> Result<DialArgs, AddrError> {
    let parts: Vec<&str> = multiaddr.split('/').collect();
    // leading '/' yields an empty first segment
    if parts.first().map(|p| !p.is_empty()).unwrap_or(true) {
        return Err(AddrError::Invalid(multiaddr.to_string()));
    }

    let parts = &parts[1..];
    if parts.len() != 4 {
        return Err(AddrError::Invalid(multiaddr.to_string()));
    }

    let (proto, host, transport, port) = (parts[0], parts[1], parts[2], parts[3]);

    if transport != "tcp" {
        return Err(AddrError::UnsupportedTransport(transport.to_string()));
    }
    let port: u16 = port
        .parse()
        .map_err(|_| AddrError::InvalidPort(port.to_string()))?;

    let host = match proto {
        "ip4" => {
            let ip: Ipv4Addr = host
                .parse()
                .map_err(|_| AddrError::InvalidHost(host.to_string()))?;
            format!("{}:{}", ip, port)
        }
        "ip6" => {
            let ip: Ipv6Addr = host
                .parse()
                .map_err(|_| AddrError::InvalidHost(host.to_string()))?;
            format!("[{}]:{}", ip, port)
        }
        "dns" | "dns4" | "dns6" => {
            if host.is_empty() {
                return Err(AddrError::InvalidHost(host.to_string()));
            }
            format!("{}:{}", host, port)
        }
        other => return Err(AddrError::UnsupportedProtocol(other.to_string())),
    };

    Ok(DialArgs {
        network: "tcp",
        host,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum AddrError {
    #[error("invalid multiaddr: {0}")]
    Invalid(String),
    #[error("unsupported address protocol: {0}")]
    UnsupportedProtocol(String),
    #[error("unsupported transport: {0}")]
    UnsupportedTransport(String),
    #[error("invalid host: {0}")]
    InvalidHost(String),
    #[error("invalid port: {0}")]
    InvalidPort(String),
}
