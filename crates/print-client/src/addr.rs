//! Printer address resolution.

use std::net::{SocketAddr, ToSocketAddrs};

use crate::PrintError;

/// The conventional RAW/JetDirect port ZPL printers listen on.
pub const DEFAULT_PORT: u16 = 9100;

/// Resolve a printer target string to a socket address.
///
/// Accepted forms: `IP`, `IP:PORT`, `hostname`, `hostname:PORT`. Without an
/// explicit port, [`DEFAULT_PORT`] is used. Hostnames resolve via the
/// system resolver; the first address wins.
pub fn resolve_printer_addr(target: &str) -> Result<SocketAddr, PrintError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(PrintError::InvalidAddress(target.to_owned()));
    }

    // A literal socket address needs no resolver round trip.
    if let Ok(addr) = target.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = target.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    let (host, port) = match target.rsplit_once(':') {
        Some((host, port_str)) if !host.is_empty() => {
            let port = port_str
                .parse::<u16>()
                .map_err(|_| PrintError::InvalidAddress(target.to_owned()))?;
            (host, port)
        }
        Some(_) => return Err(PrintError::InvalidAddress(target.to_owned())),
        None => (target, DEFAULT_PORT),
    };

    (host, port)
        .to_socket_addrs()
        .map_err(|_| PrintError::NoAddressFound(host.to_owned()))?
        .next()
        .ok_or_else(|| PrintError::NoAddressFound(host.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_ip_gets_default_port() {
        let addr = resolve_printer_addr("192.168.1.50").unwrap();
        assert_eq!(addr.to_string(), "192.168.1.50:9100");
    }

    #[test]
    fn explicit_port_is_kept() {
        let addr = resolve_printer_addr("192.168.1.50:6101").unwrap();
        assert_eq!(addr.port(), 6101);
    }

    #[test]
    fn ipv6_literal_with_port() {
        let addr = resolve_printer_addr("[::1]:9100").unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), 9100);
    }

    #[test]
    fn empty_target_is_invalid() {
        assert!(matches!(
            resolve_printer_addr("  "),
            Err(PrintError::InvalidAddress(_))
        ));
    }

    #[test]
    fn garbage_port_is_invalid() {
        assert!(matches!(
            resolve_printer_addr("printer:notaport"),
            Err(PrintError::InvalidAddress(_))
        ));
    }

    #[test]
    fn localhost_resolves() {
        let addr = resolve_printer_addr("localhost:9100").unwrap();
        assert_eq!(addr.port(), 9100);
    }
}
