//! Service probes sent right after a banner connection is established.
//!
//! Many services (FTP, SSH, POP3, IMAP, SMTP) greet unprompted, so their probe is
//! empty. HTTP-like services say nothing until asked.

use std::collections::BTreeMap;
use std::net::IpAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceProbe {
    /// Wait for the service to talk first.
    Null,
    /// `GET / HTTP/1.0` with a `Host` header naming the target.
    Http,
    /// `EHLO`, prompting the capability list after the greeting.
    Smtp,
    /// RESP `PING`.
    Redis,
    /// Caller-supplied bytes.
    Raw(Vec<u8>),
}

impl ServiceProbe {
    pub fn payload(&self, host: &IpAddr) -> Vec<u8> {
        match self {
            ServiceProbe::Null => Vec::new(),
            ServiceProbe::Http => format!("GET / HTTP/1.0\r\nHost: {host}\r\nUser-Agent: sweepr\r\n\r\n").into_bytes(),
            ServiceProbe::Smtp => b"EHLO sweepr\r\n".to_vec(),
            ServiceProbe::Redis => b"*1\r\n$4\r\nPING\r\n".to_vec(),
            ServiceProbe::Raw(bytes) => bytes.clone(),
        }
    }
}

/// Default probe per port. Ports missing from the table use [`ServiceProbe::Null`].
pub fn default_probes() -> BTreeMap<u16, ServiceProbe> {
    BTreeMap::from([
        (25, ServiceProbe::Smtp),
        (587, ServiceProbe::Smtp),
        (80, ServiceProbe::Http),
        (443, ServiceProbe::Http),
        (8000, ServiceProbe::Http),
        (8080, ServiceProbe::Http),
        (8443, ServiceProbe::Http),
        (8888, ServiceProbe::Http),
        (6379, ServiceProbe::Redis),
    ])
}

/// Ports that speak TLS from the first byte.
pub const DEFAULT_SECURE_PORTS: [u16; 6] = [443, 465, 636, 993, 995, 8443];

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn greeting_services_use_empty_probes() {
        let probes = default_probes();
        for port in [21, 22, 110, 143, 993] {
            assert!(!probes.contains_key(&port), "port {port} should greet unprompted");
        }
        assert!(ServiceProbe::Null.payload(&IpAddr::V4(Ipv4Addr::LOCALHOST)).is_empty());
    }

    #[test]
    fn http_probe_names_the_target_host() {
        let host = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let payload = String::from_utf8(ServiceProbe::Http.payload(&host)).unwrap();
        assert!(payload.starts_with("GET / HTTP/1.0\r\n"));
        assert!(payload.contains("Host: 10.0.0.1\r\n"));
        assert!(payload.ends_with("\r\n\r\n"));
    }

    #[test]
    fn web_ports_get_an_http_request() {
        let probes = default_probes();
        assert_eq!(probes.get(&80), Some(&ServiceProbe::Http));
        assert_eq!(probes.get(&443), Some(&ServiceProbe::Http));
        assert_eq!(probes.get(&25), Some(&ServiceProbe::Smtp));
    }
}
