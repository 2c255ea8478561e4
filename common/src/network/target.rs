//! # Scan Target Model
//!
//! Defines the possible inputs for a scan and expands them into candidate
//! addresses.
//!
//! A target string can be:
//! * A single IPv4 address (e.g. `192.168.1.5`).
//! * An IPv4 range (e.g. `192.168.1.1-100` or `10.0.0.1-10.0.1.20`).
//! * A CIDR block (e.g. `192.168.1.0/24`).
//! * A comma separated mix of the above.

use std::collections::BTreeSet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::error::{ReconError, Result};
use crate::network::range::{Ipv4Range, NetworkRange};

/// Default cap on the addresses a single target may expand to.
pub const MAX_EXPANSION: u64 = 1 << 20;

/// Represents a distinct target to be scanned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// A single host, probed as-is.
    Host { target_addr: Ipv4Addr },
    /// An explicit inclusive range, every address is probed.
    Range { ipv4_range: Ipv4Range },
    /// A CIDR block, expanded with subnetting rules.
    Network { network: NetworkRange },
    /// Holds a list of different targets.
    Multi { targets: Vec<Target> },
}

impl FromStr for Target {
    type Err = ReconError;

    /// Parses a string into a `Target`.
    ///
    /// Supported formats:
    /// * **Host**: `192.168.1.5`.
    /// * **Range**: `Start-End` (`192.168.1.1-50`, `192.168.1.1-192.168.1.50`).
    /// * **CIDR**: `Network/Prefix` (`192.168.1.0/24`).
    /// * **List**: any of the above separated by commas.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() {
            return Err(ReconError::config("empty target"));
        }

        if s.contains(',') {
            return parse_commas(s);
        }

        if let Some(target) = parse_host(s) {
            return Ok(target);
        }

        if let Some(target) = parse_ip_range(s)? {
            return Ok(target);
        }

        if let Some(target) = parse_cidr_range(s)? {
            return Ok(target);
        }

        Err(ReconError::config(format!("invalid target: {s}")))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Host { target_addr } => write!(f, "{target_addr}"),
            Target::Range { ipv4_range } => {
                write!(f, "{}-{}", ipv4_range.start_addr, ipv4_range.end_addr)
            }
            Target::Network { network } => {
                write!(f, "{}/{}", network.network_addr(), network.prefix())
            }
            Target::Multi { targets } => {
                let parts: Vec<String> = targets.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

impl Target {
    /// Number of addresses this target produces before deduplication.
    pub fn candidate_count(&self) -> u64 {
        match self {
            Target::Host { .. } => 1,
            Target::Range { ipv4_range } => ipv4_range.len(),
            Target::Network { network } => network.host_count(),
            Target::Multi { targets } => targets.iter().map(Target::candidate_count).sum(),
        }
    }

    /// Expands into candidate addresses under the default [`MAX_EXPANSION`] cap.
    pub fn expand(&self) -> Result<Vec<IpAddr>> {
        self.expand_within(MAX_EXPANSION)
    }

    /// Expands into candidate addresses: deduplicated, ascending by numeric value.
    ///
    /// A target larger than `limit` is refused before anything is allocated; the
    /// caller raises `limit` to sweep bigger blocks.
    pub fn expand_within(&self, limit: u64) -> Result<Vec<IpAddr>> {
        let count = self.candidate_count();
        if count > limit {
            return Err(ReconError::config(format!(
                "target {self} expands to {count} addresses, the limit is {limit}"
            )));
        }

        let mut addrs: BTreeSet<IpAddr> = BTreeSet::new();
        self.collect_into(&mut addrs);
        Ok(addrs.into_iter().collect())
    }

    fn collect_into(&self, addrs: &mut BTreeSet<IpAddr>) {
        match self {
            Target::Host { target_addr } => {
                addrs.insert(IpAddr::V4(*target_addr));
            }
            Target::Range { ipv4_range } => addrs.extend(ipv4_range.to_iter()),
            Target::Network { network } => addrs.extend(network.hosts()),
            Target::Multi { targets } => {
                for target in targets {
                    target.collect_into(addrs);
                }
            }
        }
    }
}

/// Parses a comma-separated list of targets (e.g. `192.168.1.5, 10.0.0.1-50`).
pub fn parse_commas(s: &str) -> Result<Target> {
    let mut targets = Vec::new();

    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let target = Target::from_str(part)
            .map_err(|e| ReconError::config(format!("failed to parse target '{part}': {e}")))?;

        targets.push(target);
    }

    if targets.is_empty() {
        return Err(ReconError::config(format!("no targets in '{s}'")));
    }

    Ok(Target::Multi { targets })
}

/// Parses a single IPv4 address.
fn parse_host(s: &str) -> Option<Target> {
    s.parse::<Ipv4Addr>()
        .ok()
        .map(|target_addr| Target::Host { target_addr })
}

/// Parses a range string like "1.1.1.1-2.2.2.2" or "1.1.1.1-50".
fn parse_ip_range(s: &str) -> Result<Option<Target>> {
    let Some((start_str, end_str)) = s.split_once('-') else {
        return Ok(None);
    };

    let start_addr = start_str
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|e| ReconError::config(format!("invalid start IP in range '{start_str}': {e}")))?;

    let end_addr = parse_range_end_addr(end_str.trim(), &start_addr, s)?;

    let ipv4_range = Ipv4Range::new(start_addr, end_addr)?;
    Ok(Some(Target::Range { ipv4_range }))
}

/// Helper to parse the end address of a range.
///
/// Handles abbreviated forms like "192.168.1.1-50" (implies 192.168.1.50)
/// and full forms like "192.168.1.1-192.168.1.255".
fn parse_range_end_addr(end_str: &str, start_addr: &Ipv4Addr, original_s: &str) -> Result<Ipv4Addr> {
    if let Ok(full_addr) = end_str.parse::<Ipv4Addr>() {
        return Ok(full_addr);
    }

    if end_str.is_empty() {
        return Err(ReconError::config(format!("end range cannot be empty: {original_s}")));
    }

    let mut end_octets = start_addr.octets();
    let partial_octets: Vec<u8> = end_str
        .split('.')
        .map(|octet_str| octet_str.parse::<u8>())
        .collect::<std::result::Result<Vec<u8>, _>>()
        .map_err(|e| ReconError::config(format!("invalid end range '{end_str}': {e}")))?;

    if partial_octets.len() > 4 {
        return Err(ReconError::config(format!("end range has too many octets: {end_str}")));
    }

    let start_index = 4 - partial_octets.len();
    end_octets[start_index..].copy_from_slice(&partial_octets);

    Ok(Ipv4Addr::from(end_octets))
}

/// Parses CIDR notation like "192.168.1.0/24".
fn parse_cidr_range(s: &str) -> Result<Option<Target>> {
    let Some((ip_str, prefix_str)) = s.split_once('/') else {
        return Ok(None);
    };

    let ipv4_addr = ip_str
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|e| ReconError::config(format!("invalid IP in CIDR '{ip_str}': {e}")))?;

    let prefix = prefix_str
        .trim()
        .parse::<u8>()
        .map_err(|e| ReconError::config(format!("invalid prefix in CIDR '{prefix_str}': {e}")))?;

    let network = NetworkRange::new(ipv4_addr, prefix)?;

    Ok(Some(Target::Network { network }))
}

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

    fn ip(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn test_parse_range_end_addr_helper() {
        let start = Ipv4Addr::new(192, 168, 1, 10);
        let s = "192.168.1.10-255";

        assert_eq!(
            parse_range_end_addr("192.168.1.50", &start, s),
            Ok(Ipv4Addr::new(192, 168, 1, 50))
        );
        assert_eq!(
            parse_range_end_addr("50", &start, s),
            Ok(Ipv4Addr::new(192, 168, 1, 50))
        );
        assert_eq!(
            parse_range_end_addr("2.66", &start, s),
            Ok(Ipv4Addr::new(192, 168, 2, 66))
        );
        assert_eq!(
            parse_range_end_addr("10.2.1", &start, s),
            Ok(Ipv4Addr::new(192, 10, 2, 1))
        );

        // --- Error Cases ---
        assert!(parse_range_end_addr("2.256", &start, "192.168.1.10-2.256").is_err());
        assert!(parse_range_end_addr("1.2.3.4.5", &start, "192.168.1.10-1.2.3.4.5").is_err());
        assert!(parse_range_end_addr("", &start, "192.168.1.10-").is_err());
    }

    #[test]
    fn test_from_str_full_parsing() {
        assert!(matches!(
            Target::from_str("1.1.1.1"),
            Ok(Target::Host { .. })
        ));
        assert!(matches!(
            Target::from_str("10.0.0.1-10.0.0.255"),
            Ok(Target::Range { .. })
        ));
        assert!(matches!(
            Target::from_str("192.168.1.1-2.255"),
            Ok(Target::Range { .. })
        ));
        assert!(matches!(
            Target::from_str("10.0.0.0/24"),
            Ok(Target::Network { .. })
        ));
        assert!(matches!(
            Target::from_str("10.0.0.1, 10.0.1.0/30"),
            Ok(Target::Multi { .. })
        ));

        assert!(Target::from_str("not-an-ip").is_err());
        assert!(Target::from_str("10.0.0.1/33").is_err());
        assert!(Target::from_str("10.0.0.256-1.1.1.1").is_err());
        assert!(Target::from_str("10.0.0.9-3").is_err());
        assert!(Target::from_str("").is_err());
        assert!(Target::from_str(" , ").is_err());
    }

    #[test]
    fn cidr_expansion_drops_network_and_broadcast() {
        let target = Target::from_str("10.0.0.0/30").unwrap();
        assert_eq!(target.expand().unwrap(), vec![ip(10, 0, 0, 1), ip(10, 0, 0, 2)]);

        let target = Target::from_str("192.168.1.0/24").unwrap();
        let hosts = target.expand().unwrap();
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts.first(), Some(&ip(192, 168, 1, 1)));
        assert_eq!(hosts.last(), Some(&ip(192, 168, 1, 254)));
    }

    #[test]
    fn multi_target_expansion_is_sorted_and_deduplicated() {
        let target = Target::from_str("10.0.0.9, 10.0.0.0/29, 10.0.0.2-3, 9.9.9.9").unwrap();
        let hosts = target.expand().unwrap();
        assert_eq!(
            hosts,
            vec![
                ip(9, 9, 9, 9),
                ip(10, 0, 0, 1),
                ip(10, 0, 0, 2),
                ip(10, 0, 0, 3),
                ip(10, 0, 0, 4),
                ip(10, 0, 0, 5),
                ip(10, 0, 0, 6),
                ip(10, 0, 0, 9),
            ]
        );
    }

    #[test]
    fn oversized_targets_are_rejected() {
        let target = Target::from_str("10.0.0.0/8").unwrap();
        assert!(matches!(target.expand(), Err(ReconError::Configuration(_))));
    }

    #[test]
    fn large_blocks_are_counted_and_bounded_by_the_caller() {
        let target = Target::from_str("10.0.0.0/11").unwrap();
        assert_eq!(target.candidate_count(), (1 << 21) - 2);
        assert!(matches!(target.expand(), Err(ReconError::Configuration(_))));

        let target = Target::from_str("192.168.1.0/24").unwrap();
        assert!(target.expand_within(253).is_err());
        assert_eq!(target.expand_within(254).unwrap().len(), 254);
    }

    #[test]
    fn display_normalises_the_network_address() {
        let target = Target::from_str("10.0.0.7/30").unwrap();
        assert_eq!(target.to_string(), "10.0.0.4/30");
    }
}
