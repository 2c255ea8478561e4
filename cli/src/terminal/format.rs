use colored::*;

use sweepr_common::models::{Banner, BannerPayload, HostRecord};
use sweepr_core::discovery::StrategyOutcome;

use crate::terminal::colors;
use crate::terminal::print::Detail;

/// Longest banner excerpt shown in a tree line.
const MAX_EXCERPT: usize = 48;

/// First non-empty line of `text`, cut at `max` characters.
pub fn excerpt(text: &str, max: usize) -> String {
    let line = text.lines().map(str::trim).find(|line| !line.is_empty()).unwrap_or("");
    if line.chars().count() <= max {
        return line.to_string();
    }
    let cut: String = line.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

pub fn banner_value(banner: &Banner) -> ColoredString {
    match &banner.payload {
        BannerPayload::Text(text) => {
            let mut value = excerpt(text, MAX_EXCERPT);
            if let Some((product, version)) = banner.service_hint() {
                value = format!("{value} ({product} {version})");
            }
            value.color(colors::SERVICE)
        }
        BannerPayload::NoGreeting => banner.payload.to_string().dimmed(),
        BannerPayload::Error(_) => banner.payload.to_string().color(colors::ERROR),
    }
}

/// One tree line per open port: `port/transport` with the banner, or just `open`.
pub fn host_details(record: &HostRecord) -> Vec<Detail> {
    record
        .open_ports
        .ports()
        .iter()
        .map(|port| match record.banners.get(port) {
            Some(banner) => (format!("{port}/{}", banner.transport), banner_value(banner)),
            None => (format!("{port}/tcp"), "open".color(colors::PORT)),
        })
        .collect()
}

pub fn outcome_value(outcome: &StrategyOutcome) -> ColoredString {
    match outcome {
        StrategyOutcome::Found(_) => outcome.to_string().green(),
        StrategyOutcome::Empty => outcome.to_string().normal(),
        StrategyOutcome::Unavailable(_) => outcome.to_string().dimmed(),
    }
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
    use std::collections::BTreeMap;
    use std::net::{IpAddr, Ipv4Addr};
    use sweepr_common::models::{OpenPortSet, TransportKind};

    const HOST: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

    #[test]
    fn excerpt_takes_the_first_non_empty_line() {
        assert_eq!(excerpt("\r\n  SSH-2.0-OpenSSH_8.9\r\nmore", 48), "SSH-2.0-OpenSSH_8.9");
        assert_eq!(excerpt("", 48), "");
    }

    #[test]
    fn excerpt_cuts_long_lines() {
        let cut = excerpt("abcdefghij", 5);
        assert_eq!(cut, "abcd…");
        assert_eq!(cut.chars().count(), 5);
    }

    #[test]
    fn ports_without_banner_are_listed_as_open() {
        let banner = Banner {
            host: HOST,
            port: 443,
            transport: TransportKind::Secure,
            payload: BannerPayload::NoGreeting,
        };
        let record = HostRecord {
            open_ports: OpenPortSet::new(HOST, [443, 22]),
            banners: BTreeMap::from([(443, banner)]),
        };

        let keys: Vec<String> = host_details(&record).into_iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["22/tcp", "443/tls"]);
    }
}
