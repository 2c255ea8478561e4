use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use async_trait::async_trait;
use sweepr_common::models::{BannerPayload, TransportKind, NO_GREETING};
use sweepr_common::network::target::Target;
use sweepr_common::ReconError;
use sweepr_core::discovery::echo::{EchoCapability, EchoSweep};
use sweepr_core::discovery::DiscoveryEngine;
use sweepr_core::{ScanConfig, Session};

use crate::support::{closed_port, greeting_server, LOCALHOST};

/// Only plain 127.0.0.1 answers echo requests.
struct LoopbackOnly;

#[async_trait]
impl EchoCapability for LoopbackOnly {
    async fn echo(&self, addr: IpAddr, _timeout: Duration) -> Result<bool, ReconError> {
        Ok(addr == LOCALHOST)
    }
}

fn session(ports: Vec<u16>) -> Session {
    let mut cfg = ScanConfig::default();
    cfg.ports.ports = ports;
    cfg.ports.timeout = Duration::from_millis(500);
    cfg.banner.timeout = Duration::from_secs(2);
    cfg.banner.settle = Duration::from_millis(50);

    let engine = DiscoveryEngine::with_strategies(vec![Box::new(EchoSweep::new(LoopbackOnly))]);
    Session::with_engine(cfg, engine)
}

#[tokio::test]
async fn full_pipeline_against_loopback_services() {
    let ssh = greeting_server(b"SSH-2.0-OpenSSH_8.9p1 Ubuntu-3ubuntu0.1\r\n").await;
    let silent = greeting_server(b"").await;
    let closed = closed_port().await;

    let target: Target = "127.0.0.1-2".parse().unwrap();
    let result = session(vec![closed, silent, ssh]).run(&target).await.unwrap();

    assert_eq!(result.live_hosts().into_vec(), vec![LOCALHOST]);
    assert!(!result.hosts.contains_key(&IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2))));

    let record = &result.hosts[&LOCALHOST];
    let mut expected = vec![ssh, silent];
    expected.sort_unstable();
    assert_eq!(record.open_ports.ports(), expected.as_slice());

    // Banners exist for exactly the open ports.
    let bannered: Vec<u16> = record.banners.keys().copied().collect();
    assert_eq!(bannered, expected);
    assert!(!record.banners.contains_key(&closed));

    let ssh_banner = &record.banners[&ssh];
    assert_eq!(ssh_banner.transport, TransportKind::Plain);
    assert_eq!(ssh_banner.text(), Some("SSH-2.0-OpenSSH_8.9p1 Ubuntu-3ubuntu0.1"));
    assert_eq!(ssh_banner.service_hint(), Some(("OpenSSH".to_string(), "8.9".to_string())));

    let silent_banner = &record.banners[&silent];
    assert_eq!(silent_banner.payload, BannerPayload::NoGreeting);
    assert_eq!(silent_banner.payload.to_string(), NO_GREETING);
}

#[tokio::test]
async fn live_host_without_open_ports_is_kept_with_an_empty_list() {
    let closed = closed_port().await;
    let target: Target = "127.0.0.1".parse().unwrap();

    let result = session(vec![closed]).run(&target).await.unwrap();

    let record = &result.hosts[&LOCALHOST];
    assert!(record.open_ports.is_empty());
    assert!(record.banners.is_empty());
    assert_eq!(result.hosts_with_open_ports(), 0);
}

#[tokio::test]
async fn banners_can_be_skipped() {
    let ssh = greeting_server(b"SSH-2.0-dropbear_2022.83\r\n").await;
    let target: Target = "127.0.0.1".parse().unwrap();

    let mut cfg = ScanConfig::default();
    cfg.ports.ports = vec![ssh];
    cfg.skip_banners = true;
    let engine = DiscoveryEngine::with_strategies(vec![Box::new(EchoSweep::new(LoopbackOnly))]);

    let result = Session::with_engine(cfg, engine).run(&target).await.unwrap();

    assert_eq!(result.hosts[&LOCALHOST].open_ports.ports(), &[ssh]);
    assert_eq!(result.banners().count(), 0);
}

#[tokio::test]
async fn silent_range_yields_an_empty_session_not_an_error() {
    let target: Target = "127.0.0.2-4".parse().unwrap();
    let result = session(vec![22]).run(&target).await.unwrap();

    assert!(result.hosts.is_empty());
    assert_eq!(result.ports_scanned, vec![22]);
}
