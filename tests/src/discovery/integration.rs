use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use sweepr_common::models::{DiscoveryMethod, DiscoveryMode};
use sweepr_common::network::target::Target;
use sweepr_core::discover;
use sweepr_core::discovery::connect::ConnectSweep;
use sweepr_core::discovery::{DiscoveryEngine, DiscoveryReport, SweepOptions};

use crate::support::{closed_port, greeting_server, wildcard_listener, LOCALHOST};

const CONNECT_ONLY: DiscoveryMode = DiscoveryMode::Only(DiscoveryMethod::Connect);

async fn connect_sweep(target: &str, ports: Vec<u16>) -> DiscoveryReport {
    let target: Target = target.parse().unwrap();
    let opts = SweepOptions {
        timeout: Duration::from_millis(500),
        concurrency: 8,
    };
    DiscoveryEngine::with_strategies(vec![Box::new(ConnectSweep::new(ports))])
        .run(&target.expand().unwrap(), CONNECT_ONLY, &opts)
        .await
}

#[tokio::test]
async fn discovery_single_loopback() {
    let open = greeting_server(b"hello").await;

    let report = connect_sweep("127.0.0.1", vec![open]).await;

    assert_eq!(report.live.clone().into_vec(), vec![LOCALHOST]);
    assert_eq!(report.found_by[&LOCALHOST], DiscoveryMethod::Connect);
}

#[tokio::test]
async fn refusing_host_is_not_discovered() {
    let closed = closed_port().await;

    let report = connect_sweep("127.0.0.1", vec![closed]).await;

    assert!(report.live.is_empty());
}

#[tokio::test]
#[cfg(target_os = "linux")]
async fn discovery_range_loopback() {
    let (listener, port) = wildcard_listener().await;

    let report = connect_sweep("127.0.0.1-3", vec![port]).await;
    drop(listener);

    let expected: Vec<IpAddr> = (1..=3).map(|d| IpAddr::V4(Ipv4Addr::new(127, 0, 0, d))).collect();
    assert_eq!(report.live.into_vec(), expected, "every loopback address accepts");
}

#[tokio::test]
async fn discovery_is_repeatable() {
    // The closed port is tried first, so each run goes through a refusal before the accept.
    let open = greeting_server(b"hello").await;
    let closed = closed_port().await;

    let first = connect_sweep("127.0.0.1", vec![closed, open]).await;
    let second = connect_sweep("127.0.0.1", vec![closed, open]).await;

    assert_eq!(first.live, second.live);
    assert_eq!(first.live.into_vec(), vec![LOCALHOST]);
}

#[tokio::test]
async fn malformed_target_is_the_only_fatal_error() {
    assert!("10.0.0.0/33".parse::<Target>().is_err());
    assert!("300.1.1.1".parse::<Target>().is_err());

    let target: Target = "127.0.0.1".parse().unwrap();
    let result = discover(&target, DiscoveryMode::default(), Duration::ZERO, 4).await;
    assert!(result.is_err(), "zero timeout must be rejected up front");
}
