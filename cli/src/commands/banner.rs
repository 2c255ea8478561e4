use std::net::IpAddr;
use std::time::Duration;

use colored::*;
use tracing::warn;

use sweepr_common::config::Config;
use sweepr_common::models::BannerPayload;
use sweepr_core::grab_banner;

use crate::terminal::print::Detail;
use crate::terminal::{colors, format, print};

pub async fn banner(host: IpAddr, port: u16, timeout_ms: u64, cfg: &Config) -> anyhow::Result<()> {
    print::header("grabbing banner", cfg.quiet);

    let banner = grab_banner(host, port, Duration::from_millis(timeout_ms)).await;
    if banner.is_error() {
        warn!("{host}:{port} did not yield a banner");
    }

    print::tree_head(0, &format!("{host}:{port}"));
    let details: Vec<Detail> = vec![
        ("Transport".to_string(), banner.transport.to_string().color(colors::PORT)),
        ("Banner".to_string(), format::banner_value(&banner)),
    ];
    print::as_tree_one_level(&details);

    // Multi-line greetings are shown in full below the tree.
    if let BannerPayload::Text(text) = &banner.payload {
        if cfg.quiet < 2 && text.lines().count() > 1 {
            for line in text.lines() {
                print::print_status(line);
            }
        }
    }
    Ok(())
}
