use std::time::{Duration, Instant};

use colored::*;
use tracing::{Instrument, info_span};

use sweepr_common::config::Config;
use sweepr_common::network::target::Target;
use sweepr_core::discovery::{DiscoveryEngine, DiscoveryReport, SweepOptions};

use crate::commands::SweepArgs;
use crate::mprint;
use crate::terminal::print::Detail;
use crate::terminal::{colors, format, print, spinner};

pub async fn discover(target: Target, sweep: &SweepArgs, cfg: &Config) -> anyhow::Result<()> {
    let discovery = sweep.to_config();
    discovery.validate()?;
    let candidates = target.expand_within(discovery.max_hosts)?;

    print::header("getting ready for discovery", cfg.quiet);
    print::print_status(format!("{} candidate hosts in {target}", candidates.len()));

    let span = info_span!("discovery", indicatif.pb_show = true);
    spinner::attach(&span, "Sweeping for live hosts...");

    let start_time = Instant::now();
    let report = DiscoveryEngine::new(discovery.connect_ports.clone())
        .run(&candidates, discovery.mode, &SweepOptions::from(&discovery))
        .instrument(span)
        .await;

    discovery_ends(&report, start_time.elapsed(), cfg);
    Ok(())
}

fn discovery_ends(report: &DiscoveryReport, total_time: Duration, cfg: &Config) {
    if report.live.is_empty() {
        print::header("zero hosts detected", cfg.quiet);
        print_strategies(report, cfg);
        print::no_results();
        return;
    }

    print::header("network discovery", cfg.quiet);
    if cfg.quiet < 2 {
        for (idx, host) in report.live.iter().enumerate() {
            match report.found_by.get(host) {
                Some(method) => print::tree_head(idx, &format!("{host} ({method})")),
                None => print::tree_head(idx, &host.to_string()),
            }
        }
        mprint!();
    }
    print_strategies(report, cfg);
    print_summary(report.live.len(), total_time, cfg);
}

fn print_strategies(report: &DiscoveryReport, cfg: &Config) {
    if cfg.quiet > 0 || report.outcomes.is_empty() {
        return;
    }
    let details: Vec<Detail> = report
        .outcomes
        .iter()
        .map(|(method, outcome)| (method.to_string(), format::outcome_value(outcome)))
        .collect();
    print::print_status("Strategies");
    print::as_tree_one_level(&details);
}

fn print_summary(hosts_len: usize, total_time: Duration, cfg: &Config) {
    let active_hosts: ColoredString = format!("{hosts_len} active hosts").bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output = format!("Discovery Complete: {active_hosts} identified in {total_time}")
        .color(colors::TEXT_DEFAULT)
        .to_string();

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => print::print(&output),
    }
}
