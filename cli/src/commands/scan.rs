use std::time::{Duration, Instant};

use colored::*;
use tracing::{Instrument, info_span};

use sweepr_common::config::Config;
use sweepr_common::models::ScanSession;
use sweepr_common::network::target::Target;
use sweepr_core::Session;

use crate::commands::{ScanArgs, SweepArgs};
use crate::mprint;
use crate::terminal::{colors, format, print, spinner};

pub async fn scan(target: Target, sweep: &SweepArgs, args: &ScanArgs, cfg: &Config) -> anyhow::Result<()> {
    let scan_cfg = args.to_config(sweep);
    scan_cfg.validate()?;

    print::header("starting scanner", cfg.quiet);
    print::print_status(format!("{} ports per live host", scan_cfg.ports.ports.len()));

    let span = info_span!("scan", indicatif.pb_show = true);
    spinner::attach(&span, "Discovering, scanning and greeting...");

    let start_time = Instant::now();
    let session = Session::new(scan_cfg).run(&target).instrument(span).await?;

    scan_ends(&session, start_time.elapsed(), cfg);
    Ok(())
}

fn scan_ends(session: &ScanSession, total_time: Duration, cfg: &Config) {
    if session.hosts.is_empty() {
        print::header("zero hosts detected", cfg.quiet);
        print::no_results();
        return;
    }

    print::header("scan results", cfg.quiet);
    if cfg.quiet < 2 {
        let last = session.hosts.len().saturating_sub(1);
        for (idx, (host, record)) in session.hosts.iter().enumerate() {
            print::tree_head(idx, &host.to_string());
            let details = format::host_details(record);
            if details.is_empty() {
                print::print_status("no open ports");
            } else {
                print::as_tree_one_level(&details);
            }
            if idx != last {
                mprint!();
            }
        }
    }
    print_summary(session, total_time, cfg);
}

fn print_summary(session: &ScanSession, total_time: Duration, cfg: &Config) {
    let hosts: ColoredString = format!("{} live hosts", session.hosts.len()).bold().green();
    let open: ColoredString = format!("{} with open ports", session.hosts_with_open_ports())
        .bold()
        .color(colors::PORT);
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output = format!("Scan Complete: {hosts}, {open} in {total_time}")
        .color(colors::TEXT_DEFAULT)
        .to_string();

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => {
            mprint!();
            print::print(&output);
        }
    }
}
