use std::collections::BTreeSet;

use crate::error::{ReconError, Result};

/// Parses a port specification: `"80"`, `"80,443"`, `"1-1024"`, `"22,8000-8010"`.
///
/// The result is ascending and deduplicated. Port 0, reversed ranges and
/// anything non-numeric are configuration errors.
pub fn parse_port_spec(spec: &str) -> Result<Vec<u16>> {
    let mut ports: BTreeSet<u16> = BTreeSet::new();

    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_port(start)?;
                let end = parse_port(end)?;
                if start > end {
                    return Err(ReconError::config(format!("invalid port range: {part}")));
                }
                ports.extend(start..=end);
            }
            None => {
                ports.insert(parse_port(part)?);
            }
        }
    }

    if ports.is_empty() {
        return Err(ReconError::config(format!("no ports in '{spec}'")));
    }

    Ok(ports.into_iter().collect())
}

fn parse_port(s: &str) -> Result<u16> {
    let port: u16 = s
        .trim()
        .parse()
        .map_err(|_| ReconError::config(format!("invalid port: {s}")))?;
    if port == 0 {
        return Err(ReconError::config("port 0 is not scannable"));
    }
    Ok(port)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
