//! Wire-level helpers: ARP frames for the link-layer sweep and the probe
//! payloads the banner prober sends.

pub mod arp;
pub mod probes;
