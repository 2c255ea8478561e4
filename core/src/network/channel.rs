use std::time::Duration;

use anyhow::{Context, bail};
use pnet::datalink::{self, Channel, Config, DataLinkReceiver, DataLinkSender, NetworkInterface};
use tracing::debug;

pub type EthernetPair = (Box<dyn DataLinkSender>, Box<dyn DataLinkReceiver>);

/// Opens a layer 2 channel on `intf` with the OS datalink backend.
pub fn open(intf: &NetworkInterface) -> anyhow::Result<EthernetPair> {
    open_with(intf, &read_config(), datalink::channel)
}

/// Opens a layer 2 channel through `opener`, so tests can swap in pnet's dummy backend.
pub fn open_with<F>(intf: &NetworkInterface, cfg: &Config, opener: F) -> anyhow::Result<EthernetPair>
where
    F: FnOnce(&NetworkInterface, Config) -> std::io::Result<Channel>,
{
    let ch = opener(intf, *cfg).with_context(|| format!("opening on {}", intf.name))?;
    match ch {
        Channel::Ethernet(tx, rx) => {
            debug!("datalink channel open on {}", intf.name);
            Ok((tx, rx))
        }
        _ => bail!("non-ethernet channel for {}", intf.name),
    }
}

// Short read timeout so the listen loop can check its deadline.
fn read_config() -> Config {
    Config {
        read_timeout: Some(Duration::from_millis(50)),
        ..Default::default()
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
    use pnet::datalink::dummy;

    #[test]
    fn open_with_accepts_ethernet_channel() {
        let intf = dummy::dummy_interface(0);
        let opener = |i: &NetworkInterface, _: Config| -> std::io::Result<Channel> {
            dummy::channel(i, dummy::Config::default())
        };
        assert!(open_with(&intf, &Config::default(), opener).is_ok());
    }

    #[test]
    fn open_with_wraps_io_errors_with_interface_name() {
        let intf = dummy::dummy_interface(0);
        let opener = |_: &NetworkInterface, _: Config| -> std::io::Result<Channel> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Mock I/O Error"))
        };

        let Err(err) = open_with(&intf, &Config::default(), opener) else {
            panic!("expected the opener failure to surface");
        };
        assert!(err.to_string().contains("opening on eth0"));
        let cause = err.downcast_ref::<std::io::Error>().expect("io cause kept");
        assert_eq!(cause.kind(), std::io::ErrorKind::PermissionDenied);
    }
}
