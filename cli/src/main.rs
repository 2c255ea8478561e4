mod commands;
mod terminal;

use commands::{CommandLine, Commands, banner, discover, scan};
use sweepr_common::config::Config;
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    let cfg = Config {
        quiet: commands.quiet,
        verbose: commands.verbose,
        no_banner: commands.no_banner,
    };

    logging::init(&cfg);
    print::banner(cfg.no_banner, cfg.quiet);

    match commands.command {
        Commands::Discover { target, sweep } => discover::discover(target, &sweep, &cfg).await,
        Commands::Scan { target, sweep, scan } => scan::scan(target, &sweep, &scan, &cfg).await,
        Commands::Banner { host, port, timeout } => banner::banner(host, port, timeout, &cfg).await,
    }
}
