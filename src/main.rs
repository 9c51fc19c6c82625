use clap::Parser;
use termprof::cli::{self, Cli};
use tokio::runtime::Runtime;

fn main() {
    // Usage errors exit with clap's own status before logging starts
    let cli = Cli::parse();

    termprof::debug::init_log_bridge(cli.log_level.map(|l| l.to_level_filter()));
    log::info!("Starting termprof {}", env!("CARGO_PKG_VERSION"));

    let result = Runtime::new()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| cli::run(cli, &runtime));

    if let Err(e) = result {
        eprintln!("termprof: error: {e:#}");
        std::process::exit(1);
    }
}
