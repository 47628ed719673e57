mod collectors;
mod config;
mod report;

use clap::Parser;
use collectors::system::SysinfoProbe;
use config::Config;
use report::{report_usage, LineSink};
use std::io;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hostsnap")]
#[command(version)]
#[command(about = "Print a one-shot snapshot of per-core cpu info, total and free memory")]
struct Cli {
    #[arg(long)]
    config: Option<String>,
    #[arg(long)]
    print_default_config: bool,
}

fn main() {
    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return;
    }

    let cfg = match &cli.config {
        Some(path) => match Config::load_from_file(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                init_tracing(&Config::default());
                error!(error = %err, "failed to load configuration");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    init_tracing(&cfg);
    debug!(proc_root = %cfg.proc_root, "starting usage snapshot");

    let probe = SysinfoProbe::new(&cfg.proc_root);
    let stdout = io::stdout();
    let mut sink = LineSink::new(stdout.lock());
    if let Err(err) = report_usage(probe, &mut sink) {
        error!(error = %err, "usage report failed");
        std::process::exit(1);
    }
}

fn init_tracing(cfg: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
