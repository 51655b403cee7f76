//! CLI entry point for chest X-ray analysis

use chestscan::io::cli::{AnalysisRunner, Cli};
use clap::Parser;

fn main() -> chestscan::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    AnalysisRunner::new(cli).run()
}
