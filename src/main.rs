//! `ping-monitor` binary entry point.

use clap::Parser;
use ping_monitor::cli_app::{Cli, run};

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
