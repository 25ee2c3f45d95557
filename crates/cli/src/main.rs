//! powchain CLI entry point.

use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(name = "powchain")]
#[command(about = "A proof-of-work block layer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if let Err(e) = commands::run(cli.command) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
