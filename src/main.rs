use clap::Parser;
use chronotask::cli::commands::Cli;
use chronotask::cli::{handlers, logging};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
