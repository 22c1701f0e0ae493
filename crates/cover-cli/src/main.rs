mod cli;
mod commands;
mod error;

use clap::Parser;

fn main() {
    let args = cli::Cli::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    if let Err(err) = commands::dispatch(args.command) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
