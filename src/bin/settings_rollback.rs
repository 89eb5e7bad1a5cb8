use std::process;
use clap::Parser;
use log::{error, LevelFilter};
use settings_rollback::cli::args::Cli;
use settings_rollback::cli::CliProcessor;

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let mut processor = match CliProcessor::from_args(&cli) {
        Ok(processor) => processor,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    if processor.process(cli.operation()).is_err() {
        process::exit(1);
    }
}
