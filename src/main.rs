mod cli;
mod config;
mod discover;
mod execute;
mod llm;
mod logging;
mod model;
mod pipeline;
mod probe;
mod process;
mod recommend;
mod report;
mod select;
mod storage;

use clap::Parser;

use cli::Cli;
use config::Config;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = cli::run(cli, &config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
