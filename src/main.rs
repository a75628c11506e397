use clap::Parser;
use snowparam::cli::dispatcher::Dispatcher;
use snowparam::cli::main_types::Cli;
use snowparam::storage::config::Config;
use snowparam::utils::logging::{init_stderr_logging, print_verbose};
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_stderr_logging(cli.verbose);

    let config_path = cli
        .config_dir
        .as_ref()
        .map(|dir| PathBuf::from(dir).join("config.toml"));

    let config = match Config::load(config_path.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading config: {}", err);
            std::process::exit(1);
        }
    };

    if let Some(config_dir) = &cli.config_dir {
        print_verbose(cli.verbose, &format!("Using config directory: {}", config_dir));
    }

    let dispatcher = Dispatcher::new(&cli, config, config_path);

    if let Err(e) = dispatcher.dispatch(cli.command).await {
        eprintln!(
            "{} Error: {}",
            e.severity().emoji(),
            e.display_friendly()
        );
        if let Some(hint) = e.troubleshooting_hint() {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }
}
