mod api;
mod cli;
mod config;
mod convert;
mod import;

use anyhow::Result;
use clap::Parser;

use cli::commands::{convert as convert_cmd, fields, import as import_cmd, inspect, status};
use cli::{Cli, Commands};
use config::Config;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Import(args) => {
            let config = Config::load(cli.config.as_deref())?;
            import_cmd::handle_import_command(args, &config).await
        }
        Commands::Inspect(args) => inspect::handle_inspect_command(args).await,
        Commands::Convert(args) => convert_cmd::handle_convert_command(args).await,
        Commands::Fields(args) => {
            let config = Config::load(cli.config.as_deref())?;
            fields::handle_fields_command(args, &config).await
        }
        Commands::Status(args) => {
            let config = Config::load(cli.config.as_deref())?;
            status::handle_status_command(args, &config).await
        }
    }
}
