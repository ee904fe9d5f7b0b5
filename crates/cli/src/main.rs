mod args;
mod commands;
mod logging;
mod reporter;
mod settings;

use std::process::ExitCode;

use clap::Parser;
use console::style;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Create(args) => commands::create::run(*args).await,
        Commands::Destroy => commands::destroy().map(|_| ExitCode::SUCCESS),
        Commands::RootCredentials => commands::root_credentials().map(|_| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
