pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use toolgate_core::config::{AppConfig, LoadOptions};

use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "toolgate",
    about = "Toolgate operator CLI",
    long_about = "Invoke gateway tools, resolve catalog queries and inspect effective \
                  configuration.",
    after_help = "Examples:\n  toolgate tools\n  \
                  toolgate call get_thread --args '{\"thread_id\":\"thr_1\"}'\n  \
                  toolgate resolve \"glossy vinyl stickers\" --explain\n  toolgate config"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Explicit config file (defaults to toolgate.toml or config/toolgate.toml)"
    )]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List every operation with its parameters as JSON")]
    Tools,
    #[command(about = "Invoke one operation and print its wire text")]
    Call {
        operation: String,
        #[arg(long, help = "Operation arguments as a JSON object")]
        args: Option<String>,
        #[arg(long, help = "Print the full reply (result and text) as JSON")]
        json: bool,
    },
    #[command(about = "Resolve a free-text product description to a catalog id")]
    Resolve {
        query: String,
        #[arg(long, help = "Include the ranked partial-match candidates")]
        explain: bool,
    },
    #[command(about = "Show effective configuration with source attribution and redaction")]
    Config,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Tools => "tools",
            Self::Call { .. } => "call",
            Self::Resolve { .. } => "resolve",
            Self::Config => "config",
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config.clone(),
        ..LoadOptions::default()
    };
    let result = match AppConfig::load(options) {
        Ok(config) => {
            logging::init_logging(&config);
            dispatch(cli, &config)
        }
        Err(error) => CommandResult::failure(
            cli.command.name(),
            "config_validation",
            format!("config validation failed: {error}"),
            2,
        ),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn dispatch(cli: Cli, config: &AppConfig) -> CommandResult {
    match cli.command {
        Command::Tools => commands::tools::run(config),
        Command::Call { operation, args, json } => {
            commands::call::run(config, &operation, args.as_deref(), json)
        }
        Command::Resolve { query, explain } => commands::resolve::run(config, &query, explain),
        Command::Config => CommandResult {
            exit_code: 0,
            output: commands::config::run(config, cli.config.as_deref()),
        },
    }
}
