pub mod commands;
pub mod logging;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use smartcart_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "smartcart",
    about = "SmartCart storefront CLI",
    long_about = "Train the recommendation model, browse the catalog, shop interactively, and inspect readiness.",
    after_help = "Examples:\n  smartcart train\n  smartcart products --search mug\n  smartcart recommend \"Tea Kettle\"\n  smartcart doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a smartcart.toml configuration file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override logging.level (trace|debug|info|warn|error)")]
    log_level: Option<String>,
    #[arg(long, global = true, help = "Override recommendation.seed for reproducible picks")]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Fit encoder, scaler and classifier on the catalog and write the artifacts")]
    Train {
        #[arg(long, help = "Catalog file to train on (overrides catalog.path)")]
        catalog: Option<PathBuf>,
        #[arg(long, help = "Directory to write artifacts into (overrides artifacts.dir)")]
        out: Option<PathBuf>,
    },
    #[command(about = "List catalog products with their price bucket")]
    Products {
        #[arg(long, help = "Case-insensitive substring filter on product names")]
        search: Option<String>,
    },
    #[command(about = "Resolve one recommended product for the given product name")]
    Recommend {
        #[arg(help = "Exact product name")]
        product: String,
    },
    #[command(about = "Start a line-oriented shopping session on stdin")]
    Shop,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, catalog, artifacts and model coverage")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                log_level: self.log_level.clone(),
                recommendation_seed: self.seed,
                ..ConfigOverrides::default()
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    let logging_config = AppConfig::load(options.clone()).unwrap_or_else(|_| {
        let mut fallback = AppConfig::default();
        fallback.logging.level = "warn".to_string();
        fallback.logging.format = LogFormat::Compact;
        fallback
    });
    logging::init_logging(&logging_config);

    let result = match cli.command {
        Command::Train { catalog, out } => commands::train::run(&options, catalog, out),
        Command::Products { search } => commands::products::run(&options, search.as_deref()),
        Command::Recommend { product } => commands::recommend::run(&options, &product),
        Command::Shop => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            commands::shop::run(&options, stdin.lock(), &mut stdout)
        }
        Command::Config => commands::config::run(&options),
        Command::Doctor { json } => commands::doctor::run(&options, json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
