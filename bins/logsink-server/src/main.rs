mod cmd;
mod config;
mod error;

use clap::Parser;
use config::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Serve(args) => match cmd::serve::load_config(&args) {
            Ok(config) => {
                init_logging(config.logging.filter.as_deref());
                cmd::serve::run(&args, config).await
            }
            Err(e) => Err(e),
        },
        Commands::Send(args) => {
            init_logging(None);
            cmd::send::run(&args).await
        }
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Install the global subscriber once. `RUST_LOG` wins over the configured
/// filter; an unusable filter falls back to `info`.
fn init_logging(configured: Option<&str>) {
    let mut rejected = None;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match configured {
        Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|e| {
            rejected = Some((directive.to_string(), e.to_string()));
            EnvFilter::new("info")
        }),
        None => EnvFilter::new("info"),
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some((directive, error)) = rejected {
        tracing::warn!(%directive, %error, "could not apply logging filter, falling back to info");
    }
}
