use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "logsink-server", about = "Length-framed JSON log ingestion server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Accept connections and persist incoming records
    Serve(ServeArgs),
    /// Send a single record to a running server
    Send(SendArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Path to TOML config file
    #[arg(long, default_value = "config.toml", env = "LOGSINK_CONFIG")]
    pub config: String,

    /// Override `listener.port`
    #[arg(long)]
    pub port: Option<u16>,

    /// Override `listener.host`
    #[arg(long)]
    pub host: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct SendArgs {
    /// Server address
    #[arg(long, default_value = "127.0.0.1:5140", env = "LOGSINK_ADDR")]
    pub addr: String,

    /// Originating service
    #[arg(long)]
    pub service: String,

    /// Log source path within the service
    #[arg(long)]
    pub path: String,

    /// Attached data, as a JSON object
    #[arg(long)]
    pub data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["logsink-server", "serve"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert!(args.port.is_none());
                assert!(args.host.is_none());
            }
            Commands::Send(_) => panic!("expected serve"),
        }
    }

    #[test]
    fn serve_port_override() {
        let cli = Cli::try_parse_from(["logsink-server", "serve", "--config", "x.toml", "--port", "9000"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.config, "x.toml");
                assert_eq!(args.port, Some(9000));
            }
            Commands::Send(_) => panic!("expected serve"),
        }
    }

    #[test]
    fn send_requires_service_and_path() {
        assert!(Cli::try_parse_from(["logsink-server", "send", "--service", "a"]).is_err());
        let cli = Cli::try_parse_from([
            "logsink-server", "send", "--service", "a", "--path", "/x", "--data", "{\"k\":1}",
        ])
        .unwrap();
        match cli.command {
            Commands::Send(args) => {
                assert_eq!(args.service, "a");
                assert_eq!(args.path, "/x");
                assert_eq!(args.data.as_deref(), Some("{\"k\":1}"));
            }
            Commands::Serve(_) => panic!("expected send"),
        }
    }
}
