use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "resizing-worker")]
#[command(about = "Resize images from object storage on queue or HTTP request", long_about = None)]
pub struct Cli {
    /// Settings file (JSON or TOML); defaults to RESIZER_CONFIG or setting.json
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the configured queues and resize each job
    Watcher,
    /// Serve synchronous resize requests over HTTP
    Httpserver(HttpserverArgs),
}

#[derive(clap::Args, Debug)]
pub struct HttpserverArgs {
    /// Address to bind; defaults to 0.0.0.0 on the configured port
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watcher_with_config() {
        let cli = Cli::parse_from(["resizing-worker", "--config", "prod.json", "watcher"]);
        assert_eq!(cli.config, Some(PathBuf::from("prod.json")));
        assert!(matches!(cli.command, Commands::Watcher));
    }

    #[test]
    fn test_parse_httpserver_address() {
        let cli = Cli::parse_from(["resizing-worker", "httpserver", "--address", "127.0.0.1:9000"]);
        match cli.command {
            Commands::Httpserver(args) => {
                assert_eq!(args.address, Some("127.0.0.1:9000".parse().unwrap()));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["resizing-worker"]).is_err());
    }
}
