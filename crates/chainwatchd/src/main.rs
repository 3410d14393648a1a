//! chainwatchd — blockchain node health side-car.
//!
//! Polls a node's JSON-RPC endpoint, publishes peer count and sync lag
//! as Prometheus gauges, and serves liveness/readiness probes for the
//! orchestrator.
//!
//! # Usage
//!
//! ```text
//! chainwatchd --provider-url http://127.0.0.1:8545 --port 9990 --max-remaining-blocks 10
//! ```
//!
//! Every flag can also be set through its environment variable
//! (`WEB3_PROVIDER_URL`, `METRICS_PORT`, `ENABLE_PARITY`,
//! `MAX_REMAINING_BLOCKS`, `RPC_TIMEOUT_SECS`, `LOG_FORMAT`); the flag wins.

mod daemon;

use std::time::Duration;

use clap::{Parser, ValueEnum};

use daemon::Config;

#[derive(Parser, Debug)]
#[command(name = "chainwatchd", about = "Blockchain node health side-car", version)]
struct Cli {
    /// JSON-RPC endpoint of the monitored node.
    #[arg(
        long = "provider-url",
        alias = "providerURL",
        env = "WEB3_PROVIDER_URL",
        default_value = "http://127.0.0.1:8545"
    )]
    provider_url: String,

    /// Port for the metrics and health listener.
    #[arg(long, env = "METRICS_PORT", default_value = "9990")]
    port: u16,

    /// Collect `web3_block_gap` from parity_chainStatus and require a zero
    /// gap for readiness.
    #[arg(long = "enable-parity", alias = "enableParity", env = "ENABLE_PARITY")]
    enable_parity: bool,

    /// Maximum remaining blocks tolerated by the readiness check.
    #[arg(
        long = "max-remaining-blocks",
        alias = "max_remaining_blocks",
        env = "MAX_REMAINING_BLOCKS",
        default_value = "10"
    )]
    max_remaining_blocks: u64,

    /// Per-call RPC timeout in seconds.
    #[arg(long, env = "RPC_TIMEOUT_SECS", default_value = "10")]
    rpc_timeout_secs: u64,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<Config> {
        if self.rpc_timeout_secs == 0 {
            anyhow::bail!("--rpc-timeout-secs must be greater than zero");
        }
        Ok(Config {
            provider_url: self.provider_url,
            port: self.port,
            block_gap: self.enable_parity,
            max_remaining_blocks: self.max_remaining_blocks,
            rpc_timeout: Duration::from_secs(self.rpc_timeout_secs),
        })
    }
}

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info,chainwatchd=debug,chainwatch=debug";

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let config = cli.into_config()?;
    daemon::run(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("chainwatchd").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).into_config().unwrap();
        assert_eq!(config.provider_url, "http://127.0.0.1:8545");
        assert_eq!(config.port, 9990);
        assert!(!config.block_gap);
        assert_eq!(config.max_remaining_blocks, 10);
        assert_eq!(config.rpc_timeout, Duration::from_secs(10));
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "--provider-url",
            "http://node:8545",
            "--port",
            "9100",
            "--enable-parity",
            "--max-remaining-blocks",
            "0",
            "--log-format",
            "json",
        ]);
        assert_eq!(cli.log_format, LogFormat::Json);

        let config = cli.into_config().unwrap();
        assert_eq!(config.provider_url, "http://node:8545");
        assert_eq!(config.port, 9100);
        assert!(config.block_gap);
        assert_eq!(config.max_remaining_blocks, 0);
    }

    #[test]
    fn legacy_flag_names_accepted() {
        let config = parse(&["--providerURL", "http://legacy:8545", "--enableParity"])
            .into_config()
            .unwrap();
        assert_eq!(config.provider_url, "http://legacy:8545");
        assert!(config.block_gap);
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(parse(&["--rpc-timeout-secs", "0"]).into_config().is_err());
    }

    #[test]
    fn invalid_port_rejected() {
        assert!(Cli::try_parse_from(["chainwatchd", "--port", "70000"]).is_err());
    }

    #[test]
    fn default_log_filter_enables_daemon_debug() {
        let filter = tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("chainwatchd=debug"), "{rendered}");
        assert!(rendered.contains("chainwatch=debug"), "{rendered}");
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
