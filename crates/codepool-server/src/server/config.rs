use anyhow::bail;
use clap::{Parser, ValueEnum};
use codepool::RetryPolicy;
use core::time::Duration;
use std::path::PathBuf;

/// How concurrent pops within this process are coordinated.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Every request pops directly; conflicting writes back off and retry.
    Optimistic,
    /// Every request is funneled through one actor task.
    Serial,
}

/// Runtime configuration for the `codepool-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first), with defaults suitable for a single node.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "codepool-server",
    version,
    about = "An HTTP service that dispenses single-use codes from a shared pool"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8787"))]
    pub server_addr: String,

    /// Store key holding the JSON array of remaining codes.
    ///
    /// Environment variable: `POOL_KEY`
    #[arg(long, env = "POOL_KEY", default_value_t = String::from("codes"))]
    pub pool_key: String,

    /// JSON file with an array of codes to load into the pool at startup.
    ///
    /// Replaces whatever the pool held. Without it the pool starts absent and
    /// every pop answers "No codes left".
    ///
    /// Environment variable: `CODES_FILE`
    #[arg(long, env = "CODES_FILE")]
    pub codes_file: Option<PathBuf>,

    /// Pop coordination strategy.
    ///
    /// Environment variable: `STRATEGY`
    #[arg(long, env = "STRATEGY", value_enum, default_value_t = Strategy::Optimistic)]
    pub strategy: Strategy,

    /// Attempts a pop makes before answering that the pool is too contended.
    ///
    /// Environment variable: `MAX_ATTEMPTS`
    #[arg(long, env = "MAX_ATTEMPTS", default_value_t = 5)]
    pub max_attempts: u32,

    /// Backoff ceiling after the first conflicting attempt, in milliseconds.
    /// The ceiling doubles with every further conflict.
    ///
    /// Environment variable: `BASE_BACKOFF_MS`
    #[arg(long, env = "BASE_BACKOFF_MS", default_value_t = 10)]
    pub base_backoff_ms: u64,

    /// Upper bound for any single backoff, in milliseconds.
    ///
    /// Environment variable: `MAX_BACKOFF_MS`
    #[arg(long, env = "MAX_BACKOFF_MS", default_value_t = 250)]
    pub max_backoff_ms: u64,

    /// Pop requests that may queue for the actor with `--strategy serial`.
    ///
    /// Environment variable: `SERIAL_BUFFER_SIZE`
    #[arg(long, env = "SERIAL_BUFFER_SIZE", default_value_t = 64)]
    pub serial_buffer_size: usize,

    /// Seconds to wait for queued pops to drain on shutdown.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub pool_key: String,
    pub codes_file: Option<PathBuf>,
    pub strategy: Strategy,
    pub retry: RetryPolicy,
    pub serial_buffer_size: usize,
    pub shutdown_timeout: Duration,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.pool_key.is_empty() {
            bail!("POOL_KEY must not be empty");
        }

        if args.max_attempts == 0 {
            bail!("MAX_ATTEMPTS must be greater than 0");
        }

        if args.max_backoff_ms < args.base_backoff_ms {
            bail!(
                "MAX_BACKOFF_MS ({}) must not be lower than BASE_BACKOFF_MS ({})",
                args.max_backoff_ms,
                args.base_backoff_ms
            );
        }

        if args.serial_buffer_size == 0 {
            bail!("SERIAL_BUFFER_SIZE must be greater than 0");
        }

        Ok(Self {
            server_addr: args.server_addr,
            pool_key: args.pool_key,
            codes_file: args.codes_file,
            strategy: args.strategy,
            retry: RetryPolicy::new(
                args.max_attempts,
                Duration::from_millis(args.base_backoff_ms),
                Duration::from_millis(args.max_backoff_ms),
            ),
            serial_buffer_size: args.serial_buffer_size,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ServerConfig> {
        let args = CliArgs::try_parse_from(
            std::iter::once("codepool-server").chain(args.iter().copied()),
        )?;
        ServerConfig::try_from(args)
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.pool_key, "codes");
        assert_eq!(config.strategy, Strategy::Optimistic);
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.codes_file.is_none());
    }

    #[test]
    fn selects_serial_strategy() {
        let config = parse(&["--strategy", "serial", "--serial-buffer-size", "8"]).unwrap();
        assert_eq!(config.strategy, Strategy::Serial);
        assert_eq!(config.serial_buffer_size, 8);
    }

    #[test]
    fn rejects_zero_attempts() {
        assert!(parse(&["--max-attempts", "0"]).is_err());
    }

    #[test]
    fn rejects_inverted_backoff_bounds() {
        assert!(parse(&["--base-backoff-ms", "100", "--max-backoff-ms", "10"]).is_err());
    }

    #[test]
    fn rejects_empty_key() {
        assert!(parse(&["--pool-key", ""]).is_err());
    }
}
