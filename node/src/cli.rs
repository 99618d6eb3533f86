//! # CLI Interface
//!
//! Command-line arguments for `keystone-node`, via `clap` derive. Every
//! `run` flag can also be set through a `KEYSTONE_*` environment variable.

use clap::{Parser, Subcommand};

use keystone_protocol::config::DEFAULT_SEQUENCE_MAX_PENDING;
use keystone_protocol::crypto::PublicKey;

use crate::logging::{LogFormat, DEFAULT_FILTER};

/// keystone node.
///
/// Serves the second-signature enrollment API over HTTP and exposes
/// Prometheus metrics on a separate port.
#[derive(Parser, Debug)]
#[command(
    name = "keystone-node",
    about = "keystone identity and signing node",
    version,
    propagate_version = true
)]
pub struct KeystoneNodeCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node.
    Run(RunArgs),
    /// Derive (or generate) a secret and print its public key and address.
    Keygen(KeygenArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Address to bind both listeners to.
    #[arg(long, env = "KEYSTONE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the HTTP API.
    #[arg(long, env = "KEYSTONE_API_PORT", default_value_t = 9741)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "KEYSTONE_METRICS_PORT", default_value_t = 9742)]
    pub metrics_port: u16,

    /// Log output format.
    #[arg(long, env = "KEYSTONE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Log filter, used when `RUST_LOG` is unset.
    #[arg(long, env = "KEYSTONE_LOG_LEVEL", default_value = DEFAULT_FILTER)]
    pub log_level: String,

    /// Maximum tasks waiting in the balances sequence before new
    /// enrollments are refused.
    #[arg(long, env = "KEYSTONE_SEQUENCE_MAX_PENDING", default_value_t = DEFAULT_SEQUENCE_MAX_PENDING)]
    pub sequence_max_pending: usize,

    /// Maximum transactions held in the pool.
    #[arg(long, env = "KEYSTONE_POOL_MAX_SIZE", default_value_t = 10_000)]
    pub pool_max_size: usize,

    /// Minimum fee accepted by the pool, in base units.
    #[arg(long, env = "KEYSTONE_MIN_FEE", default_value_t = 0)]
    pub min_fee: u64,

    /// How often pending transactions are confirmed, in milliseconds.
    #[arg(long, env = "KEYSTONE_CONFIRM_INTERVAL_MS", default_value_t = 10_000)]
    pub confirm_interval_ms: u64,

    /// Pre-fund an account at startup, as `PUBLIC_KEY_HEX:AMOUNT`.
    /// Repeatable; the env var takes a comma-separated list.
    #[arg(long = "fund", env = "KEYSTONE_FUND", value_delimiter = ',', value_parser = parse_fund)]
    pub fund: Vec<FundSpec>,
}

/// Arguments for the `keygen` subcommand.
#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Existing secret to derive from. A fresh mnemonic is generated when
    /// omitted.
    #[arg(long, env = "KEYSTONE_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Address prefix character.
    #[arg(long, default_value_t = keystone_protocol::config::TOKEN_PREFIX)]
    pub prefix: char,

    /// Print JSON instead of aligned text.
    #[arg(long)]
    pub json: bool,
}

/// A startup balance for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundSpec {
    pub public_key: String,
    pub amount: u64,
}

fn parse_fund(s: &str) -> Result<FundSpec, String> {
    let (key, amount) = s
        .split_once(':')
        .ok_or_else(|| format!("expected PUBLIC_KEY_HEX:AMOUNT, got '{}'", s))?;
    let public_key = PublicKey::from_hex(key.trim()).map_err(|e| e.to_string())?;
    let amount = amount
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("bad amount '{}': {}", amount, e))?;
    Ok(FundSpec {
        public_key: public_key.to_hex(),
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use keystone_protocol::crypto::Keypair;

    #[test]
    fn verify_cli_structure() {
        KeystoneNodeCli::command().debug_assert();
    }

    #[test]
    fn parses_fund_specs() {
        let key = Keypair::from_secret("alpha").public_key_hex();
        let spec = parse_fund(&format!("{}:500", key.to_uppercase())).unwrap();
        assert_eq!(
            spec,
            FundSpec {
                public_key: key,
                amount: 500
            }
        );
        assert!(parse_fund("nocolon").is_err());
        assert!(parse_fund("abcd:5").is_err());
        assert!(parse_fund(&format!("{}:lots", Keypair::from_secret("a").public_key_hex())).is_err());
    }

    #[test]
    fn run_defaults() {
        let cli = KeystoneNodeCli::try_parse_from(["keystone-node", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.api_port, 9741);
        assert_eq!(args.log_format, LogFormat::Pretty);
        assert_eq!(args.sequence_max_pending, DEFAULT_SEQUENCE_MAX_PENDING);
        assert!(args.fund.is_empty());
    }
}
