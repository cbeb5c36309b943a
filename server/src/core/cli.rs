use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_AGENTS_EVAL_TIMEOUT_SECS, ENV_AGENTS_MAX_IDS, ENV_AGENTS_MAX_PERIOD_DAYS,
    ENV_AGENTS_SPAN_LIMIT, ENV_CONFIG, ENV_DEBUG, ENV_HOST, ENV_PORT, ENV_STORE_FIXTURE,
    ENV_STORE_MAX_SPANS,
};
use crate::domain::agents::PeriodSelector;

#[derive(Parser)]
#[command(name = "agentdash")]
#[command(version, about = "Agent activity dashboard server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Enable debug mode (verbose request logging)
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Maximum session/trace IDs sampled per agent
    #[arg(long, global = true, env = ENV_AGENTS_MAX_IDS)]
    pub max_ids_per_agent: Option<usize>,

    /// Maximum aggregation window in days
    #[arg(long, global = true, env = ENV_AGENTS_MAX_PERIOD_DAYS)]
    pub max_period_days: Option<i64>,

    /// Maximum spans loaded per activity request
    #[arg(long, global = true, env = ENV_AGENTS_SPAN_LIMIT)]
    pub span_limit: Option<usize>,

    /// Timeout in seconds for the evaluation lookup
    #[arg(long, global = true, env = ENV_AGENTS_EVAL_TIMEOUT_SECS)]
    pub eval_timeout_secs: Option<u64>,

    /// JSON fixture with spans and evaluations loaded at startup
    #[arg(long, global = true, env = ENV_STORE_FIXTURE)]
    pub fixture: Option<PathBuf>,

    /// In-memory span retention cap
    #[arg(long, global = true, env = ENV_STORE_MAX_SPANS)]
    pub store_max_spans: Option<usize>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Aggregate the fixture once and print the report as JSON
    Report {
        /// Trailing window to aggregate
        #[arg(long, default_value = "7d", value_parser = period_parser())]
        period: PeriodSelector,
    },
}

fn period_parser() -> impl TypedValueParser<Value = PeriodSelector> {
    PossibleValuesParser::new(PeriodSelector::ALL.map(|p| p.as_str()))
        .try_map(|s| s.parse::<PeriodSelector>())
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub max_ids_per_agent: Option<usize>,
    pub max_period_days: Option<i64>,
    pub span_limit: Option<usize>,
    pub eval_timeout_secs: Option<u64>,
    pub fixture: Option<PathBuf>,
    pub store_max_spans: Option<usize>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        debug: cli.debug,
        config: cli.config,
        max_ids_per_agent: cli.max_ids_per_agent,
        max_period_days: cli.max_period_days,
        span_limit: cli.span_limit,
        eval_timeout_secs: cli.eval_timeout_secs,
        fixture: cli.fixture,
        store_max_spans: cli.store_max_spans,
    };
    (config, cli.command)
}
