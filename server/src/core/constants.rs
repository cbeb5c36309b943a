// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "AgentDash";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "agentdash";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".agentdash";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "agentdash.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "AGENTDASH_CONFIG";

/// Environment variable for debug mode
pub const ENV_DEBUG: &str = "AGENTDASH_DEBUG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "AGENTDASH_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "AGENTDASH_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "AGENTDASH_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

// =============================================================================
// Environment Variables - Agent Activity
// =============================================================================

pub const ENV_AGENTS_MAX_IDS: &str = "AGENTDASH_AGENTS_MAX_IDS";
pub const ENV_AGENTS_MAX_PERIOD_DAYS: &str = "AGENTDASH_AGENTS_MAX_PERIOD_DAYS";
pub const ENV_AGENTS_SPAN_LIMIT: &str = "AGENTDASH_AGENTS_SPAN_LIMIT";
pub const ENV_AGENTS_EVAL_TIMEOUT_SECS: &str = "AGENTDASH_AGENTS_EVAL_TIMEOUT_SECS";

// =============================================================================
// Agent Activity Defaults
// =============================================================================

/// Sampled session/trace IDs returned per agent
pub const DEFAULT_MAX_IDS_PER_AGENT: usize = 50;

/// Largest accepted aggregation window, in calendar days
pub const DEFAULT_MAX_PERIOD_DAYS: i64 = 90;

/// Largest built-in period selector (30d); the configured max may not go below it
pub const MIN_MAX_PERIOD_DAYS: i64 = 30;

/// Spans fetched per activity request
pub const DEFAULT_SPAN_LIMIT: usize = 10_000;

/// Timeout for the batched evaluation lookup
pub const DEFAULT_EVAL_TIMEOUT_SECS: u64 = 30;

/// Spans considered agent invocations (OpenTelemetry GenAI semantic conventions)
pub const AGENT_SPAN_OPERATION: &str = "invoke_agent";

// =============================================================================
// Environment Variables - Store
// =============================================================================

pub const ENV_STORE_FIXTURE: &str = "AGENTDASH_STORE_FIXTURE";
pub const ENV_STORE_MAX_SPANS: &str = "AGENTDASH_STORE_MAX_SPANS";

// =============================================================================
// Store Defaults
// =============================================================================

/// In-memory span retention cap
pub const DEFAULT_STORE_MAX_SPANS: usize = 100_000;

/// In-memory evaluation retention cap
pub const DEFAULT_STORE_MAX_EVALUATIONS: usize = 100_000;

/// Interval between store size reports in the log
pub const STORE_STATS_INTERVAL_SECS: u64 = 300;

/// Largest batch accepted by the ingestion endpoints
pub const MAX_INGEST_BATCH: usize = 1_000;

// =============================================================================
// HTTP
// =============================================================================

/// Default request body limit (1MB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Request body limit for ingestion endpoints (8MB)
pub const INGEST_BODY_LIMIT: usize = 8 * 1024 * 1024;

// =============================================================================
// Shutdown
// =============================================================================

/// Graceful shutdown timeout for background tasks
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;
