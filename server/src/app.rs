//! Core application

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::api::ApiServer;
use crate::api::routes::agents::types::AgentActivityDto;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG, STORE_STATS_INTERVAL_SECS};
use crate::core::shutdown::ShutdownService;
use crate::data::MemoryStore;
use crate::domain::agents::{AgentActivityService, PeriodSelector};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub store: Arc<MemoryStore>,
    pub activity: Arc<AgentActivityService>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config)?;

        match command {
            Some(Commands::Report { period }) => app.print_report(period).await,
            Some(Commands::Start) | None => Self::start_server(app).await,
        }
    }

    /// Build the application from CLI config (loads config files and fixture)
    pub fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        Self::from_config(config)
    }

    /// Build the application from an already loaded config
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let store = Arc::new(MemoryStore::new(
            config.store.max_spans,
            config.store.max_evaluations,
        ));

        if let Some(path) = &config.store.fixture_path {
            let (spans, evaluations) = store
                .load_fixture(path)
                .with_context(|| format!("Failed to load fixture: {}", path.display()))?;
            tracing::info!(
                spans,
                evaluations,
                path = %path.display(),
                "Fixture loaded"
            );
        }

        // The same store backs both repositories
        let activity = Arc::new(AgentActivityService::new(
            store.clone(),
            store.clone(),
            &config.agents,
        ));

        Ok(Self {
            shutdown: ShutdownService::new(),
            config,
            store,
            activity,
        })
    }

    /// Aggregate once and print the activity response as JSON
    async fn print_report(&self, period: PeriodSelector) -> Result<()> {
        let report = self
            .activity
            .activity_for(period, Utc::now())
            .await
            .context("Failed to aggregate agent activity")?;
        let dto = AgentActivityDto::new(period, report);
        println!("{}", serde_json::to_string_pretty(&dto)?);
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        app.start_background_tasks().await;

        banner::print_banner(
            &app.config.server.host,
            app.config.server.port,
            app.store.span_count(),
            app.store.evaluation_count(),
        );

        if app.config.debug {
            tracing::info!("Debug mode enabled");
        }

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }

    pub async fn start_background_tasks(&self) {
        self.shutdown
            .register(self.store.start_stats_task(
                Duration::from_secs(STORE_STATS_INTERVAL_SECS),
                self.shutdown.subscribe(),
            ))
            .await;

        tracing::debug!("Background tasks started");
    }
}
