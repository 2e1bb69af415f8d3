//! Core application

use std::sync::Arc;

use anyhow::Result;

use crate::api::ApiServer;
use crate::core::cli::{self, Cli};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::cache::CacheService;
use crate::data::store::SqliteStore;
use crate::domain::counter::{CounterService, Reconciler};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub cache: Arc<CacheService>,
    pub database: Arc<SqliteStore>,
    pub counters: Arc<CounterService>,
    pub reconciler: Arc<Reconciler>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let cli = cli::parse();
        let app = Self::init(&cli).await?;
        Self::start_server(app).await
    }

    async fn init(cli: &Cli) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let cache = Arc::new(
            CacheService::new(&config.cache)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to initialize cache service: {}", e))?,
        );
        tracing::debug!(backend = cache.backend_name(), "Cache initialized");

        let database = Arc::new(SqliteStore::init(&config.store.sqlite_path).await?);

        let counters = Arc::new(CounterService::new(
            cache.clone(),
            database.clone(),
            config.counter.clone(),
        ));
        let reconciler = Arc::new(Reconciler::new(cache.clone(), database.clone()));

        let shutdown = ShutdownService::new();

        Ok(Self {
            shutdown,
            config,
            cache,
            database,
            counters,
            reconciler,
        })
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

        tracing::info!(
            host = %app.config.server.host,
            port = app.config.server.port,
            cache_backend = app.cache.backend_name(),
            db = %app.config.store.sqlite_path.display(),
            "Tally starting"
        );

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        // One last flush so increments since the previous sweep survive restart
        let stats = app.reconciler.sweep_once().await;
        tracing::info!(
            flushed = stats.flushed,
            skipped = stats.skipped,
            "Final reconcile sweep complete"
        );

        app.database.close().await;
        Ok(())
    }

    async fn start_background_tasks(&self) {
        self.shutdown
            .register(
                self.database
                    .start_checkpoint_task(self.shutdown.subscribe()),
            )
            .await;

        if let Some(h) = self.reconciler.start_task(
            self.config.counter.reconcile_interval_secs,
            self.shutdown.subscribe(),
        ) {
            self.shutdown.register(h).await;
        }

        tracing::debug!("Background tasks started");
    }
}
