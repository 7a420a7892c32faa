mod config;
mod repos;
mod services;
mod stats;
mod system;

pub use config::Config;
pub use repos::{
    ActiveLimit, DeleteResult, IPushSubscriptionRepo, IReminderRepo, ITrackedEntityRepo,
    ReminderCompletion, Repos,
};
pub use services::*;
pub use stats::{SchedulerStats, SchedulerStatsSnapshot, TickCounts};
use std::sync::Arc;
pub use system::{ISys, RealSys, StaticTimeSys};

#[derive(Clone)]
pub struct NudgeContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub channels: Channels,
    pub stats: Arc<SchedulerStats>,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

impl NudgeContext {
    async fn create(params: ContextParams) -> anyhow::Result<Self> {
        let repos = Repos::create_postgres(&params.postgres_connection_string).await?;
        let config = Config::new();
        let channels = Channels::from_config(&config, &repos);
        Ok(Self {
            repos,
            config,
            sys: Arc::new(RealSys {}),
            channels,
            stats: Arc::new(SchedulerStats::new()),
        })
    }

    /// Context backed by inmemory repositories, used by tests and when the
    /// server is started with the `inmemory` argument
    pub fn create_inmemory() -> Self {
        let repos = Repos::create_inmemory();
        let config = Config::new();
        let channels = Channels::from_config(&config, &repos);
        Self {
            repos,
            config,
            sys: Arc::new(RealSys {}),
            channels,
            stats: Arc::new(SchedulerStats::new()),
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> anyhow::Result<NudgeContext> {
    NudgeContext::create(ContextParams {
        postgres_connection_string: get_psql_connection_string()?,
    })
    .await
}

fn get_psql_connection_string() -> anyhow::Result<String> {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING)
        .map_err(|_| anyhow::anyhow!("{} env var to be present.", PSQL_CONNECTION_STRING))
}
