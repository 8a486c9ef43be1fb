//! Gauge refresh tasks.

use domain::models::ChatEvent;
use domain::services::ChannelRegistry;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use super::scheduler::Task;
use crate::middleware::metrics::record_chat_registry;

const METRICS_PERIOD: Duration = Duration::from_secs(10);

/// Records connection pool gauges.
pub struct PoolMetricsTask {
    pool: PgPool,
}

impl PoolMetricsTask {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Task for PoolMetricsTask {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn period(&self) -> Duration {
        METRICS_PERIOD
    }

    async fn run(&self) -> Result<(), String> {
        persistence::metrics::record_pool_metrics(&self.pool);
        Ok(())
    }
}

/// Records how many jobs have live chat viewers.
pub struct ChannelMetricsTask {
    channels: Arc<ChannelRegistry<ChatEvent>>,
}

impl ChannelMetricsTask {
    pub fn new(channels: Arc<ChannelRegistry<ChatEvent>>) -> Self {
        Self { channels }
    }
}

#[async_trait::async_trait]
impl Task for ChannelMetricsTask {
    fn name(&self) -> &'static str {
        "channel_metrics"
    }

    fn period(&self) -> Duration {
        METRICS_PERIOD
    }

    async fn run(&self) -> Result<(), String> {
        record_chat_registry(self.channels.job_count(), self.channels.connection_count());
        Ok(())
    }
}
