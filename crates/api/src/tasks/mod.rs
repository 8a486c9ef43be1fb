//! Background tasks.

mod metrics;
mod scheduler;

pub use metrics::{ChannelMetricsTask, PoolMetricsTask};
pub use scheduler::{Task, TaskScheduler};
