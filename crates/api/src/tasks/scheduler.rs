//! Periodic background tasks.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A unit of periodic work.
#[async_trait::async_trait]
pub trait Task: Send + Sync {
    fn name(&self) -> &'static str;

    fn period(&self) -> Duration;

    async fn run(&self) -> Result<(), String>;
}

/// Runs registered tasks on their own intervals until shut down.
pub struct TaskScheduler {
    tasks: Vec<Arc<dyn Task>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            tasks: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            handles: Vec::new(),
        }
    }

    pub fn register<T: Task + 'static>(&mut self, task: T) {
        self.tasks.push(Arc::new(task));
    }

    pub fn start(&mut self) {
        info!(tasks = self.tasks.len(), "Starting task scheduler");

        for task in &self.tasks {
            let task = Arc::clone(task);
            let mut shutdown_rx = self.shutdown_rx.clone();

            self.handles.push(tokio::spawn(async move {
                let name = task.name();
                let mut interval = tokio::time::interval(task.period());
                // The first tick fires immediately.
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let start = Instant::now();
                            match task.run().await {
                                Ok(()) => debug!(
                                    task = name,
                                    elapsed_ms = start.elapsed().as_millis(),
                                    "Task completed"
                                ),
                                Err(e) => error!(
                                    task = name,
                                    elapsed_ms = start.elapsed().as_millis(),
                                    error = %e,
                                    "Task failed"
                                ),
                            }
                        }
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                debug!(task = name, "Task stopped");
                                break;
                            }
                        }
                    }
                }
            }));
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Waits for every task loop to exit, up to `timeout`.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        let all = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Task panicked");
                }
            }
        };
        if tokio::time::timeout(timeout, all).await.is_err() {
            warn!(?timeout, "Task shutdown timed out");
        }
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}
