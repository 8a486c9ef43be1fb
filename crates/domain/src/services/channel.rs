//! Per-job fan-out registry for live connections.
//!
//! Each connection owns a bounded queue. Broadcasting takes a snapshot of the
//! job's connections under the lock and pushes to the queues after releasing
//! it, so a slow or dead connection never blocks the caller or its peers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

pub type ConnectionId = u64;

struct Connection<T> {
    id: ConnectionId,
    sender: mpsc::Sender<T>,
}

/// Outcome of one broadcast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

pub struct ChannelRegistry<T> {
    jobs: Mutex<HashMap<Uuid, Vec<Connection<T>>>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl<T> ChannelRegistry<T> {
    /// `buffer` is the per-connection queue depth.
    pub fn new(buffer: usize) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Registers a new connection and returns its receiving end.
    ///
    /// Dropping the returned [`Subscription`] deregisters it.
    pub fn subscribe(self: &Arc<Self>, job_id: Uuid) -> Subscription<T> {
        let (sender, receiver) = mpsc::channel(self.buffer);
        let id = self.register(job_id, sender);
        Subscription {
            id,
            job_id,
            receiver,
            registry: Arc::downgrade(self),
        }
    }

    /// Registers an externally created sender. Connections are kept in
    /// registration order.
    pub fn register(&self, job_id: Uuid, sender: mpsc::Sender<T>) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock()
            .entry(job_id)
            .or_default()
            .push(Connection { id, sender });
        debug!(job_id = %job_id, connection = id, "Live connection registered");
        id
    }

    /// Removes a connection. The job entry goes away with its last connection.
    pub fn unsubscribe(&self, job_id: Uuid, id: ConnectionId) -> bool {
        let mut jobs = self.lock();
        let Some(connections) = jobs.get_mut(&job_id) else {
            return false;
        };

        let before = connections.len();
        connections.retain(|c| c.id != id);
        let removed = connections.len() != before;
        if connections.is_empty() {
            jobs.remove(&job_id);
        }
        if removed {
            debug!(job_id = %job_id, connection = id, "Live connection removed");
        }
        removed
    }

    pub fn subscriber_count(&self, job_id: Uuid) -> usize {
        self.lock().get(&job_id).map_or(0, Vec::len)
    }

    pub fn is_registered(&self, job_id: Uuid, id: ConnectionId) -> bool {
        self.lock()
            .get(&job_id)
            .is_some_and(|c| c.iter().any(|c| c.id == id))
    }

    /// Number of jobs with at least one connection.
    pub fn job_count(&self) -> usize {
        self.lock().len()
    }

    pub fn connection_count(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    // A panic while holding the lock can not leave the map half-updated.
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Vec<Connection<T>>>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> ChannelRegistry<T> {
    /// Sends `event` to the connections registered at call time.
    pub fn broadcast(&self, job_id: Uuid, event: &T) -> BroadcastReport {
        let snapshot: Vec<(ConnectionId, mpsc::Sender<T>)> = self
            .lock()
            .get(&job_id)
            .map(|connections| {
                connections
                    .iter()
                    .map(|c| (c.id, c.sender.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let mut report = BroadcastReport::default();
        for (id, sender) in snapshot {
            match sender.try_send(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    report.dropped += 1;
                    warn!(job_id = %job_id, connection = id, "Live connection queue full, event dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    report.dropped += 1;
                    debug!(job_id = %job_id, connection = id, "Live connection already closed");
                }
            }
        }
        report
    }
}

impl<T> std::fmt::Debug for ChannelRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("jobs", &self.job_count())
            .field("buffer", &self.buffer)
            .finish()
    }
}

/// A registered connection's receiving end.
pub struct Subscription<T> {
    id: ConnectionId,
    job_id: Uuid,
    receiver: mpsc::Receiver<T>,
    registry: Weak<ChannelRegistry<T>>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Waits for the next event. Cancel safe.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(self.job_id, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(buffer: usize) -> Arc<ChannelRegistry<String>> {
        Arc::new(ChannelRegistry::new(buffer))
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_subscriber() {
        let registry = registry(8);
        let job = Uuid::new_v4();
        let mut a = registry.subscribe(job);
        let mut b = registry.subscribe(job);

        let report = registry.broadcast(job, &"hello".to_string());

        assert_eq!(report, BroadcastReport { delivered: 2, dropped: 0 });
        assert_eq!(a.recv().await.as_deref(), Some("hello"));
        assert_eq!(b.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_broadcast_is_scoped_to_job() {
        let registry = registry(8);
        let job = Uuid::new_v4();
        let mut other = registry.subscribe(Uuid::new_v4());
        let _sub = registry.subscribe(job);

        registry.broadcast(job, &"for job".to_string());

        assert_eq!(other.try_recv(), None);
    }

    #[test]
    fn test_broadcast_without_subscribers_is_silent() {
        let registry = registry(8);
        let report = registry.broadcast(Uuid::new_v4(), &"nobody".to_string());
        assert_eq!(report, BroadcastReport::default());
        assert_eq!(registry.job_count(), 0);
    }

    #[test]
    fn test_drop_unsubscribes_and_prunes_job() {
        let registry = registry(8);
        let job = Uuid::new_v4();
        let a = registry.subscribe(job);
        let b = registry.subscribe(job);
        assert_eq!(registry.subscriber_count(job), 2);

        let a_id = a.id();
        drop(a);
        assert!(!registry.is_registered(job, a_id));
        assert_eq!(registry.subscriber_count(job), 1);

        drop(b);
        assert_eq!(registry.job_count(), 0);
    }

    #[test]
    fn test_unsubscribe_by_identity() {
        let registry = registry(8);
        let job = Uuid::new_v4();
        let (tx, _rx) = mpsc::channel(1);
        let first = registry.register(job, tx.clone());
        let second = registry.register(job, tx);

        assert!(registry.unsubscribe(job, first));
        assert!(!registry.unsubscribe(job, first));
        assert!(registry.is_registered(job, second));
        assert!(!registry.unsubscribe(Uuid::new_v4(), second));
    }

    #[test]
    fn test_late_subscriber_misses_earlier_broadcast() {
        let registry = registry(8);
        let job = Uuid::new_v4();
        let _early = registry.subscribe(job);

        registry.broadcast(job, &"first".to_string());
        let mut late = registry.subscribe(job);

        assert_eq!(late.try_recv(), None);
        registry.broadcast(job, &"second".to_string());
        assert_eq!(late.try_recv().as_deref(), Some("second"));
    }

    #[test]
    fn test_full_or_closed_connection_does_not_block_others() {
        let registry = registry(1);
        let job = Uuid::new_v4();

        let (closed_tx, closed_rx) = mpsc::channel(1);
        registry.register(job, closed_tx);
        drop(closed_rx);

        let mut slow = registry.subscribe(job);
        let mut healthy = registry.subscribe(job);

        let first = registry.broadcast(job, &"one".to_string());
        assert_eq!(first, BroadcastReport { delivered: 2, dropped: 1 });
        assert_eq!(healthy.try_recv().as_deref(), Some("one"));

        // `slow` never drained its single slot.
        let second = registry.broadcast(job, &"two".to_string());
        assert_eq!(second, BroadcastReport { delivered: 1, dropped: 2 });
        assert_eq!(healthy.try_recv().as_deref(), Some("two"));
        assert_eq!(slow.try_recv().as_deref(), Some("one"));
    }

    #[test]
    fn test_order_per_connection() {
        let registry = registry(16);
        let job = Uuid::new_v4();
        let mut sub = registry.subscribe(job);

        for i in 0..10 {
            registry.broadcast(job, &i.to_string());
        }
        let received: Vec<String> = std::iter::from_fn(|| sub.try_recv()).collect();
        let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(received, expected);
    }

    #[test]
    fn test_subscription_outliving_registry() {
        let registry = registry(1);
        let sub = registry.subscribe(Uuid::new_v4());
        drop(registry);
        drop(sub);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_connect_disconnect_broadcast() {
        let registry = registry(64);
        let job = Uuid::new_v4();

        let mut handles = Vec::new();
        for i in 0..32 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let sub = registry.subscribe(job);
                registry.broadcast(job, &format!("from {}", i));
                tokio::task::yield_now().await;
                drop(sub);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.connection_count(), 0);
        assert_eq!(registry.job_count(), 0);
    }
}
