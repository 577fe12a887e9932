use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Connection admission and completion tracking
///
/// Every spawned handler holds a [`ConnectionGuard`]; the active count goes
/// up when the guard is issued and down when it drops. Nothing in the server
/// waits for the count to reach zero, because the accept loop never exits
/// normally.
#[derive(Debug)]
pub struct ConnectionTracker {
    active_connections: AtomicUsize,
    total_connections: AtomicU64,
    connection_semaphore: Arc<Semaphore>,
    max_connections: usize,
}

impl ConnectionTracker {
    pub fn new(max_connections: usize) -> Arc<Self> {
        Arc::new(Self {
            active_connections: AtomicUsize::new(0),
            total_connections: AtomicU64::new(0),
            connection_semaphore: Arc::new(Semaphore::new(max_connections)),
            max_connections,
        })
    }

    /// Waits for a free connection slot
    pub async fn acquire_connection(self: &Arc<Self>) -> Result<ConnectionGuard, ConnectionError> {
        let permit = self
            .connection_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ConnectionError::Closed)?;

        let active = self.active_connections.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total_connections.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::debug!(
            active_connections = active,
            total_connections = total,
            "Connection slot acquired"
        );

        Ok(ConnectionGuard {
            _permit: permit,
            tracker: Arc::clone(self),
            start_time: Instant::now(),
        })
    }

    /// Number of handlers currently holding a slot
    pub fn active(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }

    /// Get current metrics
    pub fn metrics(&self) -> ConnectionMetrics {
        ConnectionMetrics {
            active_connections: self.active_connections.load(Ordering::SeqCst),
            total_connections: self.total_connections.load(Ordering::SeqCst),
            available_slots: self.connection_semaphore.available_permits(),
            max_connections: self.max_connections,
        }
    }
}

/// RAII guard for one connection slot
#[derive(Debug)]
pub struct ConnectionGuard {
    _permit: OwnedSemaphorePermit,
    tracker: Arc<ConnectionTracker>,
    start_time: Instant,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let active = self
            .tracker
            .active_connections
            .fetch_sub(1, Ordering::SeqCst)
            - 1;
        let duration = self.start_time.elapsed();

        tracing::debug!(
            active_connections = active,
            connection_duration_ms = duration.as_millis(),
            "Connection slot released"
        );
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Connection tracker closed")]
    Closed,
}

/// Connection metrics for monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionMetrics {
    pub active_connections: usize,
    pub total_connections: u64,
    pub available_slots: usize,
    pub max_connections: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_connection_tracker() {
        let tracker = ConnectionTracker::new(2);

        let guard1 = tracker.acquire_connection().await.unwrap();
        let _guard2 = tracker.acquire_connection().await.unwrap();
        assert_eq!(tracker.active(), 2);

        // Third slot has to wait
        assert!(
            timeout(Duration::from_millis(50), tracker.acquire_connection())
                .await
                .is_err()
        );

        drop(guard1);
        assert_eq!(tracker.active(), 1);
        let _guard3 = tracker.acquire_connection().await.unwrap();

        let metrics = tracker.metrics();
        assert_eq!(metrics.active_connections, 2);
        assert_eq!(metrics.total_connections, 3);
        assert_eq!(metrics.available_slots, 0);
        assert_eq!(metrics.max_connections, 2);
    }

    #[tokio::test]
    async fn test_guard_released_from_spawned_task() {
        let tracker = ConnectionTracker::new(1);
        let guard = tracker.acquire_connection().await.unwrap();

        tokio::spawn(async move {
            let _guard = guard;
        })
        .await
        .unwrap();

        assert_eq!(tracker.active(), 0);
        assert_eq!(tracker.metrics().available_slots, 1);
    }
}
