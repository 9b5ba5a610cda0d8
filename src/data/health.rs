//! Keeps the database connection alive.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::Store;

/// Pings the store and reconnects if that fails.
/// Returns `true` if a reconnect was attempted.
pub async fn check_connection(store: &dyn Store) -> bool {
    match store.ping().await {
        Ok(()) => false,
        Err(e) => {
            tracing::warn!("Database ping failed, reconnecting. {e}");
            if let Err(e) = store.reconnect().await {
                tracing::error!("Database reconnect failed: {e}");
            }
            true
        }
    }
}

/// Runs [check_connection] every `period`, starting one `period` from now.
pub fn spawn_health_check(store: Arc<dyn Store>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        loop {
            interval.tick().await;
            check_connection(store.as_ref()).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::data::MemoryStore;

    #[tokio::test]
    async fn healthy_store_is_left_alone() {
        let store = MemoryStore::default();

        assert!(!check_connection(&store).await);
        assert_eq!(store.reconnects(), 0);
    }

    #[tokio::test]
    async fn failed_ping_reconnects() {
        let store = MemoryStore::default();
        store.set_failing(true);

        assert!(check_connection(&store).await);
        assert_eq!(store.reconnects(), 1);
        // Reconnecting fixed it.
        assert!(!check_connection(&store).await);
        assert_eq!(store.reconnects(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn checks_run_periodically() {
        let store = Arc::new(MemoryStore::default());
        let handle = spawn_health_check(store.clone(), Duration::from_secs(180));

        store.set_failing(true);
        tokio::time::sleep(Duration::from_secs(179)).await;
        assert_eq!(store.reconnects(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.reconnects(), 1);

        handle.abort();
    }
}
