use crate::core::quota::{QuotaState, QuotaStore};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory quota store; state is lost with the process.
#[derive(Default)]
pub struct MemoryQuotaStore {
    inner: Mutex<Option<QuotaState>>,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn get(&self) -> Result<Option<QuotaState>> {
        let state = *self.inner.lock().await;
        debug!("Quota GET: {:?}", state);
        Ok(state)
    }

    async fn set(&self, state: &QuotaState) -> Result<()> {
        let mut inner = self.inner.lock().await;
        debug!("Quota SET: {:?}", state);
        *inner = Some(*state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_memory_store_get_set() {
        let store = MemoryQuotaStore::new();

        // Initially, store is empty
        assert!(store.get().await.unwrap().is_none());

        let state = QuotaState {
            remaining: 7,
            window_start: Utc::now(),
        };
        store.set(&state).await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some(state));
    }
}
