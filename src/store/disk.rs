use crate::core::quota::{QuotaState, QuotaStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "quota";
const STATE_KEY: &str = "state";

/// Quota store persisted in a fjall keyspace so the counter survives restarts.
pub struct DiskQuotaStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskQuotaStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open keyspace at {}", path.display()))?;
        let partition = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .context("Failed to open quota partition")?;

        Ok(Self {
            keyspace,
            partition,
        })
    }
}

#[async_trait]
impl QuotaStore for DiskQuotaStore {
    async fn get(&self) -> Result<Option<QuotaState>> {
        let Some(raw) = self.partition.get(STATE_KEY)? else {
            debug!("Quota MISS");
            return Ok(None);
        };
        let state: QuotaState =
            serde_json::from_slice(&raw).context("Failed to decode stored quota state")?;
        debug!("Quota GET: {:?}", state);
        Ok(Some(state))
    }

    async fn set(&self, state: &QuotaState) -> Result<()> {
        self.partition
            .insert(STATE_KEY, serde_json::to_vec(state)?)
            .context("Failed to write quota state")?;
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to flush quota state")?;
        debug!("Quota SET: {:?}", state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_disk_store_get_set() {
        let dir = tempdir().unwrap();
        let store = DiskQuotaStore::open(dir.path()).unwrap();

        // Initially, store is empty
        assert!(store.get().await.unwrap().is_none());

        let state = QuotaState {
            remaining: 4,
            window_start: Utc.with_ymd_and_hms(2025, 5, 1, 8, 30, 0).unwrap(),
        };
        store.set(&state).await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_disk_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let state = QuotaState {
            remaining: 2,
            window_start: Utc.with_ymd_and_hms(2025, 5, 1, 8, 30, 0).unwrap(),
        };

        {
            let store = DiskQuotaStore::open(dir.path()).unwrap();
            store.set(&state).await.unwrap();
        }

        let reopened = DiskQuotaStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get().await.unwrap(), Some(state));
    }
}
