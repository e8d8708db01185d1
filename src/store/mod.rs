pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::quota::QuotaStore;
use anyhow::Result;
use disk::DiskQuotaStore;
use std::sync::Arc;
use tracing::debug;

/// Opens the persistent quota store under the configured data directory.
pub fn open_quota_store(config: &AppConfig) -> Result<Arc<dyn QuotaStore>> {
    let path = config.default_data_path()?.join("quota");
    debug!("Opening quota store at {}", path.display());
    Ok(Arc::new(DiskQuotaStore::open(&path)?))
}
