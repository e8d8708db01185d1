//! Rolling-window request quota persisted through a [`QuotaStore`]

use crate::core::error::QuotaError;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    pub remaining: u32,
    pub window_start: DateTime<Utc>,
}

/// Persistence for the quota counter. Lives outside the process so restarts
/// don't hand out a fresh allowance.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    async fn get(&self) -> Result<Option<QuotaState>>;
    async fn set(&self, state: &QuotaState) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allowed {
    pub remaining: u32,
}

/// Read-only view of the quota for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub remaining: u32,
    pub max_requests: u32,
    pub window_hours: i64,
    /// `None` when no window is currently open.
    pub resets_at: Option<DateTime<Utc>>,
}

pub struct RateLimiter {
    store: Arc<dyn QuotaStore>,
    policy: QuotaPolicy,
    // Serializes the load-modify-store cycle.
    lock: Mutex<()>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn QuotaStore>, policy: QuotaPolicy) -> Self {
        Self {
            store,
            policy,
            lock: Mutex::new(()),
        }
    }

    /// Applies the window reset rule to a stored state. Returns the state and
    /// whether it belongs to a still-open window.
    fn effective_state(&self, stored: Option<QuotaState>, now: DateTime<Utc>) -> (QuotaState, bool) {
        match stored {
            Some(state) if now - state.window_start <= self.policy.window => (
                QuotaState {
                    remaining: state.remaining.min(self.policy.max_requests),
                    window_start: state.window_start,
                },
                true,
            ),
            _ => (
                QuotaState {
                    remaining: self.policy.max_requests,
                    window_start: now,
                },
                false,
            ),
        }
    }

    pub async fn check_and_consume(&self) -> Result<Allowed, QuotaError> {
        self.check_and_consume_at(Utc::now()).await
    }

    pub async fn check_and_consume_at(&self, now: DateTime<Utc>) -> Result<Allowed, QuotaError> {
        let _guard = self.lock.lock().await;

        let stored = self
            .store
            .get()
            .await
            .map_err(|e| QuotaError::Store(format!("{e:#}")))?;
        let (mut state, open) = self.effective_state(stored, now);
        if !open {
            debug!("Quota window reset, {} requests available", state.remaining);
        }

        if state.remaining == 0 {
            debug!("Quota exhausted");
            return Err(QuotaError::Exceeded {
                max_requests: self.policy.max_requests,
                window_hours: self.policy.window.num_hours(),
                resets_at: state.window_start + self.policy.window,
            });
        }

        state.remaining -= 1;
        self.store
            .set(&state)
            .await
            .map_err(|e| QuotaError::Store(format!("{e:#}")))?;
        debug!("Quota consumed, {} requests remaining", state.remaining);

        Ok(Allowed {
            remaining: state.remaining,
        })
    }

    pub async fn snapshot(&self) -> Result<QuotaSnapshot> {
        self.snapshot_at(Utc::now()).await
    }

    /// Reports the quota as of `now` without writing anything back.
    pub async fn snapshot_at(&self, now: DateTime<Utc>) -> Result<QuotaSnapshot> {
        let stored = self.store.get().await?;
        let (state, open) = self.effective_state(stored, now);
        Ok(QuotaSnapshot {
            remaining: state.remaining,
            max_requests: self.policy.max_requests,
            window_hours: self.policy.window.num_hours(),
            resets_at: open.then(|| state.window_start + self.policy.window),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryQuotaStore;
    use chrono::TimeZone;

    fn limiter(max_requests: u32) -> (RateLimiter, Arc<MemoryQuotaStore>) {
        let store = Arc::new(MemoryQuotaStore::new());
        let policy = QuotaPolicy {
            max_requests,
            window: Duration::hours(24),
        };
        (RateLimiter::new(store.clone(), policy), store)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_consumes_until_exhausted() {
        let (limiter, _) = limiter(3);

        for expected in [2, 1, 0] {
            let allowed = limiter.check_and_consume_at(t0()).await.unwrap();
            assert_eq!(allowed.remaining, expected);
        }

        let err = limiter.check_and_consume_at(t0()).await.unwrap_err();
        match err {
            QuotaError::Exceeded {
                max_requests,
                resets_at,
                ..
            } => {
                assert_eq!(max_requests, 3);
                assert_eq!(resets_at, t0() + Duration::hours(24));
            }
            other => panic!("Expected quota exceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resets_after_window() {
        let (limiter, _) = limiter(2);
        limiter.check_and_consume_at(t0()).await.unwrap();
        limiter.check_and_consume_at(t0()).await.unwrap();
        assert!(limiter.check_and_consume_at(t0()).await.is_err());

        // Exactly one window later is still inside it
        let edge = t0() + Duration::hours(24);
        assert!(limiter.check_and_consume_at(edge).await.is_err());

        let later = edge + Duration::seconds(1);
        let allowed = limiter.check_and_consume_at(later).await.unwrap();
        assert_eq!(allowed.remaining, 1);
    }

    #[tokio::test]
    async fn test_window_start_only_moves_on_reset() {
        let (limiter, store) = limiter(5);
        limiter.check_and_consume_at(t0()).await.unwrap();
        limiter
            .check_and_consume_at(t0() + Duration::hours(3))
            .await
            .unwrap();

        let state = store.get().await.unwrap().unwrap();
        assert_eq!(state.window_start, t0());
        assert_eq!(state.remaining, 3);
    }

    #[tokio::test]
    async fn test_snapshot_does_not_mutate() {
        let (limiter, store) = limiter(4);
        let fresh = limiter.snapshot_at(t0()).await.unwrap();
        assert_eq!(fresh.remaining, 4);
        assert_eq!(fresh.window_hours, 24);
        assert!(fresh.resets_at.is_none());
        assert!(store.get().await.unwrap().is_none());

        limiter.check_and_consume_at(t0()).await.unwrap();
        let before = store.get().await.unwrap();
        let snapshot = limiter.snapshot_at(t0() + Duration::hours(1)).await.unwrap();
        assert_eq!(snapshot.remaining, 3);
        assert_eq!(snapshot.resets_at, Some(t0() + Duration::hours(24)));
        assert_eq!(store.get().await.unwrap(), before);

        let expired = limiter.snapshot_at(t0() + Duration::hours(25)).await.unwrap();
        assert_eq!(expired.remaining, 4);
        assert_eq!(store.get().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_stored_remaining_is_capped() {
        let (limiter, store) = limiter(2);
        store
            .set(&QuotaState {
                remaining: 50,
                window_start: t0(),
            })
            .await
            .unwrap();

        let allowed = limiter.check_and_consume_at(t0()).await.unwrap();
        assert_eq!(allowed.remaining, 1);
    }

    #[tokio::test]
    async fn test_concurrent_consumers_never_overspend() {
        let (limiter, _) = limiter(5);
        let limiter = Arc::new(limiter);

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.check_and_consume_at(t0()).await.is_ok() })
            })
            .collect();

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 5);
    }
}
