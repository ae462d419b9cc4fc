// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Token Janitor
//!
//! Background task that removes expired rows from the token registry.
//! Revocation already deletes its row, and the gate rejects expired rows on
//! its own, so the sweep only reclaims space.
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::storage::{Database, DbResult, TokenRepository};

pub struct TokenJanitor {
    db: Arc<Database>,
    interval: Duration,
}

impl TokenJanitor {
    pub fn new(db: Arc<Database>, interval: Duration) -> Self {
        Self { db, interval }
    }

    /// Run sweeps until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(janitor.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Token janitor starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Token janitor shutting down");
                    return;
                }
            }

            if let Err(e) = self.sweep() {
                warn!(error = %e, "Token janitor: sweep failed");
            }
        }
    }

    /// Purge every expired registry row once. Returns the number removed.
    pub fn sweep(&self) -> DbResult<usize> {
        let purged = TokenRepository::new(&self.db).purge_expired(Utc::now())?;
        if purged > 0 {
            info!(purged, "Token janitor: purged expired tokens");
        } else {
            debug!("Token janitor: nothing to purge");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_state;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn sweep_removes_only_expired_rows() {
        let (state, _dir) = test_state();
        let repo = TokenRepository::new(&state.db);
        let now = Utc::now();
        repo.record("old", "u", now - ChronoDuration::hours(2), now - ChronoDuration::hours(1))
            .unwrap();
        repo.record("edge", "u", now - ChronoDuration::hours(1), now).unwrap();
        repo.record("live", "u", now, now + ChronoDuration::hours(1)).unwrap();

        let janitor = TokenJanitor::new(state.db.clone(), Duration::from_secs(60));
        assert_eq!(janitor.sweep().unwrap(), 2);
        assert!(repo.is_live("live", "u", Utc::now()).unwrap());
        assert_eq!(janitor.sweep().unwrap(), 0);
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let (state, _dir) = test_state();
        let janitor = TokenJanitor::new(state.db.clone(), Duration::from_secs(3600));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(janitor.run(shutdown.clone()));

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("janitor did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn run_sweeps_on_each_tick() {
        let (state, _dir) = test_state();
        let now = Utc::now();
        TokenRepository::new(&state.db)
            .record("old", "u", now - ChronoDuration::hours(2), now - ChronoDuration::hours(1))
            .unwrap();

        let janitor = TokenJanitor::new(state.db.clone(), Duration::from_millis(10));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(janitor.run(shutdown.clone()));

        let mut purged = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if TokenRepository::new(&state.db).get("old").unwrap().is_none() {
                purged = true;
                break;
            }
        }
        shutdown.cancel();
        handle.await.unwrap();
        assert!(purged);
    }
}
