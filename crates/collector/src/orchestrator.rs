//! Per-pull entry point: serialized collections with retry and recycling.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};
use wemportal_core::config::CollectionConfig;
use wemportal_core::Result;

use crate::catalog::MetricCatalog;
use crate::session::{SessionManager, SessionState};
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionPolicy {
    /// Restarts allowed per collection after automation failures.
    pub max_retries: u32,
    /// Collections a session may serve before it is replaced.
    pub recycle_after: u64,
}

impl Default for CollectionPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            recycle_after: 200,
        }
    }
}

impl From<&CollectionConfig> for CollectionPolicy {
    fn from(config: &CollectionConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            recycle_after: u64::from(config.recycle_after),
        }
    }
}

/// Point-in-time view of the session, for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub state: SessionState,
    pub page_fresh: bool,
    pub collections_since_restart: u64,
    pub restarts: u64,
}

pub struct CollectionOrchestrator {
    session: Mutex<SessionManager>,
    catalog: Arc<MetricCatalog>,
    policy: CollectionPolicy,
}

impl CollectionOrchestrator {
    pub fn new(session: SessionManager, catalog: Arc<MetricCatalog>, policy: CollectionPolicy) -> Self {
        Self {
            session: Mutex::new(session),
            catalog,
            policy,
        }
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    /// Bring the session up ahead of the first pull.
    pub async fn start(&self) -> Result<()> {
        self.session.lock().await.start().await
    }

    /// One collection. Concurrent callers queue on the session lock.
    pub async fn collect(&self) -> Result<Snapshot> {
        let mut session = self.session.lock().await;
        let mut retries_left = self.policy.max_retries;

        loop {
            let result = self.attempt(&mut session).await;
            session.mark_stale();

            match result {
                Ok(snapshot) => {
                    info!(metrics = snapshot.len(), "Exporting metrics");
                    return Ok(snapshot);
                }
                Err(e) if e.is_automation() => {
                    warn!(error = %e, retries_left, "Automation failure during collection");
                    if retries_left == 0 {
                        warn!("No retries left, giving up");
                        return Err(e);
                    }
                    retries_left -= 1;
                    session.restart().await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(&self, session: &mut SessionManager) -> Result<Snapshot> {
        session.ensure_started().await?;
        session.ensure_recycled(self.policy.recycle_after).await?;
        session.ensure_fresh().await?;
        let scrape = session.scrape().await?;
        info!(
            timestamp = %scrape.timestamp,
            points = scrape.points.len(),
            "Parsed page"
        );
        let snapshot = Snapshot::translate(&scrape.points, &self.catalog)?;
        session.record_collection();
        Ok(snapshot)
    }

    pub async fn stats(&self) -> SessionStats {
        let session = self.session.lock().await;
        SessionStats {
            state: session.state(),
            page_fresh: session.is_page_fresh(),
            collections_since_restart: session.collections_since_restart(),
            restarts: session.restarts(),
        }
    }

    /// Tear the browser down. Waits for an in-flight collection first.
    pub async fn shutdown(&self) {
        self.session.lock().await.shutdown().await;
    }
}
