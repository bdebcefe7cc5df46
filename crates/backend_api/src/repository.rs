use async_trait::async_trait;
use holdings_pipeline::{HoldingsPipeline, HoldingsSource};
use models::HoldingsReport;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Repository trait for accessing the consolidated holdings report.
/// Handlers depend on this seam only, so tests can swap in fixed data.
#[async_trait]
pub trait HoldingsRepository: Send + Sync {
    async fn fetch_report(&self) -> Result<Arc<HoldingsReport>>;
    async fn invalidate_cache(&self);
}

struct CachedReport {
    report: Arc<HoldingsReport>,
    loaded_at: Instant,
}

/// Runs the pipeline against a source and keeps the result for `ttl`.
pub struct CachedHoldingsRepository {
    source: Arc<dyn HoldingsSource>,
    pipeline: HoldingsPipeline,
    ttl: Duration,
    cache: Arc<RwLock<Option<CachedReport>>>,
}

impl CachedHoldingsRepository {
    pub fn new(source: Arc<dyn HoldingsSource>, pipeline: HoldingsPipeline, ttl: Duration) -> Self {
        Self {
            source,
            pipeline,
            ttl,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    fn fresh(&self, entry: &Option<CachedReport>) -> Option<Arc<HoldingsReport>> {
        entry
            .as_ref()
            .filter(|cached| cached.loaded_at.elapsed() < self.ttl)
            .map(|cached| Arc::clone(&cached.report))
    }

    /// Fetch and run on a blocking thread. Nothing is cached on failure.
    async fn load_report(&self) -> Result<Arc<HoldingsReport>> {
        let source = Arc::clone(&self.source);
        let pipeline = self.pipeline.clone();

        let report = tokio::task::spawn_blocking(move || pipeline.load(source.as_ref())).await??;
        Ok(Arc::new(report))
    }
}

#[async_trait]
impl HoldingsRepository for CachedHoldingsRepository {
    async fn fetch_report(&self) -> Result<Arc<HoldingsReport>> {
        // Check cache first
        {
            let cache = self.cache.read().await;
            if let Some(report) = self.fresh(&cache) {
                debug!("serving cached holdings report");
                return Ok(report);
            }
        }

        // Concurrent misses wait here and reuse the first refresh
        let mut cache = self.cache.write().await;
        if let Some(report) = self.fresh(&cache) {
            return Ok(report);
        }

        match self.load_report().await {
            Ok(report) => {
                info!(
                    source = %report.metadata.source,
                    positions = report.kpis.position_count,
                    "holdings report refreshed"
                );
                *cache = Some(CachedReport {
                    report: Arc::clone(&report),
                    loaded_at: Instant::now(),
                });
                Ok(report)
            }
            Err(err) => {
                warn!(error = %err, "holdings refresh failed");
                Err(err)
            }
        }
    }

    async fn invalidate_cache(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }
}
