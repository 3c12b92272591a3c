use std::sync::Arc;

use cascade_error::{Result, ResultExt};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use super::scope::Scope;
use crate::config::session::SessionConfig;
use crate::storage::{ColumnStore, FrameKey};

/// Long-lived execution context.
///
/// Owns the store handle and the thread pool partitions are executed on.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    store: Arc<dyn ColumnStore>,
    pool: Arc<ThreadPool>,
}

impl Session {
    pub fn try_new(config: SessionConfig, store: Arc<dyn ColumnStore>) -> Result<Arc<Self>> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|idx| format!("cascade-partition-{idx}"))
            .build()
            .context("Failed to build partition thread pool")?;

        debug!(threads = config.threads, chunk_rows = config.chunk_rows, "creating session");

        Ok(Arc::new(Session {
            config,
            store,
            pool: Arc::new(pool),
        }))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ColumnStore> {
        &self.store
    }

    pub fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    /// Allocate a fresh, globally unique key for a new frame.
    pub fn mint_key(&self) -> FrameKey {
        FrameKey::new_v4()
    }

    /// Create a new scope for evaluating expressions in this session.
    pub fn new_scope(self: &Arc<Self>) -> Arc<Scope> {
        Arc::new(Scope::new(self.clone()))
    }
}
