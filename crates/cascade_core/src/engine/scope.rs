use std::sync::Arc;

use parking_lot::Mutex;
use rayon::ThreadPool;

use super::session::Session;
use crate::config::session::SessionConfig;
use crate::storage::{ColumnStore, FrameKey};

/// Scope that functions execute in.
///
/// Keeps track of every frame key minted through it, which is how frames
/// created while evaluating an expression get associated with that
/// evaluation.
#[derive(Debug)]
pub struct Scope {
    session: Arc<Session>,
    minted: Mutex<Vec<FrameKey>>,
}

impl Scope {
    pub fn new(session: Arc<Session>) -> Self {
        Scope {
            session,
            minted: Mutex::new(Vec::new()),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn store(&self) -> &Arc<dyn ColumnStore> {
        self.session.store()
    }

    pub fn config(&self) -> &SessionConfig {
        self.session.config()
    }

    pub fn pool(&self) -> &ThreadPool {
        self.session.pool()
    }

    /// Mint a key for a new frame, tracking it in this scope.
    pub fn mint_key(&self) -> FrameKey {
        let key = self.session.mint_key();
        self.minted.lock().push(key);
        key
    }

    /// Keys minted through this scope, in minting order.
    pub fn minted_keys(&self) -> Vec<FrameKey> {
        self.minted.lock().clone()
    }
}
