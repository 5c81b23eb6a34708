//! Thread-safe wrapper for sharing one engine between threads.
//!
//! `SyncClusterEngine` keeps `ClusterEngine` behind an `RwLock`: rebuild,
//! reproject and activation take the write lock, snapshots take the read
//! lock. Readers therefore only ever see a fully computed state.
//!
//! Hooks are moved out of the engine and run after the write lock is
//! released, so a hook may read the shared engine (`frame()`, `handle()`,
//! `with_engine`) or even start another transition. Notifications are queued
//! in commit order while the write lock is held and delivered from that
//! queue by one thread at a time; a transition started from inside a hook
//! has its notifications delivered once the running hook returns.
//!
//! # Features
//!
//! Enable the `sync` feature to use this module:
//!
//! ```toml
//! [dependencies]
//! geocluster = { version = "0.1", features = ["sync"] }
//! ```

use super::ClusterEngine;
use super::hooks::{ClusterActivation, Hooks, Notification};
use super::state::IndexHandle;
use crate::error::Result;
use crate::partition::Locatable;
use crate::render::RenderFrame;
use geocluster_types::point::CategoryKey;
use geocluster_types::region::Region;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::Arc;

struct Shared<T> {
    engine: RwLock<ClusterEngine<T>>,
    hooks: Mutex<Hooks>,
    outbox: Mutex<VecDeque<Notification>>,
}

/// Thread-safe handle to a `ClusterEngine`; clones share the same engine.
pub struct SyncClusterEngine<T> {
    inner: Arc<Shared<T>>,
}

impl<T> Clone for SyncClusterEngine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Locatable> SyncClusterEngine<T> {
    pub fn new(mut engine: ClusterEngine<T>) -> Self {
        let hooks = engine.take_hooks();
        Self {
            inner: Arc::new(Shared {
                engine: RwLock::new(engine),
                hooks: Mutex::new(hooks),
                outbox: Mutex::new(VecDeque::new()),
            }),
        }
    }

    pub fn rebuild(&self, items: Vec<T>) -> Result<IndexHandle> {
        self.transition(|engine| engine.apply_rebuild(items))
    }

    pub fn set_clustering_enabled(&self, enabled: bool) -> Result<IndexHandle> {
        self.transition(|engine| engine.apply_clustering_enabled(enabled))
    }

    pub fn reproject(&self, region: Region) -> Result<()> {
        self.transition(|engine| engine.apply_reproject(region).map(|n| ((), n)))
    }

    pub fn activate_cluster(
        &self,
        category: &CategoryKey,
        cluster_id: u64,
    ) -> Result<ClusterActivation> {
        self.transition(|engine| engine.apply_activation(category, cluster_id))
    }

    /// Run a transition under the write lock, then deliver its notifications.
    fn transition<R>(
        &self,
        apply: impl FnOnce(&mut ClusterEngine<T>) -> Result<(R, Vec<Notification>)>,
    ) -> Result<R> {
        let value = {
            let mut engine = self.inner.engine.write();
            let (value, notifications) = apply(&mut engine)?;
            self.inner.outbox.lock().extend(notifications);
            value
        };
        self.deliver();
        Ok(value)
    }

    fn deliver(&self) {
        loop {
            // another thread, or a hook further up this stack, is delivering
            let Some(mut hooks) = self.inner.hooks.try_lock() else {
                return;
            };
            loop {
                let next = self.inner.outbox.lock().pop_front();
                match next {
                    Some(notification) => hooks.dispatch(&notification),
                    None => break,
                }
            }
            drop(hooks);

            // pick up anything queued while the hooks were being released
            if self.inner.outbox.lock().is_empty() {
                return;
            }
        }
    }
}

impl<T> SyncClusterEngine<T> {
    pub fn frame(&self) -> RenderFrame {
        self.inner.engine.read().frame()
    }

    pub fn handle(&self) -> IndexHandle {
        self.inner.engine.read().handle()
    }

    pub fn region(&self) -> Region {
        *self.inner.engine.read().region()
    }

    pub fn is_spiral_active(&self) -> bool {
        self.inner.engine.read().is_spiral_active()
    }

    /// Run `f` against a consistent read-only view of the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&ClusterEngine<T>) -> R) -> R {
        f(&self.inner.engine.read())
    }
}
