//! Gated task — a suspending task gated on one persisted scalar.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::suspend::{Completion, WorkFn, run_work};
use super::{LaunchTask, NextSlot};
use crate::config::ChainConfig;
use crate::store::SettingsStore;

/// A launch task that consults the settings store before running and may
/// record a value after it has run.
///
/// The canonical use is a one-time prompt: gate on "the key has never been
/// set", show the prompt, and persist `true` once the user dismisses it so
/// the next pipeline run skips the task.
///
/// Per `handle()` invocation the store is read exactly once, before the
/// skip-or-run decision, and written at most once, strictly after the chain
/// has been advanced. The predicate and the value producer are independent:
/// a task may gate on one condition and persist a different derived value.
pub struct GatedTask<T> {
    next: NextSlot,
    store: Arc<dyn SettingsStore>,
    key: String,
    predicate: Box<dyn Fn(Option<&T>) -> bool + Send + Sync>,
    work: Box<WorkFn>,
    update: Box<dyn Fn() -> Option<T> + Send + Sync>,
    stall_warn_after: Duration,
}

impl<T> GatedTask<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a gated task.
    ///
    /// `predicate` decides from the current persisted value (`None` when the
    /// key has never been set) whether to run the work or skip straight to
    /// the successor. `update` is evaluated lazily after the work completes;
    /// returning `None` leaves the store untouched.
    pub fn new(
        store: Arc<dyn SettingsStore>,
        key: impl Into<String>,
        predicate: impl Fn(Option<&T>) -> bool + Send + Sync + 'static,
        work: impl Fn(Completion) + Send + Sync + 'static,
        update: impl Fn() -> Option<T> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Self::with_config(store, key, predicate, work, update, ChainConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn SettingsStore>,
        key: impl Into<String>,
        predicate: impl Fn(Option<&T>) -> bool + Send + Sync + 'static,
        work: impl Fn(Completion) + Send + Sync + 'static,
        update: impl Fn() -> Option<T> + Send + Sync + 'static,
        config: ChainConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            next: NextSlot::new(),
            store,
            key: key.into(),
            predicate: Box::new(predicate),
            work: Box::new(work),
            update: Box::new(update),
            stall_warn_after: config.stall_warn_after,
        })
    }

    /// Current persisted value for this task's key.
    ///
    /// Read failures and stored values that do not match `T` are both
    /// treated as absent — the chain never surfaces store errors.
    async fn read_current(&self) -> Option<T> {
        let raw = match self.store.read(&self.key).await {
            Ok(value) => value?,
            Err(e) => {
                warn!(key = %self.key, error = %e, "store read failed; treating value as absent");
                return None;
            }
        };
        match serde_json::from_value(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(
                    key = %self.key,
                    error = %e,
                    "stored value does not match expected type; treating as absent"
                );
                None
            }
        }
    }

    /// Evaluate the value producer and persist its output, if any.
    async fn write_update(&self) {
        let Some(value) = (self.update)() else {
            debug!(key = %self.key, "value producer yielded nothing; store left untouched");
            return;
        };
        let raw = match serde_json::to_value(&value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to serialize updated value");
                return;
            }
        };
        if let Err(e) = self.store.write(&self.key, raw).await {
            warn!(key = %self.key, error = %e, "store write failed");
        }
    }
}

#[async_trait]
impl<T> LaunchTask for GatedTask<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn next_slot(&self) -> &NextSlot {
        &self.next
    }

    async fn handle(self: Arc<Self>) {
        let current = self.read_current().await;
        if !(self.predicate)(current.as_ref()) {
            debug!(key = %self.key, "gate closed; skipping launch task");
            return self.finish().await;
        }

        debug!(key = %self.key, "gate open; launch task suspending");
        if !run_work(&self.work, &self.key, self.stall_warn_after).await {
            return;
        }

        // Advance the chain before persisting: the successor must not wait
        // on the write, and the write must not race this task's own gate.
        Arc::clone(&self).finish().await;
        self.write_update().await;
    }
}
