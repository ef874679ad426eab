//! Chain primitive — the capability every launch task supports.
//!
//! A pipeline is a singly-linked chain of [`LaunchTask`] nodes executed one
//! at a time. Linking is fluent (`a.then(b).then(c)`), execution starts by
//! calling `handle()` on the head, and each node advances the chain through
//! `finish()` once its own work is done. The chain ends when a node has no
//! successor.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

pub mod gated;
pub mod inline;
pub mod suspend;

pub use gated::GatedTask;
pub use inline::InlineTask;
pub use suspend::{Completion, SuspendingTask};

/// Interior-mutable holder for a task's successor link.
///
/// Setting the slot replaces any previous link (last write wins). Chains are
/// normally built once, before execution starts; the slot is only read while
/// a run is in flight.
#[derive(Default)]
pub struct NextSlot(Mutex<Option<Arc<dyn LaunchTask>>>);

impl NextSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the successor link.
    pub fn set(&self, task: Arc<dyn LaunchTask>) {
        *self.0.lock().expect("next slot mutex poisoned") = Some(task);
    }

    /// Clone out the current successor, if any.
    pub fn get(&self) -> Option<Arc<dyn LaunchTask>> {
        self.0.lock().expect("next slot mutex poisoned").clone()
    }

    pub fn is_linked(&self) -> bool {
        self.0.lock().expect("next slot mutex poisoned").is_some()
    }
}

/// A node in a launch pipeline.
///
/// `handle()` must eventually cause exactly one call to `finish()` — either
/// directly (synchronous work) or after an external completion signal fires.
/// A task that never finishes stalls the chain at its position; that is the
/// only way to abort a pipeline and is a valid policy for work that failed.
#[async_trait]
pub trait LaunchTask: Send + Sync {
    /// The slot holding this task's successor link.
    fn next_slot(&self) -> &NextSlot;

    /// Begin this task's work.
    async fn handle(self: Arc<Self>);

    /// Advance the chain to the successor, if one is linked.
    ///
    /// Overriding this without invoking the successor makes the task a sink;
    /// any such override must document itself as one.
    async fn finish(self: Arc<Self>) {
        if let Some(next) = self.next_slot().get() {
            next.handle().await;
        }
    }

    /// Link `next` as this task's successor and return it, so chains read
    /// left to right: `a.then(b).then(c)`. Calling `then` again replaces the
    /// previous link.
    fn then(&self, next: Arc<dyn LaunchTask>) -> Arc<dyn LaunchTask> {
        self.next_slot().set(Arc::clone(&next));
        next
    }
}

/// Convenience builder for assembling and running a pipeline without keeping
/// track of the head node by hand.
#[derive(Default)]
pub struct Chain {
    head: Option<Arc<dyn LaunchTask>>,
    tail: Option<Arc<dyn LaunchTask>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to the end of the chain.
    pub fn then(mut self, task: Arc<dyn LaunchTask>) -> Self {
        match self.tail.take() {
            Some(tail) => {
                tail.then(Arc::clone(&task));
            }
            None => self.head = Some(Arc::clone(&task)),
        }
        self.tail = Some(task);
        self
    }

    /// Run the pipeline to completion (or until a task stalls).
    pub async fn run(self) {
        if let Some(head) = self.head {
            head.handle().await;
        }
    }
}
