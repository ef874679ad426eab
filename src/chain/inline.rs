//! Inline task — the plain chain variant for synchronous work.

use std::sync::Arc;

use async_trait::async_trait;

use super::{LaunchTask, NextSlot};

/// A launch task that runs a synchronous closure and finishes immediately.
///
/// Useful for cheap setup steps that never wait on anything, and as a
/// terminal marker at the end of a chain.
pub struct InlineTask {
    next: NextSlot,
    action: Box<dyn Fn() + Send + Sync>,
}

impl InlineTask {
    pub fn new(action: impl Fn() + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            next: NextSlot::new(),
            action: Box::new(action),
        })
    }
}

#[async_trait]
impl LaunchTask for InlineTask {
    fn next_slot(&self) -> &NextSlot {
        &self.next
    }

    async fn handle(self: Arc<Self>) {
        (self.action)();
        self.finish().await;
    }
}
