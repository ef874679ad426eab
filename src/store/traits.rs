//! `SettingsStore` trait — the async key-value surface gated tasks consume.

use async_trait::async_trait;

use crate::error::StoreError;

/// Key-value persistence surface for gated launch tasks.
///
/// The contract is deliberately thin: last write wins, visible to subsequent
/// reads on the same store instance. No transactions are assumed — a gated
/// task's read and its later write are not atomic with respect to other
/// pipeline runs touching the same key.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn read(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn write(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;
}
