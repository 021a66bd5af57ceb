// Settings store trait
use async_trait::async_trait;
use serde_json::{Map, Value};

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_settings(&self) -> anyhow::Result<Map<String, Value>>;

    /// Send only the changed fields; returns the store's view after the patch
    async fn patch_settings(
        &self,
        changes: &Map<String, Value>,
    ) -> anyhow::Result<Map<String, Value>>;
}
