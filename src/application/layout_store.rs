// Layout store trait for persisted tiles
use crate::domain::dashboard::LayoutDocument;
use async_trait::async_trait;

#[async_trait]
pub trait LayoutStore: Send + Sync {
    async fn fetch_layout(&self) -> anyhow::Result<LayoutDocument>;

    async fn save_layout(&self, document: &LayoutDocument) -> anyhow::Result<()>;
}
