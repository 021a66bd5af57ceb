// Settings service - Proxy to the backend settings store
use crate::application::settings_store::SettingsStore;
use crate::domain::error::{DashboardError, Result};
use crate::domain::settings::changed_fields;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsUpdate {
    Unchanged,
    Updated(Map<String, Value>),
}

#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
    /// Settings as last seen from the store
    known: Arc<RwLock<Option<Map<String, Value>>>>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            known: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn get(&self) -> Result<Map<String, Value>> {
        let settings = self
            .store
            .get_settings()
            .await
            .map_err(DashboardError::Persistence)?;
        *self.known.write().await = Some(settings.clone());
        Ok(settings)
    }

    /// Send the fields of `edited` that differ from the last known settings.
    pub async fn update(&self, edited: Map<String, Value>) -> Result<SettingsUpdate> {
        let known = self.known.read().await.clone();
        let initial = match known {
            Some(settings) => settings,
            None => self.get().await?,
        };

        let changes = changed_fields(&initial, &edited);
        if changes.is_empty() {
            return Ok(SettingsUpdate::Unchanged);
        }

        tracing::info!("Updating {} settings field(s)", changes.len());
        let updated = self.store.patch_settings(&changes).await.map_err(|e| {
            tracing::warn!("Error updating settings: {:#}", e);
            DashboardError::Persistence(e)
        })?;
        *self.known.write().await = Some(updated.clone());
        Ok(SettingsUpdate::Updated(updated))
    }
}
