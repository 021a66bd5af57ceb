// HTTP backend client - Sensor feed, layout store and settings store
use crate::application::layout_store::LayoutStore;
use crate::application::sample_feed::{PageRequest, SampleFeed};
use crate::application::settings_store::SettingsStore;
use crate::domain::dashboard::LayoutDocument;
use crate::domain::telemetry::Sample;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn sensor_data_url(&self, sensor_type: &str) -> String {
        self.url(&format!("/sensor-data/{}/", urlencoding::encode(sensor_type)))
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", what))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} request failed with status {}: {}", what, status, body);
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T> {
        self.send(request, what)
            .await?
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse {} response", what))
    }

    pub async fn health_check(&self) -> Result<Value> {
        self.send_json(self.client.get(self.url("/health-check/")), "health check")
            .await
    }
}

#[async_trait]
impl SampleFeed for HttpBackend {
    async fn fetch_sensor_data(&self, sensor_type: &str, page: PageRequest) -> Result<Vec<Sample>> {
        let request = self
            .client
            .get(self.sensor_data_url(sensor_type))
            .query(&[("page", page.page), ("limit", page.limit)]);

        let samples: Vec<Sample> = self.send_json(request, "sensor data").await?;
        tracing::debug!("Fetched {} samples for {}", samples.len(), sensor_type);
        Ok(samples)
    }
}

#[async_trait]
impl LayoutStore for HttpBackend {
    async fn fetch_layout(&self) -> Result<LayoutDocument> {
        self.send_json(self.client.get(self.url("/api/layout")), "layout")
            .await
    }

    async fn save_layout(&self, document: &LayoutDocument) -> Result<()> {
        let request = self.client.post(self.url("/api/layout")).json(document);
        self.send(request, "save layout").await?;
        tracing::debug!("Saved layout with {} tiles", document.tiles.len());
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for HttpBackend {
    async fn get_settings(&self) -> Result<Map<String, Value>> {
        self.send_json(self.client.get(self.url("/api/settings")), "settings")
            .await
    }

    async fn patch_settings(&self, changes: &Map<String, Value>) -> Result<Map<String, Value>> {
        let request = self.client.patch(self.url("/api/settings")).json(changes);
        self.send_json(request, "update settings").await
    }
}
