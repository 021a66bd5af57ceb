// In-memory collaborators for service tests
use crate::application::layout_store::LayoutStore;
use crate::application::sample_feed::{PageRequest, SampleFeed};
use crate::application::settings_store::SettingsStore;
use crate::domain::dashboard::LayoutDocument;
use crate::domain::telemetry::Sample;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

pub struct MemoryLayoutStore {
    initial: LayoutDocument,
    saved: Mutex<Vec<LayoutDocument>>,
    failing: AtomicBool,
}

impl MemoryLayoutStore {
    pub fn new(initial: LayoutDocument) -> Self {
        Self {
            initial,
            saved: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn last_saved(&self) -> Option<LayoutDocument> {
        self.saved.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LayoutStore for MemoryLayoutStore {
    async fn fetch_layout(&self) -> anyhow::Result<LayoutDocument> {
        Ok(self.initial.clone())
    }

    async fn save_layout(&self, document: &LayoutDocument) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("layout store unavailable");
        }
        self.saved.lock().unwrap().push(document.clone());
        Ok(())
    }
}

/// Serves canned samples per sensor type, newest first.
#[derive(Default)]
pub struct MemorySampleFeed {
    samples: Mutex<HashMap<String, Vec<Sample>>>,
    requests: AtomicUsize,
}

impl MemorySampleFeed {
    pub fn insert(&self, sensor_type: &str, samples: Vec<Sample>) {
        self.samples
            .lock()
            .unwrap()
            .insert(sensor_type.to_string(), samples);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SampleFeed for MemorySampleFeed {
    async fn fetch_sensor_data(
        &self,
        sensor_type: &str,
        page: PageRequest,
    ) -> anyhow::Result<Vec<Sample>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let samples = self.samples.lock().unwrap();
        let Some(found) = samples.get(sensor_type) else {
            anyhow::bail!("unknown sensor type {}", sensor_type);
        };
        let skip = (page.page.saturating_sub(1) * page.limit) as usize;
        Ok(found.iter().skip(skip).take(page.limit as usize).cloned().collect())
    }
}

/// Feed whose requests hang until `release` is called.
#[derive(Default)]
pub struct BlockingSampleFeed {
    gate: Notify,
    requests: AtomicUsize,
}

impl BlockingSampleFeed {
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn release(&self) {
        self.gate.notify_waiters();
    }
}

#[async_trait]
impl SampleFeed for BlockingSampleFeed {
    async fn fetch_sensor_data(
        &self,
        _sensor_type: &str,
        _page: PageRequest,
    ) -> anyhow::Result<Vec<Sample>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Map<String, Value>>,
    patches: Mutex<Vec<Map<String, Value>>>,
}

impl MemorySettingsStore {
    pub fn new(settings: Map<String, Value>) -> Self {
        Self {
            settings: Mutex::new(settings),
            patches: Mutex::new(Vec::new()),
        }
    }

    pub fn patches(&self) -> Vec<Map<String, Value>> {
        self.patches.lock().unwrap().clone()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get_settings(&self) -> anyhow::Result<Map<String, Value>> {
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn patch_settings(
        &self,
        changes: &Map<String, Value>,
    ) -> anyhow::Result<Map<String, Value>> {
        self.patches.lock().unwrap().push(changes.clone());
        let mut settings = self.settings.lock().unwrap();
        for (key, value) in changes {
            settings.insert(key.clone(), value.clone());
        }
        Ok(settings.clone())
    }
}
