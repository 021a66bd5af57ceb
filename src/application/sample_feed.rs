// Sample feed trait for sensor readings
use crate::domain::telemetry::{FeedOrder, Sample, SeriesView};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn first(limit: u32) -> Self {
        Self { page: 1, limit }
    }
}

#[async_trait]
pub trait SampleFeed: Send + Sync {
    /// Fetch one page of readings for a sensor, in the feed's native order
    async fn fetch_sensor_data(
        &self,
        sensor_type: &str,
        page: PageRequest,
    ) -> anyhow::Result<Vec<Sample>>;
}

/// Fetches a sensor's readings and turns them into a chart-ready series.
#[derive(Clone)]
pub struct SeriesLoader {
    feed: Arc<dyn SampleFeed>,
    order: FeedOrder,
}

impl SeriesLoader {
    pub fn new(feed: Arc<dyn SampleFeed>, order: FeedOrder) -> Self {
        Self { feed, order }
    }

    /// Samples are put in chronological order before any averaging.
    pub async fn load(
        &self,
        sensor_type: &str,
        limit: u32,
        windows: &[usize],
        scale_factor: f64,
    ) -> anyhow::Result<SeriesView> {
        let samples = self
            .feed
            .fetch_sensor_data(sensor_type, PageRequest::first(limit))
            .await?;
        let samples = self.order.into_chronological(samples);
        Ok(SeriesView::build(samples, windows, scale_factor)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::MemorySampleFeed;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_newest_first_feed_is_averaged_chronologically() {
        let feed = Arc::new(MemorySampleFeed::default());
        let newest_first = (1..=3)
            .rev()
            .map(|i| Sample::new(Utc.timestamp_opt(i, 0).unwrap(), i as f64 * 10.0))
            .collect();
        feed.insert("temperature", newest_first);

        let loader = SeriesLoader::new(feed, FeedOrder::NewestFirst);
        let view = loader.load("temperature", 100, &[2], 2.0).await.unwrap();

        let values: Vec<f64> = view.points.iter().map(|p| p.sample.value).collect();
        assert_eq!(values, vec![10.0, 20.0, 30.0]);
        assert_eq!(view.points[2].averages["avg2"], 25.0);
        assert_eq!(view.stats.unwrap().current, 30.0);
    }

    #[tokio::test]
    async fn test_feed_errors_propagate() {
        let feed = Arc::new(MemorySampleFeed::default());
        let loader = SeriesLoader::new(feed, FeedOrder::OldestFirst);
        assert!(loader.load("missing", 10, &[10], 2.0).await.is_err());
    }
}
