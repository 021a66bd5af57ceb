// Telemetry data domain models and rolling statistics
use super::error::{DashboardError, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, VecDeque};

/// A single reading from the sensor backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    /// Fields sent alongside the reading, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value,
            extra: Map::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {ms}"))),
        RawTimestamp::Text(text) => parse_timestamp(&text).map_err(serde::de::Error::custom),
    }
}

/// Parse an RFC 3339 timestamp. Offset-less timestamps are read as UTC.
pub fn parse_timestamp(text: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{}': {}", text, e))
}

/// Order in which the sample feed returns readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl FeedOrder {
    pub fn into_chronological(self, mut samples: Vec<Sample>) -> Vec<Sample> {
        if self == FeedOrder::NewestFirst {
            samples.reverse();
        }
        samples
    }
}

/// Moving average over `values`, one output per input.
///
/// The first `window_size - 1` outputs average over the partial window seen so
/// far rather than being padded. Runs in O(n) using a running sum and a bounded
/// queue of the most recent values.
pub fn compute_rolling_averages(values: &[f64], window_size: usize) -> Result<Vec<f64>> {
    if window_size == 0 {
        return Err(DashboardError::InvalidArgument(
            "window size must be a positive integer".to_string(),
        ));
    }

    let mut window = VecDeque::with_capacity(window_size.min(values.len()) + 1);
    let mut sum = 0.0;
    let mut averages = Vec::with_capacity(values.len());

    for &value in values {
        window.push_back(value);
        sum += value;

        if window.len() > window_size {
            if let Some(oldest) = window.pop_front() {
                sum -= oldest;
            }
        }

        averages.push(sum / window.len() as f64);
    }

    Ok(averages)
}

/// Key under which a window's average is reported, e.g. `avg10`.
pub fn average_key(window_size: usize) -> String {
    format!("avg{}", window_size)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    #[serde(flatten)]
    pub sample: Sample,
    #[serde(flatten)]
    pub averages: BTreeMap<String, f64>,
}

/// Attach one rolling average per window to each chronologically ordered sample.
pub fn build_chart_points(samples: Vec<Sample>, windows: &[usize]) -> Result<Vec<ChartPoint>> {
    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();

    let series = windows
        .iter()
        .map(|&w| compute_rolling_averages(&values, w).map(|avg| (average_key(w), avg)))
        .collect::<Result<Vec<_>>>()?;

    Ok(samples
        .into_iter()
        .enumerate()
        .map(|(i, sample)| ChartPoint {
            sample,
            averages: series
                .iter()
                .map(|(key, avg)| (key.clone(), avg[i]))
                .collect(),
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub current: f64,
}

impl SeriesStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let current = *values.last()?;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;

        Some(Self {
            min,
            max,
            mean,
            current,
        })
    }
}

/// Y-axis range for a chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for AxisBounds {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl AxisBounds {
    /// Pad the observed range so it fills `1 / scale_factor` of the axis.
    /// A flat series is treated as having a range of 1.
    pub fn scaled(stats: Option<&SeriesStats>, scale_factor: f64) -> Self {
        let Some(stats) = stats else {
            return Self::default();
        };

        let range = stats.max - stats.min;
        let range = if range == 0.0 { 1.0 } else { range };
        let extra = range * (scale_factor - 1.0) / 2.0;

        Self {
            min: stats.min - extra,
            max: stats.max + extra,
        }
    }
}

/// Everything a chart needs to draw one sensor stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesView {
    pub points: Vec<ChartPoint>,
    pub stats: Option<SeriesStats>,
    pub bounds: AxisBounds,
}

impl SeriesView {
    pub fn build(samples: Vec<Sample>, windows: &[usize], scale_factor: f64) -> Result<Self> {
        let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
        let stats = SeriesStats::from_values(&values);
        let bounds = AxisBounds::scaled(stats.as_ref(), scale_factor);
        let points = build_chart_points(samples, windows)?;

        Ok(Self {
            points,
            stats,
            bounds,
        })
    }
}
