//! Result types produced by the aggregation engine.

use serde::Serialize;

use crate::analyzers::grade::ScoreLabel;

/// Headline figures for the current view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub best_operator: String,
    pub avg_download: f64,
    pub avg_upload: f64,
    pub avg_score: f64,
    pub avg_latency: f64,
}

impl Kpis {
    pub fn empty() -> Self {
        Kpis {
            best_operator: "N/A".to_string(),
            avg_download: 0.0,
            avg_upload: 0.0,
            avg_score: 0.0,
            avg_latency: 0.0,
        }
    }
}

/// One series of a chart; `data[i]` belongs to `labels[i]` of its chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

/// Labels plus one dataset per series. Missing cells are 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    pub fn dataset(&self, label: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.label == label)
    }

    /// Value for `series` at `label`, if both exist.
    pub fn value(&self, series: &str, label: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == label)?;
        self.dataset(series)?.data.get(i).copied()
    }
}

/// One row of the area × operator table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaRow {
    pub area: String,
    pub operator: String,
    pub avg_download: f64,
    pub avg_upload: f64,
    pub avg_score: f64,
}

/// One map marker per area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub area: String,
    pub city: String,
    pub state: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub avg_score: f64,
    pub count: usize,
    pub operators: String,
}

/// Per-operator figures. Averages are `None` when the operator has no
/// records in the view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorPerformance {
    pub operator: String,
    pub count: usize,
    pub avg_download: Option<f64>,
    pub avg_upload: Option<f64>,
    pub avg_latency: Option<f64>,
    pub avg_score: Option<f64>,
    pub avg_signal: Option<f64>,
    pub label: Option<ScoreLabel>,
}

/// Every chart of both dashboards for one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub download_by_city: ChartData,
    pub latency_by_peak: ChartData,
    pub hourly_download: ChartData,
    pub download_by_operator_peak: ChartData,
    pub latency_by_city_network: ChartData,
    pub coverage_growth: ChartData,
    pub download_by_year: ChartData,
    pub latency_by_year_peak: ChartData,
    pub score_by_operator: ChartData,
}
