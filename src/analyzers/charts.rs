//! Chart-ready breakdowns of a filtered view.
//!
//! Each breakdown partitions the view by one or two categorical fields with
//! [`Grouped`] and reads means (or counts) back out in label order.

use std::collections::{BTreeMap, BTreeSet};

use crate::analyzers::grade::score_label;
use crate::analyzers::grouped::{Grouped, ValueField};
use crate::analyzers::types::{AreaRow, ChartData, ChartSet, Dataset, MapPoint, OperatorPerformance};
use crate::analyzers::utility::Accumulator;
use crate::record::Record;
use crate::store::{FilteredView, RecordStore};

/// City-keyed charts show at most this many cities: the first ones in
/// sorted order, not in dataset order.
pub const TOP_CITIES: usize = 5;

const PEAK_LABELS: [&str; 2] = ["Non-Peak", "Peak"];
const PEAK_SERIES: [&str; 2] = ["peak", "non-peak"];

fn peak_series(r: &Record) -> &'static str {
    if r.is_peak_hour { "peak" } else { "non-peak" }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Distinct first and second key components, each sorted.
fn axes<A: Ord + Clone, B: Ord + Clone>(grouped: &Grouped<(A, B)>) -> (Vec<A>, Vec<B>) {
    let first: BTreeSet<A> = grouped.keys().map(|(a, _)| a.clone()).collect();
    let second: BTreeSet<B> = grouped.keys().map(|(_, b)| b.clone()).collect();
    (first.into_iter().collect(), second.into_iter().collect())
}

/// Lays a two-key grouping out as labels × series.
fn pivot<A, B>(grouped: &Grouped<(A, B)>, labels: &[A], series: &[B], cell: fn(&Accumulator) -> f64) -> ChartData
where
    A: Ord + Clone + ToString,
    B: Ord + Clone + ToString,
{
    let datasets = series
        .iter()
        .map(|s| Dataset {
            label: s.to_string(),
            data: labels
                .iter()
                .map(|l| grouped.get(&(l.clone(), s.clone())).map(cell).unwrap_or(0.0))
                .collect(),
        })
        .collect();

    ChartData {
        labels: labels.iter().map(ToString::to_string).collect(),
        datasets,
    }
}

/// Mean download per city (first [`TOP_CITIES`]) for each operator.
pub fn download_by_city(view: &FilteredView<'_>) -> ChartData {
    let grouped = Grouped::build(
        view.iter(),
        |r| Some((non_empty(&r.city)?, r.operator_key())),
        |r| r.download_mbps,
    );
    let (mut cities, operators) = axes(&grouped);
    cities.truncate(TOP_CITIES);
    pivot(&grouped, &cities, &operators, Accumulator::mean)
}

/// Mean latency in non-peak and peak hours for each operator.
pub fn latency_by_peak(view: &FilteredView<'_>) -> ChartData {
    let grouped = Grouped::build(
        view.iter(),
        |r| Some((r.peak_label().to_string(), r.operator_key())),
        |r| r.latency_ms,
    );
    let (_, operators) = axes(&grouped);
    let labels = PEAK_LABELS.map(String::from);
    pivot(&grouped, &labels, &operators, Accumulator::mean)
}

/// Mean download for every hour 0–23 for each operator.
pub fn hourly_download(view: &FilteredView<'_>) -> ChartData {
    let grouped = Grouped::build(view.iter(), |r| Some((r.hour?, r.operator_key())), |r| r.download_mbps);
    let (_, operators) = axes(&grouped);
    let hours: Vec<u8> = (0..24).collect();
    pivot(&grouped, &hours, &operators, Accumulator::mean)
}

/// Mean download per operator, split into peak and non-peak series.
pub fn download_by_operator_peak(view: &FilteredView<'_>) -> ChartData {
    let grouped = Grouped::build(
        view.iter(),
        |r| Some((r.operator_key(), peak_series(r).to_string())),
        |r| r.download_mbps,
    );
    let (operators, _) = axes(&grouped);
    let series = PEAK_SERIES.map(String::from);
    pivot(&grouped, &operators, &series, Accumulator::mean)
}

/// Mean latency per city (first [`TOP_CITIES`]) for each network type.
pub fn latency_by_city_network(view: &FilteredView<'_>) -> ChartData {
    let grouped = Grouped::build(
        view.iter(),
        |r| Some((non_empty(&r.city)?, non_empty(&r.network_type)?)),
        |r| r.latency_ms,
    );
    let (mut cities, networks) = axes(&grouped);
    cities.truncate(TOP_CITIES);
    pivot(&grouped, &cities, &networks, Accumulator::mean)
}

/// Record count per year for each network type.
pub fn coverage_growth(view: &FilteredView<'_>) -> ChartData {
    let grouped = Grouped::build(
        view.iter(),
        |r| Some((r.year?, non_empty(&r.network_type)?)),
        |r| ValueField::Count.of(r),
    );
    let (years, networks) = axes(&grouped);
    pivot(&grouped, &years, &networks, |acc| acc.sum)
}

/// Mean download per year for each operator.
pub fn download_by_year(view: &FilteredView<'_>) -> ChartData {
    let grouped = Grouped::build(view.iter(), |r| Some((r.year?, r.operator_key())), |r| r.download_mbps);
    let (years, operators) = axes(&grouped);
    pivot(&grouped, &years, &operators, Accumulator::mean)
}

/// Mean latency per year, split into peak and non-peak series.
pub fn latency_by_year_peak(view: &FilteredView<'_>) -> ChartData {
    let grouped = Grouped::build(
        view.iter(),
        |r| Some((r.year?, peak_series(r).to_string())),
        |r| r.latency_ms,
    );
    let (years, _) = axes(&grouped);
    let series = PEAK_SERIES.map(String::from);
    pivot(&grouped, &years, &series, Accumulator::mean)
}

/// Mean final network score per operator.
pub fn score_by_operator(view: &FilteredView<'_>) -> ChartData {
    let grouped = Grouped::build(view.iter(), |r| Some(r.operator_key()), |r| r.final_network_score);
    ChartData {
        labels: grouped.keys().cloned().collect(),
        datasets: vec![Dataset {
            label: "Final Network Score".to_string(),
            data: grouped.iter().map(|(_, acc)| acc.mean()).collect(),
        }],
    }
}

/// All charts for one view.
pub fn chart_set(view: &FilteredView<'_>) -> ChartSet {
    ChartSet {
        download_by_city: download_by_city(view),
        latency_by_peak: latency_by_peak(view),
        hourly_download: hourly_download(view),
        download_by_operator_peak: download_by_operator_peak(view),
        latency_by_city_network: latency_by_city_network(view),
        coverage_growth: coverage_growth(view),
        download_by_year: download_by_year(view),
        latency_by_year_peak: latency_by_year_peak(view),
        score_by_operator: score_by_operator(view),
    }
}

/// Area × operator rows (operator as stored), best confidence score first.
pub fn area_table(view: &FilteredView<'_>) -> Vec<AreaRow> {
    let key = |r: &Record| Some((r.area.clone(), r.operator.clone()));
    let download = Grouped::build(view.iter(), key, |r| r.download_mbps);
    let upload = Grouped::build(view.iter(), key, |r| r.upload_mbps);
    let score = Grouped::build(view.iter(), key, |r| r.confidence_score);

    let mut rows: Vec<AreaRow> = download
        .iter()
        .map(|(k, acc)| AreaRow {
            area: k.0.clone(),
            operator: k.1.clone(),
            avg_download: acc.mean(),
            avg_upload: upload.mean(k).unwrap_or(0.0),
            avg_score: score.mean(k).unwrap_or(0.0),
        })
        .collect();

    rows.sort_by(|a, b| b.avg_score.total_cmp(&a.avg_score));
    rows
}

/// One point per area, placed at the first record carrying coordinates.
pub fn map_points(view: &FilteredView<'_>) -> Vec<MapPoint> {
    struct Marker<'a> {
        first: &'a Record,
        coords: Option<(f64, f64)>,
        score: Accumulator,
        operators: BTreeSet<&'a str>,
    }

    let mut markers: BTreeMap<&str, Marker<'_>> = BTreeMap::new();
    for r in view.iter() {
        let marker = markers.entry(r.area.as_str()).or_insert_with(|| Marker {
            first: r,
            coords: None,
            score: Accumulator::default(),
            operators: BTreeSet::new(),
        });
        if marker.coords.is_none() {
            marker.coords = r.coordinates();
        }
        marker.score.push(r.confidence_score);
        if !r.operator.is_empty() {
            marker.operators.insert(r.operator.as_str());
        }
    }

    markers
        .into_iter()
        .map(|(area, m)| MapPoint {
            area: area.to_string(),
            city: m.first.city.clone(),
            state: m.first.state.clone(),
            lat: m.coords.map(|c| c.0),
            lng: m.coords.map(|c| c.1),
            avg_score: m.score.mean(),
            count: m.score.count,
            operators: m.operators.into_iter().collect::<Vec<_>>().join(", "),
        })
        .collect()
}

/// Figures for every operator known to the dataset, computed over `view`.
/// Operators absent from the view are listed with no averages.
pub fn operator_performance(store: &RecordStore, view: &FilteredView<'_>) -> Vec<OperatorPerformance> {
    let per = |field: ValueField| Grouped::build(view.iter(), |r| Some(r.operator_key()), |r| field.of(r));
    let download = per(ValueField::Download);
    let upload = per(ValueField::Upload);
    let latency = per(ValueField::Latency);
    let score = per(ValueField::FinalScore);
    let signal = per(ValueField::Signal);

    let operators: BTreeSet<String> = store
        .records()
        .iter()
        .chain(view.iter())
        .map(Record::operator_key)
        .collect();

    operators
        .into_iter()
        .map(|op| {
            let avg_score = score.mean(&op);
            OperatorPerformance {
                count: download.get(&op).map_or(0, |acc| acc.count),
                avg_download: download.mean(&op),
                avg_upload: upload.mean(&op),
                avg_latency: latency.mean(&op),
                avg_score,
                avg_signal: signal.mean(&op),
                label: avg_score.map(score_label),
                operator: op,
            }
        })
        .collect()
}
