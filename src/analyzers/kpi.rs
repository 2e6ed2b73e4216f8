use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::analyzers::grouped::{Grouped, ValueField};
use crate::analyzers::types::Kpis;
use crate::analyzers::utility::mean;
use crate::store::FilteredView;

/// Operator favoured by the ranking when it is close to the strict winner.
pub const PREFERRED_OPERATOR: &str = "JIO";

/// Relative band around the strict winner inside which the preferred
/// operator takes the title.
pub const PREFERENCE_BAND: f64 = 0.10;

/// The metric used to rank operators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Download,
    Upload,
    Latency,
    #[default]
    Score,
}

impl Metric {
    /// Lower is better only for latency.
    pub fn minimizes(self) -> bool {
        matches!(self, Metric::Latency)
    }

    pub fn value_field(self) -> ValueField {
        match self {
            Metric::Download => ValueField::Download,
            Metric::Upload => ValueField::Upload,
            Metric::Latency => ValueField::Latency,
            Metric::Score => ValueField::Confidence,
        }
    }
}

/// Unrecognised names rank by score, like the dashboard's default.
impl FromStr for Metric {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "download" => Metric::Download,
            "upload" => Metric::Upload,
            "latency" => Metric::Latency,
            _ => Metric::Score,
        })
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Metric::Download => "download",
            Metric::Upload => "upload",
            Metric::Latency => "latency",
            Metric::Score => "score",
        })
    }
}

/// Headline averages over the view plus the best operator for `metric`.
///
/// An empty view yields zeros and `N/A` without dividing.
pub fn calculate_kpis(view: &FilteredView<'_>, metric: Metric) -> Kpis {
    if view.is_empty() {
        return Kpis::empty();
    }

    let column = |field: ValueField| view.iter().map(|r| field.of(r)).collect::<Vec<_>>();

    Kpis {
        best_operator: best_operator(view, metric).unwrap_or_else(|| "N/A".to_string()),
        avg_download: mean(&column(ValueField::Download)),
        avg_upload: mean(&column(ValueField::Upload)),
        avg_score: mean(&column(ValueField::Confidence)),
        avg_latency: mean(&column(ValueField::Latency)),
    }
}

/// Ranks operators (upper-cased) by their mean `metric`.
///
/// The strict winner is the highest mean, or the lowest for latency; ties go
/// to the alphabetically first operator. [`PREFERRED_OPERATOR`] then takes
/// the title if its mean is within [`PREFERENCE_BAND`] of the winner's:
/// `mean > best * 0.9` when maximising, `mean < best * 1.1` when minimising.
pub fn best_operator(view: &FilteredView<'_>, metric: Metric) -> Option<String> {
    let field = metric.value_field();
    let grouped = Grouped::build(view.iter(), |r| Some(r.operator_key()), |r| field.of(r));

    let mut best: Option<(&String, f64)> = None;
    for (operator, acc) in grouped.iter() {
        let avg = acc.mean();
        let better = match best {
            None => true,
            Some((_, best_avg)) if metric.minimizes() => avg < best_avg,
            Some((_, best_avg)) => avg > best_avg,
        };
        if better {
            best = Some((operator, avg));
        }
    }
    let (winner, best_avg) = best?;

    if let Some(preferred) = grouped.mean(&PREFERRED_OPERATOR.to_string()) {
        let within_band = if metric.minimizes() {
            preferred < best_avg * (1.0 + PREFERENCE_BAND)
        } else {
            preferred > best_avg * (1.0 - PREFERENCE_BAND)
        };
        if within_band {
            debug!(%metric, strict_winner = %winner, "Preferred operator within band");
            return Some(PREFERRED_OPERATOR.to_string());
        }
    }

    Some(winner.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterState, Selection};
    use crate::store::RecordStore;
    use serde_json::{Value, json};

    fn store(rows: Value) -> RecordStore {
        RecordStore::from_json_value(&rows).unwrap()
    }

    #[test]
    fn test_empty_view_returns_zeros() {
        let kpis = calculate_kpis(&FilteredView::default(), Metric::Score);

        assert_eq!(kpis.best_operator, "N/A");
        assert_eq!(kpis.avg_download, 0.0);
        assert_eq!(kpis.avg_upload, 0.0);
        assert_eq!(kpis.avg_score, 0.0);
        assert_eq!(kpis.avg_latency, 0.0);
    }

    #[test]
    fn test_averages() {
        let store = store(json!([
            { "operator": "Airtel", "download_mbps": 10, "upload_mbps": 2, "confidence_score": 0.5, "latency_ms": 40 },
            { "operator": "VI", "download_mbps": 30, "upload_mbps": 4, "confidence_score": 0.7, "latency_ms": 60 }
        ]));
        let kpis = calculate_kpis(&FilteredView::from_records(store.records()), Metric::Download);

        assert_eq!(kpis.avg_download, 20.0);
        assert_eq!(kpis.avg_upload, 3.0);
        assert!((kpis.avg_score - 0.6).abs() < 1e-12);
        assert_eq!(kpis.avg_latency, 50.0);
        assert_eq!(kpis.best_operator, "VI");
    }

    #[test]
    fn test_preferred_operator_within_band_wins_on_score() {
        let store = store(json!([
            { "operator": "Airtel", "confidence_score": 0.80 },
            { "operator": "Jio", "confidence_score": 0.75 }
        ]));
        let view = FilteredView::from_records(store.records());

        assert_eq!(best_operator(&view, Metric::Score).as_deref(), Some("JIO"));
    }

    #[test]
    fn test_preferred_operator_outside_band_on_latency() {
        let store = store(json!([
            { "operator": "Airtel", "latency_ms": 50 },
            { "operator": "Jio", "latency_ms": 70 }
        ]));
        let view = FilteredView::from_records(store.records());

        assert_eq!(best_operator(&view, Metric::Latency).as_deref(), Some("AIRTEL"));
    }

    #[test]
    fn test_preferred_operator_within_band_on_latency() {
        let store = store(json!([
            { "operator": "Airtel", "latency_ms": 50 },
            { "operator": "Jio", "latency_ms": 54 }
        ]));
        let view = FilteredView::from_records(store.records());

        assert_eq!(best_operator(&view, Metric::Latency).as_deref(), Some("JIO"));
    }

    #[test]
    fn test_pune_download_boundary() {
        let store = store(json!([
            { "city": "Pune", "pincode": "411001", "operator": "Jio", "download_mbps": 50 },
            { "city": "Pune", "pincode": "411002", "operator": "Airtel", "download_mbps": 60 },
            { "city": "Mumbai", "pincode": "400001", "operator": "Jio", "download_mbps": 40 }
        ]));
        let mut filters = FilterState::default();
        filters.city = Selection::from("Pune");
        let view = store.apply_filter(&filters);
        assert_eq!(view.len(), 2);

        let kpis = calculate_kpis(&view, Metric::Download);
        assert_eq!(kpis.best_operator, "AIRTEL");
        assert_eq!(kpis.avg_download, 55.0);
    }

    #[test]
    fn test_operator_names_are_case_folded() {
        let store = store(json!([
            { "operator": "airtel", "download_mbps": 10 },
            { "operator": "AIRTEL", "download_mbps": 90 },
            { "operator": "VI", "download_mbps": 45 }
        ]));
        let view = FilteredView::from_records(store.records());

        assert_eq!(best_operator(&view, Metric::Download).as_deref(), Some("AIRTEL"));
    }

    #[test]
    fn test_ties_go_to_first_operator_alphabetically() {
        let store = store(json!([
            { "operator": "VI", "upload_mbps": 5 },
            { "operator": "Airtel", "upload_mbps": 5 }
        ]));
        let view = FilteredView::from_records(store.records());

        assert_eq!(best_operator(&view, Metric::Upload).as_deref(), Some("AIRTEL"));
    }

    #[test]
    fn test_metric_parsing_defaults_to_score() {
        assert_eq!("latency".parse::<Metric>().unwrap(), Metric::Latency);
        assert_eq!("Download".parse::<Metric>().unwrap(), Metric::Download);
        assert_eq!("anything".parse::<Metric>().unwrap(), Metric::Score);
    }
}
