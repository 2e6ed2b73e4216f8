//! The aggregation engine.
//!
//! Every function here is pure over a [`FilteredView`](crate::store::FilteredView):
//! KPIs with the best-operator ranking, the grouped-average building block,
//! chart breakdowns, and score labels.

pub mod charts;
pub mod grade;
pub mod grouped;
pub mod kpi;
pub mod types;
pub mod utility;

pub use charts::{area_table, chart_set, map_points, operator_performance};
pub use grade::{ScoreLabel, score_label};
pub use grouped::{GroupStat, Grouped, ValueField, grouped_average};
pub use kpi::{Metric, best_operator, calculate_kpis};
pub use types::{AreaRow, ChartData, ChartSet, Dataset, Kpis, MapPoint, OperatorPerformance};
