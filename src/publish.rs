//! Publishes dashboard snapshots to S3.

use anyhow::Result;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::io::Write;
use tracing::info;

use crate::analyzers::{ChartSet, Kpis, Metric, OperatorPerformance};
use crate::dashboard::Dashboard;
use crate::filters::FilterState;

/// Everything the dashboard shows for one filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub metric: Metric,
    pub records: usize,
    pub filters: FilterState,
    pub kpis: Kpis,
    pub charts: ChartSet,
    pub operators: Vec<OperatorPerformance>,
}

impl DashboardSnapshot {
    pub fn capture(dashboard: &Dashboard, metric: Metric, generated_at: DateTime<Utc>) -> Self {
        DashboardSnapshot {
            generated_at,
            metric,
            records: dashboard.view().len(),
            filters: dashboard.filters().clone(),
            kpis: dashboard.kpis(metric),
            charts: dashboard.charts(),
            operators: dashboard.operator_performance(),
        }
    }

    /// Object key under `prefix`, e.g. `snapshots/date=2024-05-01/123000.json.gz`.
    pub fn key(&self, prefix: &str, gzip: bool) -> String {
        let prefix = prefix.trim_matches('/');
        let name = format!(
            "date={}/{}.json{}",
            self.generated_at.format("%Y-%m-%d"),
            self.generated_at.format("%H%M%S"),
            if gzip { ".gz" } else { "" }
        );
        if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        }
    }
}

/// JSON body of `value`, gzip-compressed when asked.
pub fn encode_json(value: &impl Serialize, gzip: bool) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(value)?;
    if !gzip {
        return Ok(body);
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&body)?;
    Ok(encoder.finish()?)
}

/// Serializes a value to JSON and uploads it with `application/json` content
/// type, marking the object `gzip`-encoded when compressed.
#[tracing::instrument(skip(client, value), fields(bucket, key, gzip))]
pub async fn write_json_to_s3(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    value: &impl Serialize,
    gzip: bool,
) -> Result<()> {
    let body = encode_json(value, gzip)?;
    let size = body.len();

    let mut request = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body))
        .content_type("application/json");
    if gzip {
        request = request.content_encoding("gzip");
    }
    request.send().await?;

    info!(bucket, key, size, "Uploaded snapshot");
    Ok(())
}
