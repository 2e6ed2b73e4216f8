//! The in-memory record store and filtered views over it.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::io::Read;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::fetch::{HttpClient, fetch_bytes};
use crate::filters::{Field, FilterState};
use crate::record::{Record, normalize_pincode};

/// Failure to obtain or parse a dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to fetch dataset: {0}")]
    Fetch(String),
    #[error("dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset is not valid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset must be an array of records, found {0}")]
    NotArray(&'static str),
    #[error("record {index} is not an object")]
    NotObject { index: usize },
}

/// Location of a record, as returned by the pincode and city lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub state: String,
    pub city: String,
    pub area: String,
}

/// Owns the raw dataset. Write-once: a reload replaces it wholesale.
#[derive(Debug, Default, Clone)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Parses a JSON array of flat record objects.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_json_value(&value)
    }

    pub fn from_json_value(value: &Value) -> Result<Self, LoadError> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(_) => return Err(LoadError::NotArray("object")),
            Value::String(_) => return Err(LoadError::NotArray("string")),
            Value::Number(_) => return Err(LoadError::NotArray("number")),
            Value::Bool(_) => return Err(LoadError::NotArray("boolean")),
            Value::Null => return Err(LoadError::NotArray("null")),
        };

        let records = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_object()
                    .map(Record::from_object)
                    .ok_or(LoadError::NotObject { index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(records = records.len(), "Parsed JSON dataset");
        Ok(Self { records })
    }

    /// Parses a CSV dataset with a header row. Cells go through the same
    /// coercion as JSON string values.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();
        let mut records = Vec::new();

        for row in rdr.records() {
            let row = row?;
            let obj: Map<String, Value> = headers
                .iter()
                .zip(row.iter())
                .map(|(k, v)| (k.trim().to_string(), Value::String(v.to_string())))
                .collect();
            records.push(Record::from_object(&obj));
        }

        debug!(records = records.len(), "Parsed CSV dataset");
        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct non-empty values of `field` across the whole dataset.
    pub fn unique_values(&self, field: Field) -> Vec<String> {
        distinct(self.records.iter(), field)
    }

    /// Every record admitted by `filters`. Pure: the same filters always
    /// produce the same view.
    pub fn apply_filter(&self, filters: &FilterState) -> FilteredView<'_> {
        FilteredView {
            records: self.records.iter().filter(|r| admits(filters, r)).collect(),
        }
    }

    pub(crate) fn matching_indices(&self, filters: &FilterState) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| admits(filters, r))
            .map(|(i, _)| i)
            .collect()
    }

    pub(crate) fn view_of(&self, indices: &[usize]) -> FilteredView<'_> {
        FilteredView {
            records: indices.iter().filter_map(|&i| self.records.get(i)).collect(),
        }
    }

    /// Location of the first record carrying `pincode`.
    pub fn location_for_pincode(&self, pincode: &str) -> Option<Location> {
        let wanted = normalize_pincode(pincode);
        self.records
            .iter()
            .find(|r| r.pincode == wanted)
            .map(|r| Location {
                state: r.state.clone(),
                city: r.city.clone(),
                area: r.area.clone(),
            })
    }

    /// State of the first record in `city`.
    pub fn state_for_city(&self, city: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.city == city)
            .map(|r| r.state.as_str())
    }
}

/// A borrowed subset of the store's records, in dataset order.
#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    records: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    pub fn from_records(records: impl IntoIterator<Item = &'a Record>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Text value of `field` on one record, `None` when absent.
pub fn field_value(record: &Record, field: Field) -> Option<String> {
    let value = match field {
        Field::State => record.state.clone(),
        Field::City => record.city.clone(),
        Field::Area => record.area.clone(),
        Field::Pincode => record.pincode.clone(),
        Field::Network => record.network_type.clone(),
        Field::Operator => record.operator.clone(),
        Field::Year => return record.year.map(|y| y.to_string()),
        Field::Hour => return record.hour.map(|h| h.to_string()),
    };
    (!value.is_empty()).then_some(value)
}

/// Sorted distinct values of `field` over `records`.
pub(crate) fn distinct<'a>(records: impl Iterator<Item = &'a Record>, field: Field) -> Vec<String> {
    let set: BTreeSet<String> = records.filter_map(|r| field_value(r, field)).collect();
    let mut values: Vec<String> = set.into_iter().collect();
    if field.is_numeric() {
        values.sort_by(|a, b| numeric_cmp(a, b));
    }
    values
}

fn numeric_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn admits(filters: &FilterState, r: &Record) -> bool {
    if !filters.state.admits(&r.state)
        || !filters.city.admits(&r.city)
        || !filters.area.admits(&r.area)
        || !filters.network.admits(&r.network_type)
        || !filters.operator.admits(&r.operator)
    {
        return false;
    }
    if let Some(pincode) = filters.pincode.value() {
        if normalize_pincode(pincode) != r.pincode {
            return false;
        }
    }
    if !filters.years.is_empty() && !r.year.is_some_and(|y| filters.years.contains(&y)) {
        return false;
    }
    if let Some(month) = r.month {
        if month < filters.month_start {
            return false;
        }
    }
    true
}

/// True for absolute `http://` and `https://` URLs.
fn is_remote(source: &str) -> bool {
    reqwest::Url::parse(source).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Loads a dataset from a local path or an http(s) URL. Sources ending in
/// `.csv` are parsed as CSV, everything else as a JSON array.
#[tracing::instrument(skip(client), fields(source = %source))]
pub async fn fetch_dataset<C: HttpClient>(client: &C, source: &str) -> Result<RecordStore, LoadError> {
    let bytes = if is_remote(source) {
        fetch_bytes(client, source)
            .await
            .map_err(|e| LoadError::Fetch(e.to_string()))?
    } else {
        tokio::fs::read(source).await?
    };

    let is_csv = source
        .split(['?', '#'])
        .next()
        .is_some_and(|path| path.to_ascii_lowercase().ends_with(".csv"));

    let store = if is_csv {
        RecordStore::from_csv_reader(bytes.as_slice())?
    } else {
        RecordStore::from_json_slice(&bytes)?
    };

    info!(records = store.len(), "Dataset loaded");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Selection;
    use serde_json::json;

    fn store() -> RecordStore {
        RecordStore::from_json_value(&json!([
            { "state": "Maharashtra", "city": "Pune", "area": "Shivajinagar", "pincode": 411005, "operator": "Jio", "network_type": "4G", "year": 2023 },
            { "state": "Maharashtra", "city": "Pune", "area": "Kothrud", "pincode": "411038", "operator": "Airtel", "network_type": "5G", "year": 2024 },
            { "state": "Maharashtra", "city": "Mumbai", "area": "Fort", "pincode": 400001, "operator": "Jio", "network_type": "5G", "year": 2024, "month": 3 },
            { "state": "Karnataka", "city": "Bangalore", "area": "Indiranagar", "pincode": 560038, "operator": "VI", "network_type": "4G", "year": 2024 }
        ]))
        .unwrap()
    }

    #[test]
    fn test_load_rejects_non_array() {
        let err = RecordStore::from_json_slice(br#"{"city": "Pune"}"#).unwrap_err();
        assert!(matches!(err, LoadError::NotArray("object")));
    }

    #[test]
    fn test_load_rejects_non_object_items() {
        let err = RecordStore::from_json_slice(br#"[{"city": "Pune"}, 3]"#).unwrap_err();
        assert!(matches!(err, LoadError::NotObject { index: 1 }));
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        assert!(matches!(
            RecordStore::from_json_slice(b"[{").unwrap_err(),
            LoadError::Json(_)
        ));
    }

    #[test]
    fn test_load_from_csv() {
        let csv = "city,pincode,operator,download_mbps,is_peak_hour\nPune,411001,Jio,50.5,peak\nPune,411002,Airtel,,non-peak\n";
        let store = RecordStore::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].download_mbps, 50.5);
        assert!(store.records()[0].is_peak_hour);
        assert_eq!(store.records()[1].download_mbps, 0.0);
    }

    #[test]
    fn test_unique_values_sorted_without_duplicates() {
        let store = store();

        assert_eq!(store.unique_values(Field::City), vec!["Bangalore", "Mumbai", "Pune"]);
        assert_eq!(store.unique_values(Field::Year), vec!["2023", "2024"]);
    }

    #[test]
    fn test_unique_pincodes_sort_numerically() {
        let store = RecordStore::from_json_value(&json!([
            { "pincode": 9000 }, { "pincode": 10000 }, { "pincode": 800 }
        ]))
        .unwrap();

        assert_eq!(store.unique_values(Field::Pincode), vec!["800", "9000", "10000"]);
    }

    #[test]
    fn test_apply_filter_matches_every_set_field() {
        let store = store();
        let mut filters = FilterState::default();
        filters.city = Selection::from("Pune");
        assert_eq!(store.apply_filter(&filters).len(), 2);

        filters.network = Selection::from("5G");
        assert_eq!(store.apply_filter(&filters).len(), 1);
    }

    #[test]
    fn test_apply_filter_normalizes_pincode() {
        let store = store();
        let mut filters = FilterState::default();
        filters.pincode = Selection::from("411005 ");

        let view = store.apply_filter(&filters);
        assert_eq!(view.len(), 1);
        assert_eq!(view.iter().next().unwrap().area, "Shivajinagar");
    }

    #[test]
    fn test_apply_filter_operator_is_case_sensitive() {
        let store = store();
        let mut filters = FilterState::default();
        filters.operator = Selection::from("JIO");
        assert!(store.apply_filter(&filters).is_empty());

        filters.operator = Selection::from("Jio");
        assert_eq!(store.apply_filter(&filters).len(), 2);
    }

    #[test]
    fn test_apply_filter_years_and_month() {
        let store = store();
        let mut filters = FilterState::default();
        filters.years.insert(2024);
        assert_eq!(store.apply_filter(&filters).len(), 3);

        filters.month_start = 4;
        assert_eq!(store.apply_filter(&filters).len(), 2);
    }

    #[test]
    fn test_apply_filter_is_idempotent() {
        let store = store();
        let mut filters = FilterState::default();
        filters.state = Selection::from("Maharashtra");

        let first: Vec<_> = store.apply_filter(&filters).iter().cloned().collect();
        let second: Vec<_> = store.apply_filter(&filters).iter().cloned().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_location_lookups() {
        let store = store();

        let loc = store.location_for_pincode("560038").unwrap();
        assert_eq!(loc.city, "Bangalore");
        assert_eq!(loc.area, "Indiranagar");
        assert!(store.location_for_pincode("999999").is_none());
        assert_eq!(store.state_for_city("Mumbai"), Some("Maharashtra"));
    }

    #[test]
    fn test_remote_sources() {
        assert!(is_remote("https://example.org/data.json"));
        assert!(is_remote("HTTP://example.org/data.csv"));
        assert!(!is_remote("httpdata.json"));
        assert!(!is_remote("http_exports/dataset.json"));
        assert!(!is_remote("/tmp/data.json"));
    }

    #[tokio::test]
    async fn test_fetch_dataset_reads_local_path_starting_with_http() {
        let path = "httpdata_telesignal_test.json";
        std::fs::write(path, r#"[{"city": "Pune"}]"#).unwrap();

        let loaded = fetch_dataset(&crate::fetch::BasicClient::new(), path).await;
        std::fs::remove_file(path).unwrap();

        let store = loaded.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].city, "Pune");
    }

    #[tokio::test]
    async fn test_fetch_dataset_reads_local_csv_with_query() {
        let path = std::env::temp_dir().join("telesignal_test_rows.csv?x=1");
        std::fs::write(&path, "city,pincode,download_mbps\nPune,411001.0,50\nMumbai,400001,40\n").unwrap();

        let source = path.to_string_lossy().into_owned();
        let loaded = fetch_dataset(&crate::fetch::BasicClient::new(), &source).await;
        std::fs::remove_file(&path).unwrap();

        let store = loaded.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].pincode, "411001");
        assert_eq!(store.records()[1].download_mbps, 40.0);
    }

    #[tokio::test]
    async fn test_fetch_dataset_missing_file() {
        let err = fetch_dataset(&crate::fetch::BasicClient::new(), "/nonexistent/telesignal.json")
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
