//! Measurement records and the coercion rules applied at ingestion.
//!
//! Source rows are loosely typed: any field may be missing, a number may
//! arrive as a string, and `pincode` may be either. Everything is coerced
//! once here so the rest of the crate works with a fixed schema.

use serde::Serialize;
use serde_json::{Map, Value};

/// A single telecom measurement sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub state: String,
    pub city: String,
    pub area: String,
    pub pincode: String,
    pub operator: String,
    pub network_type: String,
    pub hour: Option<u8>,
    pub is_peak_hour: bool,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub latency_ms: f64,
    pub confidence_score: f64,
    pub final_network_score: f64,
    pub signal_score: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub year: Option<i32>,
    pub month: Option<u8>,
}

impl Record {
    /// Builds a record from one JSON object. Never fails: malformed fields
    /// fall back to empty strings, zeros, or `None`.
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        Record {
            state: text(obj.get("state")),
            city: text(obj.get("city")),
            area: text(obj.get("area")),
            pincode: pincode(obj.get("pincode")),
            operator: text(obj.get("operator")),
            network_type: text(obj.get("network_type")),
            hour: number(obj.get("hour"))
                .filter(|h| h.fract() == 0.0 && (0.0..=23.0).contains(h))
                .map(|h| h as u8),
            is_peak_hour: peak(obj.get("is_peak_hour")),
            download_mbps: number(obj.get("download_mbps")).unwrap_or(0.0),
            upload_mbps: number(obj.get("upload_mbps")).unwrap_or(0.0),
            latency_ms: number(obj.get("latency_ms")).unwrap_or(0.0),
            confidence_score: number(obj.get("confidence_score")).unwrap_or(0.0),
            final_network_score: number(obj.get("final_network_score")).unwrap_or(0.0),
            signal_score: number(obj.get("signal_score")).unwrap_or(0.0),
            latitude: number(obj.get("latitude")),
            longitude: number(obj.get("longitude")),
            year: number(obj.get("year"))
                .filter(|y| y.fract() == 0.0 && y.abs() < i32::MAX as f64)
                .map(|y| y as i32),
            month: number(obj.get("month"))
                .filter(|m| m.fract() == 0.0 && (1.0..=12.0).contains(m))
                .map(|m| m as u8),
        }
    }

    /// Canonical operator key used for every per-operator grouping.
    pub fn operator_key(&self) -> String {
        let op = self.operator.trim();
        if op.is_empty() {
            "UNKNOWN".to_string()
        } else {
            op.to_uppercase()
        }
    }

    /// `"Peak"` or `"Non-Peak"`.
    pub fn peak_label(&self) -> &'static str {
        if self.is_peak_hour { "Peak" } else { "Non-Peak" }
    }

    /// Both coordinates, when the record carries them.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// Normalises a pincode given by the caller so it compares equal to the
/// stored form (`411001`, `"411001"` and `" 411001 "` are one pincode).
pub fn normalize_pincode(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 && n >= 0.0 => format!("{}", n as u64),
        _ => trimmed.to_string(),
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn pincode(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => normalize_pincode(s),
        Some(Value::Number(n)) => normalize_pincode(&n.to_string()),
        _ => String::new(),
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn peak(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        Some(Value::String(s)) => {
            let s = s.trim().to_ascii_lowercase();
            s == "peak" || s == "1" || s == "true"
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_object(value.as_object().unwrap())
    }

    #[test]
    fn test_missing_fields_default() {
        let r = record(json!({}));

        assert_eq!(r.city, "");
        assert_eq!(r.pincode, "");
        assert_eq!(r.download_mbps, 0.0);
        assert_eq!(r.hour, None);
        assert_eq!(r.year, None);
        assert!(!r.is_peak_hour);
        assert_eq!(r.coordinates(), None);
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let r = record(json!({
            "download_mbps": " 42.5 ",
            "latency_ms": "abc",
            "hour": "7",
            "year": 2023,
            "latitude": "18.52",
            "longitude": 73.85
        }));

        assert_eq!(r.download_mbps, 42.5);
        assert_eq!(r.latency_ms, 0.0);
        assert_eq!(r.hour, Some(7));
        assert_eq!(r.year, Some(2023));
        assert_eq!(r.coordinates(), Some((18.52, 73.85)));
    }

    #[test]
    fn test_pincode_number_and_string_agree() {
        let a = record(json!({ "pincode": 411001 }));
        let b = record(json!({ "pincode": "411001" }));
        let c = record(json!({ "pincode": 411001.0 }));

        assert_eq!(a.pincode, "411001");
        assert_eq!(a.pincode, b.pincode);
        assert_eq!(a.pincode, c.pincode);
        assert_eq!(normalize_pincode(" 411001 "), "411001");
    }

    #[test]
    fn test_peak_hour_forms() {
        assert!(record(json!({ "is_peak_hour": "peak" })).is_peak_hour);
        assert!(record(json!({ "is_peak_hour": "Peak" })).is_peak_hour);
        assert!(record(json!({ "is_peak_hour": 1 })).is_peak_hour);
        assert!(record(json!({ "is_peak_hour": true })).is_peak_hour);
        assert!(!record(json!({ "is_peak_hour": "non-peak" })).is_peak_hour);
        assert!(!record(json!({ "is_peak_hour": 0 })).is_peak_hour);
    }

    #[test]
    fn test_out_of_range_hour_is_dropped() {
        assert_eq!(record(json!({ "hour": 24 })).hour, None);
        assert_eq!(record(json!({ "hour": -1 })).hour, None);
        assert_eq!(record(json!({ "hour": 23 })).hour, Some(23));
    }

    #[test]
    fn test_operator_key() {
        assert_eq!(record(json!({ "operator": "Jio" })).operator_key(), "JIO");
        assert_eq!(record(json!({})).operator_key(), "UNKNOWN");
    }
}
