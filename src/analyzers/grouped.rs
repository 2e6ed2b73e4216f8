//! The grouped-average building block behind every breakdown.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::analyzers::utility::Accumulator;
use crate::filters::Field;
use crate::record::Record;
use crate::store::{FilteredView, field_value};

/// A numeric record field that can be summed per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueField {
    Download,
    Upload,
    Latency,
    Confidence,
    FinalScore,
    Signal,
    /// Contributes 1 per record, so the sum is a record count.
    Count,
}

impl ValueField {
    pub fn of(self, record: &Record) -> f64 {
        match self {
            ValueField::Download => record.download_mbps,
            ValueField::Upload => record.upload_mbps,
            ValueField::Latency => record.latency_ms,
            ValueField::Confidence => record.confidence_score,
            ValueField::FinalScore => record.final_network_score,
            ValueField::Signal => record.signal_score,
            ValueField::Count => 1.0,
        }
    }
}

/// Per-group sums and counts keyed by `K`, iterated in key order.
#[derive(Debug, Clone)]
pub struct Grouped<K> {
    groups: BTreeMap<K, Accumulator>,
}

impl<K: Ord> Default for Grouped<K> {
    fn default() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }
}

impl<K: Ord> Grouped<K> {
    /// Groups `records` by `key`, skipping records for which it returns
    /// `None`, and accumulates `value` per group.
    pub fn build<'a, I, KF, VF>(records: I, key: KF, value: VF) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
        KF: Fn(&Record) -> Option<K>,
        VF: Fn(&Record) -> f64,
    {
        let mut groups: BTreeMap<K, Accumulator> = BTreeMap::new();
        for record in records {
            if let Some(k) = key(record) {
                groups.entry(k).or_default().push(value(record));
            }
        }
        Self { groups }
    }

    pub fn get(&self, key: &K) -> Option<&Accumulator> {
        self.groups.get(key)
    }

    /// Mean for `key`, `None` when the group is absent.
    pub fn mean(&self, key: &K) -> Option<f64> {
        self.groups.get(key).and_then(Accumulator::mean_opt)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Accumulator)> {
        self.groups.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.groups.keys()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// One row of a generic grouped-average result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStat {
    pub key: Vec<String>,
    pub sum: f64,
    pub count: usize,
    pub mean: f64,
}

impl Grouped<Vec<String>> {
    pub fn stats(&self) -> Vec<GroupStat> {
        self.iter()
            .map(|(key, acc)| GroupStat {
                key: key.clone(),
                sum: acc.sum,
                count: acc.count,
                mean: acc.mean(),
            })
            .collect()
    }
}

/// Group key text for `field`. Operators use their canonical upper-case
/// form; other fields are `None` when the record lacks them.
pub fn group_key(record: &Record, field: Field) -> Option<String> {
    match field {
        Field::Operator => Some(record.operator_key()),
        _ => field_value(record, field),
    }
}

/// Partitions `view` by `group_fields` and accumulates `value` per group.
pub fn grouped_average(view: &FilteredView<'_>, group_fields: &[Field], value: ValueField) -> Grouped<Vec<String>> {
    Grouped::build(
        view.iter(),
        |r| group_fields.iter().map(|&f| group_key(r, f)).collect::<Option<Vec<_>>>(),
        |r| value.of(r),
    )
}
