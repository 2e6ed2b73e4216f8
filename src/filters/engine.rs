//! The cascading filter reducer.
//!
//! Location levels form the hierarchy state → city → area → pincode.
//! Changing a level resets every level below it; choosing a concrete
//! pincode instead fills the levels above it from the dataset. Network and
//! operator are independent axes. After every action, selections that no
//! longer appear among their level's available values fall back to `All`.

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::debug;

use crate::filters::{Field, FilterState, Selection};
use crate::record::normalize_pincode;
use crate::store::{RecordStore, distinct};

/// Fields that hold a single dropdown selection, in the order they are
/// validated and restored.
const SELECTABLE: [Field; 6] = [
    Field::State,
    Field::City,
    Field::Area,
    Field::Pincode,
    Field::Network,
    Field::Operator,
];

/// A change to the filter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
    Set(Field, Selection),
    ToggleYear(i32),
    SetMonthStart(u8),
    Reset,
}

impl FilterAction {
    /// The action for a `field = value` request. A year toggles that year;
    /// hours cannot be selected.
    pub fn select(field: Field, value: &str) -> Result<Self> {
        match field {
            Field::Year => {
                let year = value
                    .trim()
                    .parse::<i32>()
                    .with_context(|| format!("invalid year '{value}'"))?;
                Ok(FilterAction::ToggleYear(year))
            }
            Field::Hour => bail!("hour is not a selectable filter"),
            _ => Ok(FilterAction::Set(field, Selection::from(value))),
        }
    }
}

/// Applies `action` to `state` and returns the next, validated state.
pub fn reduce(store: &RecordStore, state: &FilterState, action: FilterAction) -> FilterState {
    let mut next = state.clone();

    match action {
        FilterAction::Set(field, value) => {
            let value = match (field, value) {
                (Field::Pincode, Selection::Only(p)) => Selection::from(normalize_pincode(&p)),
                (_, value) => value,
            };

            let Some(slot) = next.slot_mut(field) else {
                debug!(%field, "Ignoring selection on a non-selectable field");
                return next;
            };
            *slot = value.clone();

            for &below in field.descendants() {
                if let Some(slot) = next.slot_mut(below) {
                    *slot = Selection::All;
                }
            }

            if field == Field::Pincode {
                if let Some(location) = value.value().and_then(|p| store.location_for_pincode(p)) {
                    next.state = Selection::from(location.state);
                    next.city = Selection::from(location.city);
                    next.area = Selection::from(location.area);
                }
            }
        }
        FilterAction::ToggleYear(year) => {
            if !next.years.remove(&year) {
                next.years.insert(year);
            }
        }
        FilterAction::SetMonthStart(month) => {
            next.month_start = month.clamp(1, 12);
        }
        FilterAction::Reset => {
            next = FilterState::default();
        }
    }

    prune_stale(store, next)
}

/// Candidate values for `field`'s dropdown under the ancestors currently
/// selected in `state`. The wildcard is not included.
pub fn available_values(store: &RecordStore, state: &FilterState, field: Field) -> Vec<String> {
    let ancestors = field.ancestors();
    if ancestors.is_empty() {
        return store.unique_values(field);
    }

    let records = store.records().iter().filter(|r| {
        ancestors.iter().all(|&level| match level {
            Field::State => state.state.admits(&r.state),
            Field::City => state.city.admits(&r.city),
            Field::Area => state.area.admits(&r.area),
            _ => true,
        })
    });
    distinct(records, field)
}

/// Available pincodes whose text contains `term`.
pub fn search_pincodes(store: &RecordStore, state: &FilterState, term: &str) -> Vec<String> {
    let term = term.trim();
    available_values(store, state, Field::Pincode)
        .into_iter()
        .filter(|p| p.contains(term))
        .collect()
}

/// Rebuilds a filter state from a previously persisted JSON object.
///
/// Fields are applied top-down through [`reduce`], so each one is checked
/// against the current dataset; unknown keys are ignored and stale values
/// fall back to `All`.
pub fn restore(store: &RecordStore, saved: &Value) -> FilterState {
    let mut state = FilterState::default();
    let Some(obj) = saved.as_object() else {
        return state;
    };

    for field in SELECTABLE {
        let raw = obj.get(field.name()).or_else(|| match field {
            Field::Network => obj.get("network_type"),
            _ => None,
        });
        let value = match raw {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => continue,
        };
        state = reduce(store, &state, FilterAction::Set(field, Selection::from(value)));
    }

    if let Some(years) = obj.get("years").and_then(Value::as_array) {
        for year in years.iter().filter_map(Value::as_i64) {
            if let Ok(year) = i32::try_from(year) {
                if !state.years.contains(&year) {
                    state = reduce(store, &state, FilterAction::ToggleYear(year));
                }
            }
        }
    }

    if let Some(month) = obj.get("month_start").and_then(Value::as_u64) {
        if (1..=12).contains(&month) {
            state.month_start = month as u8;
        }
    }

    state
}

/// Resets every selection that its level no longer offers, top-down, and
/// drops years absent from the dataset.
fn prune_stale(store: &RecordStore, mut state: FilterState) -> FilterState {
    for field in SELECTABLE {
        let Some(selected) = state.get(field).value().map(str::to_owned) else {
            continue;
        };
        let available = available_values(store, &state, field);
        if !available.iter().any(|v| *v == selected) {
            debug!(%field, value = %selected, "Resetting stale filter selection");
            if let Some(slot) = state.slot_mut(field) {
                *slot = Selection::All;
            }
        }
    }

    if !state.years.is_empty() {
        let known = store.unique_values(Field::Year);
        state.years.retain(|y| known.contains(&y.to_string()));
    }

    state
}
