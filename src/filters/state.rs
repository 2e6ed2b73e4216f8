//! Filter state and its persisted shape.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// The wildcard sentinel shown as the first dropdown choice.
pub const ALL: &str = "All";

static WILDCARD: Selection = Selection::All;

/// A dropdown selection: the wildcard or one exact value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Selection::All => None,
            Selection::Only(v) => Some(v),
        }
    }

    /// `true` for the wildcard, otherwise exact string equality.
    pub fn admits(&self, candidate: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(v) => v == candidate,
        }
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        if value == ALL || value.is_empty() {
            Selection::All
        } else {
            Selection::Only(value)
        }
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Selection::from(value.to_string())
    }
}

impl From<Selection> for String {
    fn from(value: Selection) -> Self {
        match value {
            Selection::All => ALL.to_string(),
            Selection::Only(v) => v,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value().unwrap_or(ALL))
    }
}

/// Dataset fields that can populate a dropdown or a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    State,
    City,
    Area,
    Pincode,
    Network,
    Operator,
    Year,
    Hour,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::State => "state",
            Field::City => "city",
            Field::Area => "area",
            Field::Pincode => "pincode",
            Field::Network => "network",
            Field::Operator => "operator",
            Field::Year => "year",
            Field::Hour => "hour",
        }
    }

    /// Distinct values of numeric fields sort by value, the rest by text.
    pub fn is_numeric(self) -> bool {
        matches!(self, Field::Pincode | Field::Year | Field::Hour)
    }

    /// Location levels above this one.
    pub fn ancestors(self) -> &'static [Field] {
        match self {
            Field::City => &[Field::State],
            Field::Area => &[Field::State, Field::City],
            Field::Pincode => &[Field::State, Field::City, Field::Area],
            _ => &[],
        }
    }

    /// Location levels below this one, reset whenever this one changes.
    pub fn descendants(self) -> &'static [Field] {
        match self {
            Field::State => &[Field::City, Field::Area, Field::Pincode],
            Field::City => &[Field::Area, Field::Pincode],
            Field::Area => &[Field::Pincode],
            _ => &[],
        }
    }
}

impl FromStr for Field {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "state" => Ok(Field::State),
            "city" => Ok(Field::City),
            "area" => Ok(Field::Area),
            "pincode" => Ok(Field::Pincode),
            "network" | "network_type" => Ok(Field::Network),
            "operator" => Ok(Field::Operator),
            "year" => Ok(Field::Year),
            "hour" => Ok(Field::Hour),
            other => Err(anyhow::anyhow!("unknown field '{other}'")),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The active dashboard selection.
///
/// `years` empty means every year. `month_start` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub state: Selection,
    pub city: Selection,
    pub area: Selection,
    pub pincode: Selection,
    pub network: Selection,
    pub operator: Selection,
    pub years: BTreeSet<i32>,
    pub month_start: u8,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            state: Selection::All,
            city: Selection::All,
            area: Selection::All,
            pincode: Selection::All,
            network: Selection::All,
            operator: Selection::All,
            years: BTreeSet::new(),
            month_start: 1,
        }
    }
}

impl FilterState {
    /// Selection held for a filterable field. `Year` and `Hour` are not
    /// single-valued selections and always read as the wildcard.
    pub fn get(&self, field: Field) -> &Selection {
        match field {
            Field::State => &self.state,
            Field::City => &self.city,
            Field::Area => &self.area,
            Field::Pincode => &self.pincode,
            Field::Network => &self.network,
            Field::Operator => &self.operator,
            Field::Year | Field::Hour => &WILDCARD,
        }
    }

    /// Mutable slot for a single-valued field, `None` for `Year`/`Hour`.
    pub fn slot_mut(&mut self, field: Field) -> Option<&mut Selection> {
        match field {
            Field::State => Some(&mut self.state),
            Field::City => Some(&mut self.city),
            Field::Area => Some(&mut self.area),
            Field::Pincode => Some(&mut self.pincode),
            Field::Network => Some(&mut self.network),
            Field::Operator => Some(&mut self.operator),
            Field::Year | Field::Hour => None,
        }
    }
}
