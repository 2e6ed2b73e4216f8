//! Filter state, the cascading reducer, and filter persistence.

pub mod engine;
pub mod persist;
pub mod state;

pub use engine::{FilterAction, available_values, reduce, restore, search_pincodes};
pub use persist::{FilterFile, FilterStore};
pub use state::{ALL, Field, FilterState, Selection};
