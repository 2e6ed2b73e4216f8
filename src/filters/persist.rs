use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::filters::FilterState;

/// Key-value persistence for the last filter selection.
///
/// `load` hands back the raw saved object so the caller can validate it
/// against the current dataset before applying it.
pub trait FilterStore {
    fn load(&self) -> Result<Option<Value>>;
    fn save(&self, state: &FilterState) -> Result<()>;
}

/// Stores the filter selection as one flat JSON object on disk:
/// ```json
/// {
///   "state": "Maharashtra",
///   "city": "Pune",
///   "area": "All",
///   "pincode": "All",
///   "network": "5G",
///   "operator": "All",
///   "years": [2024],
///   "month_start": 1
/// }
/// ```
pub struct FilterFile {
    path: PathBuf,
}

impl FilterFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FilterStore for FilterFile {
    /// Returns `None` when nothing has been saved yet. A file that is not
    /// valid JSON is treated the same way.
    fn load(&self) -> Result<Option<Value>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Ignoring unreadable filter state");
                Ok(None)
            }
        }
    }

    fn save(&self, state: &FilterState) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let body = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Selection;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let file = FilterFile::new(temp_path("telesignal_test_missing_filters.json"));
        let _ = fs::remove_file(file.path());

        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let file = FilterFile::new(temp_path("telesignal_test_saved_filters.json"));
        let mut state = FilterState::default();
        state.city = Selection::from("Pune");

        file.save(&state).unwrap();
        let saved = file.load().unwrap().unwrap();

        assert_eq!(saved["city"], "Pune");
        assert_eq!(saved["area"], "All");

        fs::remove_file(file.path()).unwrap();
    }

    #[test]
    fn test_corrupt_file_is_none() {
        let file = FilterFile::new(temp_path("telesignal_test_corrupt_filters.json"));
        fs::write(file.path(), "{not json").unwrap();

        assert!(file.load().unwrap().is_none());

        fs::remove_file(file.path()).unwrap();
    }
}
