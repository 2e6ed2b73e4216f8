//! The dashboard service: one dataset, one filter selection, and the view
//! that selection produces.
//!
//! Callers own a `Dashboard` and pass it where it is needed; there is no
//! global instance.

use anyhow::Result;
use tracing::{debug, info};

use crate::analyzers::{
    AreaRow, ChartSet, Kpis, MapPoint, Metric, OperatorPerformance, area_table, calculate_kpis,
    chart_set, map_points, operator_performance,
};
use crate::filters::{
    Field, FilterAction, FilterState, FilterStore, Selection, available_values, reduce, restore,
    search_pincodes,
};
use crate::location::MatchedLocation;
use crate::store::{FilteredView, RecordStore};

pub struct Dashboard {
    store: RecordStore,
    filters: FilterState,
    view: Vec<usize>,
}

impl Dashboard {
    pub fn new(store: RecordStore) -> Self {
        let filters = FilterState::default();
        let view = store.matching_indices(&filters);
        Self {
            store,
            filters,
            view,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Records admitted by the current filters, in dataset order.
    pub fn view(&self) -> FilteredView<'_> {
        self.store.view_of(&self.view)
    }

    /// Applies a filter action and recomputes the view.
    pub fn dispatch(&mut self, action: FilterAction) -> &FilterState {
        debug!(?action, "Dispatching filter action");
        let next = reduce(&self.store, &self.filters, action);
        self.replace_filters(next);
        &self.filters
    }

    pub fn set_filter(&mut self, field: Field, value: impl Into<Selection>) -> &FilterState {
        self.dispatch(FilterAction::Set(field, value.into()))
    }

    pub fn available_values(&self, field: Field) -> Vec<String> {
        available_values(&self.store, &self.filters, field)
    }

    pub fn search_pincodes(&self, term: &str) -> Vec<String> {
        search_pincodes(&self.store, &self.filters, term)
    }

    pub fn kpis(&self, metric: Metric) -> Kpis {
        calculate_kpis(&self.view(), metric)
    }

    pub fn charts(&self) -> ChartSet {
        chart_set(&self.view())
    }

    pub fn area_table(&self) -> Vec<AreaRow> {
        area_table(&self.view())
    }

    pub fn map_points(&self) -> Vec<MapPoint> {
        map_points(&self.view())
    }

    pub fn operator_performance(&self) -> Vec<OperatorPerformance> {
        operator_performance(&self.store, &self.view())
    }

    /// Replaces the selection with whatever `persisted` holds, validated
    /// against the current dataset. Nothing saved leaves the defaults.
    pub fn restore_from(&mut self, persisted: &dyn FilterStore) -> Result<()> {
        if let Some(saved) = persisted.load()? {
            let next = restore(&self.store, &saved);
            debug!(filters = ?next, "Restored filter state");
            self.replace_filters(next);
        }
        Ok(())
    }

    pub fn save_to(&self, persisted: &dyn FilterStore) -> Result<()> {
        persisted.save(&self.filters)
    }

    /// Narrows the location filters to a resolved location.
    pub fn apply_location(&mut self, location: &MatchedLocation) -> &FilterState {
        for (field, value) in location.selections() {
            let next = reduce(&self.store, &self.filters, FilterAction::Set(field, value));
            self.filters = next;
        }
        info!(
            city = %self.filters.city,
            area = %self.filters.area,
            pincode = %self.filters.pincode,
            "Applied detected location"
        );
        self.view = self.store.matching_indices(&self.filters);
        &self.filters
    }

    fn replace_filters(&mut self, next: FilterState) {
        self.view = self.store.matching_indices(&next);
        self.filters = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinates;
    use crate::location::{Address, Detection};
    use serde_json::{Value, json};
    use std::cell::RefCell;

    fn dashboard() -> Dashboard {
        Dashboard::new(
            RecordStore::from_json_value(&json!([
                { "state": "Maharashtra", "city": "Pune", "area": "Kothrud", "pincode": 411038, "operator": "Jio", "network_type": "5G", "download_mbps": 50 },
                { "state": "Maharashtra", "city": "Pune", "area": "Baner", "pincode": 411045, "operator": "Airtel", "network_type": "4G", "download_mbps": 60 },
                { "state": "Maharashtra", "city": "Mumbai", "area": "Andheri", "pincode": 400053, "operator": "Jio", "network_type": "5G", "download_mbps": 40 },
                { "state": "Karnataka", "city": "Bangalore", "area": "Indiranagar", "pincode": 560038, "operator": "VI", "network_type": "4G", "download_mbps": 30 }
            ]))
            .unwrap(),
        )
    }

    #[derive(Default)]
    struct MemoryStore(RefCell<Option<Value>>);

    impl FilterStore for MemoryStore {
        fn load(&self) -> Result<Option<Value>> {
            Ok(self.0.borrow().clone())
        }

        fn save(&self, state: &FilterState) -> Result<()> {
            *self.0.borrow_mut() = Some(serde_json::to_value(state)?);
            Ok(())
        }
    }

    #[test]
    fn test_new_dashboard_shows_everything() {
        let dashboard = dashboard();
        assert_eq!(dashboard.view().len(), 4);
        assert_eq!(dashboard.filters(), &FilterState::default());
    }

    #[test]
    fn test_set_filter_narrows_view() {
        let mut dashboard = dashboard();
        dashboard.set_filter(Field::City, "Pune");

        assert_eq!(dashboard.view().len(), 2);
        assert_eq!(dashboard.kpis(Metric::Download).avg_download, 55.0);
        assert_eq!(dashboard.available_values(Field::Area), vec!["Baner", "Kothrud"]);
    }

    #[test]
    fn test_reset_restores_full_view() {
        let mut dashboard = dashboard();
        dashboard.set_filter(Field::Operator, "Jio");
        assert_eq!(dashboard.view().len(), 2);

        dashboard.dispatch(FilterAction::Reset);
        assert_eq!(dashboard.view().len(), 4);
    }

    #[test]
    fn test_save_and_restore_round_trip() {
        let persisted = MemoryStore::default();
        let mut first = dashboard();
        first.set_filter(Field::Pincode, "411045");
        first.save_to(&persisted).unwrap();

        let mut second = dashboard();
        second.restore_from(&persisted).unwrap();

        assert_eq!(second.filters(), first.filters());
        assert_eq!(second.filters().area, Selection::from("Baner"));
        assert_eq!(second.view().len(), 1);
    }

    #[test]
    fn test_restore_without_saved_state_keeps_defaults() {
        let mut dashboard = dashboard();
        dashboard.restore_from(&MemoryStore::default()).unwrap();
        assert_eq!(dashboard.filters(), &FilterState::default());
    }

    #[test]
    fn test_apply_location() {
        let mut dashboard = dashboard();
        let location = MatchedLocation {
            state: Selection::from("Maharashtra"),
            city: "Pune".to_string(),
            area: "Kothrud".to_string(),
            pincode: "411038".to_string(),
            detection: Detection {
                coords: Coordinates::new(18.5074, 73.8077),
                address: Address::default(),
            },
        };

        let filters = dashboard.apply_location(&location).clone();

        assert_eq!(filters.state, Selection::from("Maharashtra"));
        assert_eq!(filters.city, Selection::from("Pune"));
        assert_eq!(filters.area, Selection::from("Kothrud"));
        assert_eq!(filters.pincode, Selection::from("411038"));
        assert_eq!(dashboard.view().len(), 1);
    }

    #[test]
    fn test_search_pincodes_respects_city() {
        let mut dashboard = dashboard();
        dashboard.set_filter(Field::City, "Pune");
        assert_eq!(dashboard.search_pincodes("4110"), vec!["411038", "411045"]);
        assert!(dashboard.search_pincodes("560").is_empty());
    }
}
