//! In-memory marker state with date-window filtering.

use chrono::NaiveDateTime;
use civic_portal_calendar::{DateRange, DateRangeMode, next_period, previous_period};
use civic_portal_geo_models::{CrimeReport, Marker};

/// Holds every loaded marker plus the date-filtered visible subset.
///
/// `visible` is always re-derived from `all` after any filter-affecting
/// mutation (load, save, delete, date navigation) — it is a projection,
/// never independently mutated. Each re-derivation bumps a generation
/// counter; the overlay layer rebuilds from scratch whenever it observes
/// a new generation.
pub struct MarkerStore {
    all: Vec<Marker>,
    visible: Vec<Marker>,
    anchor: NaiveDateTime,
    mode: DateRangeMode,
    range: DateRange,
    generation: u64,
}

impl MarkerStore {
    /// Creates an empty store filtered to the window around `anchor`.
    #[must_use]
    pub fn new(anchor: NaiveDateTime, mode: DateRangeMode) -> Self {
        Self {
            all: Vec::new(),
            visible: Vec::new(),
            anchor,
            mode,
            range: DateRange::compute(anchor, mode),
            generation: 0,
        }
    }

    /// The date-filtered visible markers.
    #[must_use]
    pub fn visible(&self) -> &[Marker] {
        &self.visible
    }

    /// Every loaded marker, including ones outside the current window.
    #[must_use]
    pub fn all(&self) -> &[Marker] {
        &self.all
    }

    /// The current window.
    #[must_use]
    pub const fn range(&self) -> DateRange {
        self.range
    }

    /// The current window mode.
    #[must_use]
    pub const fn mode(&self) -> DateRangeMode {
        self.mode
    }

    /// The current anchor date.
    #[must_use]
    pub const fn anchor(&self) -> NaiveDateTime {
        self.anchor
    }

    /// Bumped every time the visible set is re-derived.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Appends loaded markers and crime reports (projected onto markers),
    /// then re-derives the visible set.
    pub fn load(&mut self, markers: Vec<Marker>, reports: &[CrimeReport]) {
        self.all.extend(markers);
        self.all.extend(reports.iter().map(CrimeReport::to_marker));
        self.refilter();
    }

    /// Optimistically inserts a locally created marker and returns its
    /// index in the full list, for a later [`Self::backfill_id`].
    pub fn insert(&mut self, marker: Marker) -> usize {
        let index = self.all.len();
        self.all.push(marker);
        self.refilter();
        index
    }

    /// Writes the store-assigned id onto a marker inserted earlier.
    ///
    /// Mirrored into the visible list if the marker is currently shown.
    pub fn backfill_id(&mut self, index: usize, id: &str) {
        let Some(marker) = self.all.get_mut(index) else {
            log::warn!("id backfill for unknown marker index {index}");
            return;
        };
        marker.id = Some(id.to_string());
        let marker = marker.clone();

        if let Some(shown) = self.visible.iter_mut().find(|m| {
            m.id.is_none()
                && m.position == marker.position
                && m.title == marker.title
                && m.created_at == marker.created_at
        }) {
            shown.id = Some(id.to_string());
        }
    }

    /// Replaces a persisted marker's content in both lists.
    ///
    /// Returns `false` when the id is unknown.
    pub fn replace(&mut self, id: &str, marker: Marker) -> bool {
        let Some(existing) = self
            .all
            .iter_mut()
            .find(|m| m.id.as_deref() == Some(id))
        else {
            return false;
        };
        *existing = marker;
        self.refilter();
        true
    }

    /// Removes a marker from both lists. Returns whether anything was
    /// removed; a later refilter cannot resurrect a deleted marker.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.all.len();
        self.all.retain(|m| m.id.as_deref() != Some(id));
        let removed = self.all.len() != before;
        if removed {
            self.refilter();
        }
        removed
    }

    /// Switches the window mode and re-derives the visible set.
    pub fn set_mode(&mut self, mode: DateRangeMode) {
        self.mode = mode;
        self.recompute();
    }

    /// Moves the anchor to a specific date.
    pub fn set_anchor(&mut self, anchor: NaiveDateTime) {
        self.anchor = anchor;
        self.recompute();
    }

    /// Advances the window by one period.
    pub fn go_next(&mut self) {
        self.anchor = next_period(self.anchor, self.mode);
        self.recompute();
    }

    /// Retreats the window by one period.
    pub fn go_previous(&mut self) {
        self.anchor = previous_period(self.anchor, self.mode);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.range = DateRange::compute(self.anchor, self.mode);
        self.refilter();
    }

    fn refilter(&mut self) {
        let range = self.range;
        self.visible = self
            .all
            .iter()
            .filter(|m| range.includes(m.created_at))
            .cloned()
            .collect();
        self.generation += 1;
        log::debug!(
            "visible markers: {} of {} in range",
            self.visible.len(),
            self.all.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use civic_portal_geo_models::{LatLng, PENDING_INVESTIGATION, Reporter};

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn marker(id: Option<&str>, title: &str, created: Option<NaiveDateTime>) -> Marker {
        Marker {
            id: id.map(str::to_string),
            title: title.to_string(),
            category: "tourism".to_string(),
            position: LatLng::new(11.5564, 104.9282),
            image_url: None,
            created_at: created,
        }
    }

    fn store_for_june_15_week() -> MarkerStore {
        MarkerStore::new(at(15, 12), DateRangeMode::Week)
    }

    #[test]
    fn load_projects_crime_reports_and_filters() {
        let mut store = store_for_june_15_week();
        let report = CrimeReport {
            id: Some("c1".to_string()),
            title: "Robbery".to_string(),
            description: String::new(),
            crime_type: "Robbery".to_string(),
            timestamp: at(16, 10).and_utc().timestamp_millis(),
            location: LatLng::new(11.55, 104.93),
            address: String::new(),
            reported_by: Reporter::anonymous(),
            status: PENDING_INVESTIGATION.to_string(),
            attachments: Vec::new(),
        };

        store.load(
            vec![
                marker(Some("m1"), "in range", Some(at(16, 9))),
                marker(Some("m2"), "out of range", Some(at(25, 9))),
                marker(Some("m3"), "undated legacy", None),
            ],
            std::slice::from_ref(&report),
        );

        let titles: Vec<&str> = store.visible().iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["in range", "undated legacy", "Robbery"]);
        assert_eq!(store.all().len(), 4);
        assert_eq!(store.visible()[2].category, "crime");
    }

    #[test]
    fn visible_is_subset_in_original_order() {
        let mut store = store_for_june_15_week();
        store.load(
            vec![
                marker(Some("a"), "one", Some(at(15, 1))),
                marker(Some("b"), "two", Some(at(1, 1))),
                marker(Some("c"), "three", Some(at(17, 1))),
            ],
            &[],
        );
        let ids: Vec<&str> = store
            .visible()
            .iter()
            .filter_map(|m| m.id.as_deref())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn insert_then_backfill_updates_both_lists() {
        let mut store = store_for_june_15_week();
        let index = store.insert(marker(None, "fresh", Some(at(15, 8))));

        assert!(store.visible()[0].id.is_none());
        store.backfill_id(index, "assigned");
        assert_eq!(store.all()[index].id.as_deref(), Some("assigned"));
        assert_eq!(store.visible()[0].id.as_deref(), Some("assigned"));
    }

    #[test]
    fn delete_removes_from_both_lists_and_stays_gone() {
        let mut store = store_for_june_15_week();
        store.load(
            vec![
                marker(Some("keep"), "keep", Some(at(16, 9))),
                marker(Some("drop"), "drop", Some(at(16, 10))),
            ],
            &[],
        );

        assert!(store.delete("drop"));
        assert_eq!(store.all().len(), 1);
        assert_eq!(store.visible().len(), 1);

        // A subsequent refilter does not resurrect it.
        store.set_mode(DateRangeMode::Month);
        assert!(store.visible().iter().all(|m| m.id.as_deref() != Some("drop")));
        assert!(!store.delete("drop"));
    }

    #[test]
    fn date_navigation_refilters() {
        let mut store = store_for_june_15_week();
        store.load(
            vec![
                marker(Some("wk1"), "this week", Some(at(16, 9))),
                marker(Some("wk2"), "next week", Some(at(23, 9))),
            ],
            &[],
        );
        assert_eq!(store.visible().len(), 1);

        store.go_next();
        let ids: Vec<&str> = store
            .visible()
            .iter()
            .filter_map(|m| m.id.as_deref())
            .collect();
        assert_eq!(ids, vec!["wk2"]);

        store.go_previous();
        let ids: Vec<&str> = store
            .visible()
            .iter()
            .filter_map(|m| m.id.as_deref())
            .collect();
        assert_eq!(ids, vec!["wk1"]);
    }

    #[test]
    fn every_visible_change_bumps_the_generation() {
        let mut store = store_for_june_15_week();
        let g0 = store.generation();

        store.load(vec![marker(Some("a"), "a", None)], &[]);
        let g1 = store.generation();
        assert!(g1 > g0);

        store.set_mode(DateRangeMode::Today);
        assert!(store.generation() > g1);
    }
}
