//! Filter state and the filter pipeline.
//!
//! The pipeline runs category → date window → distance → stable sort by date.
//! It is a pure function of its inputs: the same collection and state always
//! produce the same ordered output.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

use crate::event::{Category, EventRecord};
use crate::geo::{Coordinates, DistanceMetric, Haversine};

/// Days ahead covered by the per-day counts in [`FilterStats`].
pub const STATS_HORIZON_DAYS: i64 = 30;

/// A named calendar range relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    Today,
    Weekend,
    Week,
    Month,
}

impl DateWindow {
    /// Inclusive `[from, to]` bounds for this window.
    pub fn bounds(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            DateWindow::Today => (today, today),
            DateWindow::Weekend => {
                let saturday = match today.weekday() {
                    Weekday::Sun => today - Days::new(1),
                    day => today + Days::new(u64::from(5 - day.num_days_from_monday())),
                };
                (saturday, saturday + Days::new(1))
            }
            DateWindow::Week => (today, today + Days::new(7)),
            DateWindow::Month => {
                let end = today
                    .checked_add_months(Months::new(1))
                    .unwrap_or(NaiveDate::MAX);
                (today, end)
            }
        }
    }

    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        let (from, to) = self.bounds(today);
        from <= date && date <= to
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DateWindow::Today => "today",
            DateWindow::Weekend => "weekend",
            DateWindow::Week => "week",
            DateWindow::Month => "month",
        };
        f.write_str(name)
    }
}

impl FromStr for DateWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "today" => Ok(DateWindow::Today),
            "weekend" => Ok(DateWindow::Weekend),
            "week" => Ok(DateWindow::Week),
            "month" => Ok(DateWindow::Month),
            other => Err(format!(
                "Unknown date window '{}'. Expected today, weekend, week or month",
                other
            )),
        }
    }
}

/// Current filter criteria. Changed only through the setters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    category: Option<Category>,
    date_window: Option<DateWindow>,
    radius_km: Option<f64>,
    user_position: Option<Coordinates>,
}

impl FilterState {
    pub fn new() -> Self {
        FilterState::default()
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn date_window(&self) -> Option<DateWindow> {
        self.date_window
    }

    pub fn radius_km(&self) -> Option<f64> {
        self.radius_km
    }

    pub fn user_position(&self) -> Option<Coordinates> {
        self.user_position
    }

    pub fn set_category(&mut self, category: Option<Category>) {
        self.category = category;
    }

    pub fn set_date_window(&mut self, window: Option<DateWindow>) {
        self.date_window = window;
    }

    /// A zero, negative or non-finite radius means "no distance filter".
    pub fn set_radius_km(&mut self, radius_km: Option<f64>) {
        self.radius_km = radius_km.filter(|r| r.is_finite() && *r > 0.0);
    }

    pub fn set_user_position(&mut self, position: Option<Coordinates>) {
        self.user_position = position;
    }

    /// Reset every criterion; the user position is kept.
    pub fn clear(&mut self) {
        *self = FilterState {
            user_position: self.user_position,
            ..FilterState::default()
        };
    }

    /// Radius and position, when both are present.
    fn distance_criterion(&self) -> Option<(f64, Coordinates)> {
        self.radius_km.zip(self.user_position)
    }

    pub fn has_active_filters(&self) -> bool {
        self.category.is_some() || self.date_window.is_some() || self.distance_criterion().is_some()
    }

    /// Distance from the user to an event, when both positions are known.
    pub fn distance_to(&self, event: &EventRecord) -> Option<f64> {
        let from = self.user_position?;
        let to = event.coordinates?;
        Some(Haversine.distance_km(from, to))
    }
}

/// Run the pipeline over `events` and return a new, date-ordered vec.
pub fn apply<D: DistanceMetric>(
    events: &[EventRecord],
    state: &FilterState,
    today: NaiveDate,
    metric: &D,
) -> Vec<EventRecord> {
    let mut filtered: Vec<EventRecord> = events
        .iter()
        .filter(|e| state.category.is_none_or(|c| e.category == c))
        .filter(|e| state.date_window.is_none_or(|w| w.contains(e.date, today)))
        .filter(|e| match state.distance_criterion() {
            None => true,
            Some((radius, origin)) => e
                .coordinates
                .is_some_and(|c| metric.distance_km(origin, c) <= radius),
        })
        .cloned()
        .collect();

    // sort_by_key is stable: same-day events keep their sheet order
    filtered.sort_by_key(|e| e.date);
    filtered
}

/// Summary counts for a filtered result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterStats {
    pub total: usize,
    pub filtered: usize,
    pub by_category: BTreeMap<Category, usize>,
    /// Keyed by days from today (0 = today), up to [`STATS_HORIZON_DAYS`].
    pub by_day_offset: BTreeMap<i64, usize>,
}

impl FilterStats {
    pub fn compute(total: &[EventRecord], filtered: &[EventRecord], today: NaiveDate) -> Self {
        let mut stats = FilterStats {
            total: total.len(),
            filtered: filtered.len(),
            ..FilterStats::default()
        };

        for event in filtered {
            *stats.by_category.entry(event.category).or_default() += 1;

            let offset = (event.date - today).num_days();
            if (0..=STATS_HORIZON_DAYS).contains(&offset) {
                *stats.by_day_offset.entry(offset).or_default() += 1;
            }
        }

        stats
    }
}

/// Label for a day offset: "today", "tomorrow", "N days".
pub fn day_offset_label(offset: i64) -> String {
    match offset {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        n => format!("{} days", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2025-06-02 is a Monday
    fn monday() -> NaiveDate {
        date(2025, 6, 2)
    }

    fn event(id: &str, date: NaiveDate) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            title: format!("Event {}", id),
            category: Category::Other,
            date,
            time: None,
            location: "Somewhere".to_string(),
            coordinates: None,
            description: None,
            price: None,
            contact: None,
            creator: "someone@example.com".to_string(),
            created_at: None,
        }
    }

    fn at(mut e: EventRecord, lat: f64, lng: f64) -> EventRecord {
        e.coordinates = Coordinates::new(lat, lng);
        e
    }

    fn with_category(mut e: EventRecord, category: Category) -> EventRecord {
        e.category = category;
        e
    }

    fn ids(events: &[EventRecord]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn empty_state_only_sorts() {
        let today = monday();
        let events = vec![
            event("c", today + Days::new(5)),
            event("a", today),
            event("b", today + Days::new(2)),
        ];

        let result = apply(&events, &FilterState::new(), today, &Haversine);
        assert_eq!(ids(&result), ["a", "b", "c"]);
        // input untouched
        assert_eq!(ids(&events), ["c", "a", "b"]);
    }

    #[test]
    fn week_window_on_a_monday() {
        let today = monday();
        let events = vec![
            event("plus40", today + Days::new(40)),
            event("plus3", today + Days::new(3)),
            event("plus10", today + Days::new(10)),
            event("today", today),
        ];
        let mut state = FilterState::new();
        state.set_date_window(Some(DateWindow::Week));

        let result = apply(&events, &state, today, &Haversine);
        assert_eq!(ids(&result), ["today", "plus3"]);
    }

    #[test]
    fn week_window_is_inclusive_of_day_seven() {
        let today = monday();
        assert!(DateWindow::Week.contains(today + Days::new(7), today));
        assert!(!DateWindow::Week.contains(today + Days::new(8), today));
    }

    #[test]
    fn today_window() {
        let today = monday();
        assert!(DateWindow::Today.contains(today, today));
        assert!(!DateWindow::Today.contains(today + Days::new(1), today));
    }

    #[test]
    fn weekend_from_weekdays_and_weekends() {
        // Monday → the coming Saturday/Sunday
        assert_eq!(
            DateWindow::Weekend.bounds(monday()),
            (date(2025, 6, 7), date(2025, 6, 8))
        );
        // Friday
        assert_eq!(
            DateWindow::Weekend.bounds(date(2025, 6, 6)),
            (date(2025, 6, 7), date(2025, 6, 8))
        );
        // Saturday and Sunday keep the current weekend
        assert_eq!(
            DateWindow::Weekend.bounds(date(2025, 6, 7)),
            (date(2025, 6, 7), date(2025, 6, 8))
        );
        assert_eq!(
            DateWindow::Weekend.bounds(date(2025, 6, 8)),
            (date(2025, 6, 7), date(2025, 6, 8))
        );
    }

    // Jan 31 + 1 month ends on Feb 28, it does not roll over into March
    #[test]
    fn month_window_clamps_to_month_end() {
        assert_eq!(
            DateWindow::Month.bounds(date(2025, 1, 31)),
            (date(2025, 1, 31), date(2025, 2, 28))
        );
        assert!(!DateWindow::Month.contains(date(2025, 3, 1), date(2025, 1, 31)));
        assert_eq!(
            DateWindow::Month.bounds(date(2024, 1, 31)),
            (date(2024, 1, 31), date(2024, 2, 29))
        );
        assert_eq!(
            DateWindow::Month.bounds(monday()),
            (monday(), date(2025, 7, 2))
        );
    }

    #[test]
    fn category_filter() {
        let today = monday();
        let events = vec![
            with_category(event("a", today), Category::Sport),
            with_category(event("b", today), Category::Concerto),
            with_category(event("c", today), Category::Sport),
        ];
        let mut state = FilterState::new();
        state.set_category(Some(Category::Sport));

        assert_eq!(ids(&apply(&events, &state, today, &Haversine)), ["a", "c"]);
    }

    #[test]
    fn distance_filter_by_radius() {
        let today = monday();
        let user = Coordinates::new(45.0, 9.0).unwrap();
        // ~10 km north
        let events = vec![at(event("north", today), 45.0 + 10.0 / 111.195, 9.0)];

        let mut state = FilterState::new();
        state.set_user_position(Some(user));

        state.set_radius_km(Some(5.0));
        assert!(apply(&events, &state, today, &Haversine).is_empty());

        state.set_radius_km(Some(15.0));
        assert_eq!(ids(&apply(&events, &state, today, &Haversine)), ["north"]);
    }

    #[test]
    fn distance_filter_excludes_events_without_coordinates() {
        let today = monday();
        let events = vec![event("nowhere", today), at(event("here", today), 45.0, 9.0)];
        let mut state = FilterState::new();
        state.set_user_position(Coordinates::new(45.0, 9.0));
        state.set_radius_km(Some(1.0));

        assert_eq!(ids(&apply(&events, &state, today, &Haversine)), ["here"]);
    }

    #[test]
    fn radius_without_position_is_a_no_op() {
        let today = monday();
        let events = vec![event("nowhere", today)];
        let mut state = FilterState::new();
        state.set_radius_km(Some(1.0));

        assert_eq!(apply(&events, &state, today, &Haversine).len(), 1);
        assert!(!state.has_active_filters());
    }

    #[test]
    fn same_day_events_keep_input_order() {
        let today = monday();
        let tomorrow = today + Days::new(1);
        let events = vec![
            event("x", tomorrow),
            event("y", today),
            event("z", tomorrow),
            event("w", today),
        ];

        let result = apply(&events, &FilterState::new(), today, &Haversine);
        assert_eq!(ids(&result), ["y", "w", "x", "z"]);
    }

    #[test]
    fn applying_twice_is_identical() {
        let today = monday();
        let events: Vec<_> = (0..20)
            .map(|i| {
                let e = event(&format!("e{}", i), today + Days::new((i * 7 % 11) as u64));
                at(e, 45.0 + i as f64 * 0.01, 9.0)
            })
            .collect();
        let mut state = FilterState::new();
        state.set_date_window(Some(DateWindow::Week));
        state.set_user_position(Coordinates::new(45.0, 9.0));
        state.set_radius_km(Some(15.0));

        let first = apply(&events, &state, today, &Haversine);
        let second = apply(&events, &state, today, &Haversine);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn clear_keeps_user_position() {
        let position = Coordinates::new(45.0, 9.0);
        let mut state = FilterState::new();
        state.set_category(Some(Category::Bambini));
        state.set_date_window(Some(DateWindow::Today));
        state.set_radius_km(Some(10.0));
        state.set_user_position(position);
        assert!(state.has_active_filters());

        state.clear();

        assert_eq!(state.user_position(), position);
        assert_eq!(state.category(), None);
        assert_eq!(state.radius_km(), None);
        assert!(!state.has_active_filters());
    }

    #[test]
    fn non_positive_radius_is_ignored() {
        let mut state = FilterState::new();
        state.set_radius_km(Some(0.0));
        assert_eq!(state.radius_km(), None);
        state.set_radius_km(Some(f64::NAN));
        assert_eq!(state.radius_km(), None);
    }

    #[test]
    fn parse_date_window() {
        assert_eq!("Weekend".parse::<DateWindow>(), Ok(DateWindow::Weekend));
        assert!("fortnight".parse::<DateWindow>().is_err());
    }

    #[test]
    fn stats_count_categories_and_days() {
        let today = monday();
        let all = vec![
            with_category(event("a", today), Category::Sport),
            with_category(event("b", today + Days::new(1)), Category::Sport),
            with_category(event("c", today + Days::new(45)), Category::Cultura),
        ];

        let stats = FilterStats::compute(&all, &all[..2], today);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.filtered, 2);
        assert_eq!(stats.by_category.get(&Category::Sport), Some(&2));
        assert_eq!(stats.by_category.get(&Category::Cultura), None);
        assert_eq!(stats.by_day_offset.get(&0), Some(&1));
        assert_eq!(day_offset_label(1), "tomorrow");
        assert_eq!(day_offset_label(12), "12 days");
    }
}
