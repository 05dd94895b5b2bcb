// 📈 Inventory Tracker - Append-only log of production events
//
// Every observed quantity change becomes one TrackedEvent (resource, signed
// count, date). Rollups (today, week, season, year, any range) are computed
// on demand from the log, so they never drift out of sync with it.

use crate::calendar::{CalendarDate, CalendarError, DateProvider};
use crate::resource::{Quality, Resource, StockEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use tracing::{debug, info};

// ============================================================================
// TRACKED EVENT
// ============================================================================

/// One observed change: `count` units of `resource` gained (positive) or
/// lost (negative) on `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEvent {
    pub resource: Resource,
    pub count: i64,
    pub date: CalendarDate,
}

impl TrackedEvent {
    pub fn new(resource: Resource, count: i64, date: CalendarDate) -> Self {
        TrackedEvent { resource, count, date }
    }
}

// ============================================================================
// PRODUCTION WINDOW
// ============================================================================

/// Named rollup windows built on top of the range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductionWindow {
    Today,
    Yesterday,
    ThisWeek,
    ThisSeason,
    ThisYear,
}

impl ProductionWindow {
    pub const ALL: [ProductionWindow; 5] = [
        ProductionWindow::Today,
        ProductionWindow::Yesterday,
        ProductionWindow::ThisWeek,
        ProductionWindow::ThisSeason,
        ProductionWindow::ThisYear,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ProductionWindow::Today => "Today",
            ProductionWindow::Yesterday => "Yesterday",
            ProductionWindow::ThisWeek => "This week",
            ProductionWindow::ThisSeason => "This season",
            ProductionWindow::ThisYear => "This year",
        }
    }

    /// Inclusive date range covered by this window relative to `today`.
    ///
    /// Seasons are always days 1-28, years always Spring 1 to Winter 28.
    pub fn range(&self, today: CalendarDate) -> Result<(CalendarDate, CalendarDate), CalendarError> {
        Ok(match self {
            ProductionWindow::Today => (today, today),
            ProductionWindow::Yesterday => {
                let yesterday = today.add_days(-1)?;
                (yesterday, yesterday)
            }
            ProductionWindow::ThisWeek => (today.first_weekday(), today.last_weekday()),
            ProductionWindow::ThisSeason => (today.season_start(), today.season_end()),
            ProductionWindow::ThisYear => (today.year_start(), today.year_end()),
        })
    }
}

impl fmt::Display for ProductionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for ProductionWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "today" => Ok(ProductionWindow::Today),
            "yesterday" => Ok(ProductionWindow::Yesterday),
            "week" | "thisweek" => Ok(ProductionWindow::ThisWeek),
            "season" | "thisseason" => Ok(ProductionWindow::ThisSeason),
            "year" | "thisyear" => Ok(ProductionWindow::ThisYear),
            other => Err(format!("unknown window `{}`", other)),
        }
    }
}

// ============================================================================
// INVENTORY TRACKER
// ============================================================================

/// The event log for one local actor.
///
/// `start` is fixed at creation and survives `reset()`.
pub struct InventoryTracker {
    start: CalendarDate,
    events: Vec<TrackedEvent>,
    calendar: Rc<dyn DateProvider>,
}

impl InventoryTracker {
    pub fn new(calendar: Rc<dyn DateProvider>, start: CalendarDate) -> Self {
        InventoryTracker {
            start,
            events: Vec::new(),
            calendar,
        }
    }

    /// Rebuild a tracker from previously persisted events.
    pub fn from_events(
        calendar: Rc<dyn DateProvider>,
        start: CalendarDate,
        events: Vec<TrackedEvent>,
    ) -> Self {
        InventoryTracker {
            start,
            events,
            calendar,
        }
    }

    pub fn start(&self) -> CalendarDate {
        self.start
    }

    pub fn today(&self) -> CalendarDate {
        self.calendar.now()
    }

    pub fn events(&self) -> &[TrackedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Record a change dated today.
    pub fn add(&mut self, resource: Resource, count: i64) {
        let today = self.today();
        self.add_on(resource, count, today);
    }

    /// Record a change on an explicit date. The sign is not validated:
    /// gains and losses are both expected.
    pub fn add_on(&mut self, resource: Resource, count: i64, date: CalendarDate) {
        debug!(
            item = %resource.qualified_id,
            quality = resource.quality.as_str(),
            count,
            %date,
            "tracker.add"
        );
        self.events.push(TrackedEvent::new(resource, count, date));
    }

    /// Net change per resource over `[start, end]`, including entries that
    /// net to zero or below.
    pub fn net_in_range(&self, start: CalendarDate, end: CalendarDate) -> Vec<StockEntry> {
        let mut totals: Vec<StockEntry> = Vec::new();
        // Borrowed (qualified id, quality); same identity as `ResourceKey`
        let mut index: HashMap<(&str, Quality), usize> = HashMap::new();

        for event in self.events.iter().filter(|e| e.date.is_between(&start, &end)) {
            let key = (event.resource.qualified_id.as_str(), event.resource.quality);
            match index.get(&key) {
                Some(&i) => totals[i].count += event.count,
                None => {
                    index.insert(key, totals.len());
                    totals.push(StockEntry::new(event.resource.clone(), event.count));
                }
            }
        }

        totals
    }

    /// Resources net-produced over `[start, end]` (inclusive). Entries whose
    /// net sum is zero or negative are left out.
    pub fn produced_in_range(&self, start: CalendarDate, end: CalendarDate) -> Vec<StockEntry> {
        self.net_in_range(start, end)
            .into_iter()
            .filter(|entry| entry.count > 0)
            .collect()
    }

    pub fn produced_on(&self, date: CalendarDate) -> Vec<StockEntry> {
        self.produced_in_range(date, date)
    }

    pub fn produced_today(&self) -> Vec<StockEntry> {
        self.produced_on(self.today())
    }

    /// Empty on the very first calendar day (there is no yesterday).
    pub fn produced_yesterday(&self) -> Vec<StockEntry> {
        self.produced(ProductionWindow::Yesterday)
    }

    pub fn produced_this_week(&self) -> Vec<StockEntry> {
        self.produced(ProductionWindow::ThisWeek)
    }

    pub fn produced_this_season(&self) -> Vec<StockEntry> {
        self.produced(ProductionWindow::ThisSeason)
    }

    pub fn produced_this_year(&self) -> Vec<StockEntry> {
        self.produced(ProductionWindow::ThisYear)
    }

    /// Rollup for a named window relative to today.
    pub fn produced(&self, window: ProductionWindow) -> Vec<StockEntry> {
        match window.range(self.today()) {
            Ok((start, end)) => self.produced_in_range(start, end),
            Err(err) => {
                debug!(window = window.title(), error = %err, "tracker.window_out_of_calendar");
                Vec::new()
            }
        }
    }

    /// Drop every event. `start` is kept.
    pub fn reset(&mut self) {
        info!(cleared = self.events.len(), start = %self.start, "tracker.reset");
        self.events.clear();
    }
}

impl fmt::Debug for InventoryTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryTracker")
            .field("start", &self.start)
            .field("events", &self.events.len())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{ManualCalendar, Season};
    use crate::resource::ResourceKey;

    fn date(day: u8, season: Season, year: u32) -> CalendarDate {
        CalendarDate::new(day, season, year).unwrap()
    }

    fn parsnip() -> Resource {
        Resource::new("(O)24", "Parsnip")
    }

    fn melon() -> Resource {
        Resource::new("(O)254", "Melon")
    }

    fn tracker_on(today: CalendarDate) -> (Rc<ManualCalendar>, InventoryTracker) {
        let calendar = Rc::new(ManualCalendar::new(today));
        let tracker = InventoryTracker::new(calendar.clone(), CalendarDate::first_day());
        (calendar, tracker)
    }

    fn count_of(entries: &[StockEntry], resource: &Resource) -> Option<i64> {
        entries.iter().find(|e| &e.resource == resource).map(|e| e.count)
    }

    #[test]
    fn test_add_defaults_to_today() {
        let today = date(5, Season::Summer, 1);
        let (_calendar, mut tracker) = tracker_on(today);

        tracker.add(parsnip(), 3);

        assert_eq!(tracker.events()[0].date, today);
        assert_eq!(count_of(&tracker.produced_today(), &parsnip()), Some(3));
    }

    #[test]
    fn test_groups_and_sums_by_resource() {
        let day = date(2, Season::Spring, 1);
        let (_calendar, mut tracker) = tracker_on(day);

        tracker.add_on(parsnip(), 4, day);
        tracker.add_on(melon(), 1, day);
        tracker.add_on(parsnip(), 6, day);

        let produced = tracker.produced_on(day);
        assert_eq!(produced.len(), 2);
        assert_eq!(count_of(&produced, &parsnip()), Some(10));
        assert_eq!(count_of(&produced, &melon()), Some(1));
    }

    #[test]
    fn test_quality_tiers_tracked_separately() {
        let day = date(2, Season::Spring, 1);
        let (_calendar, mut tracker) = tracker_on(day);
        let gold = melon().with_quality(Quality::Gold);

        tracker.add_on(melon(), 2, day);
        tracker.add_on(gold.clone(), 5, day);

        let produced = tracker.produced_on(day);
        assert_eq!(produced.len(), 2);
        assert_eq!(count_of(&produced, &gold), Some(5));
        assert_eq!(count_of(&produced, &melon()), Some(2));
    }

    #[test]
    fn test_grouping_keys_on_id_and_quality_only() {
        let day = date(4, Season::Spring, 1);
        let (_calendar, mut tracker) = tracker_on(day);

        tracker.add_on(parsnip(), 3, day);
        tracker.add_on(Resource::new("(O)24", "Parsnip (renamed)"), 4, day);
        tracker.add_on(parsnip().with_quality(Quality::Silver), 1, day);

        let net = tracker.net_in_range(day, day);
        assert_eq!(net.len(), 2);
        assert_eq!(net[0].name(), "Parsnip");
        assert_eq!(net[0].count, 7);
        assert_eq!(net[1].count, 1);
    }

    #[test]
    fn test_sign_cancellation_excludes_entry() {
        let day = date(1, Season::Spring, 1);
        let (_calendar, mut tracker) = tracker_on(day);

        tracker.add_on(parsnip(), 5, day);
        tracker.add_on(parsnip(), -5, day);
        tracker.add_on(melon(), -2, day);

        assert!(tracker.produced_on(day).is_empty());
        // Unfiltered totals still see them
        assert_eq!(count_of(&tracker.net_in_range(day, day), &parsnip()), Some(0));
        assert_eq!(count_of(&tracker.net_in_range(day, day), &melon()), Some(-2));
    }

    #[test]
    fn test_range_is_inclusive() {
        let (_calendar, mut tracker) = tracker_on(date(10, Season::Spring, 1));

        tracker.add_on(parsnip(), 1, date(3, Season::Spring, 1));
        tracker.add_on(parsnip(), 1, date(7, Season::Spring, 1));
        tracker.add_on(parsnip(), 1, date(8, Season::Spring, 1));

        let produced = tracker.produced_in_range(date(3, Season::Spring, 1), date(7, Season::Spring, 1));
        assert_eq!(count_of(&produced, &parsnip()), Some(2));
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let (_calendar, mut tracker) = tracker_on(date(10, Season::Spring, 1));
        tracker.add_on(melon(), 3, date(9, Season::Spring, 1));
        tracker.add_on(parsnip(), 7, date(2, Season::Spring, 1));
        tracker.add_on(melon(), -1, date(4, Season::Spring, 1));

        let a = date(1, Season::Spring, 1);
        let b = date(28, Season::Spring, 1);
        assert_eq!(tracker.produced_in_range(a, b), tracker.produced_in_range(a, b));
    }

    #[test]
    fn test_range_additivity() {
        let (_calendar, mut tracker) = tracker_on(date(20, Season::Summer, 1));

        // Out of date order on purpose
        tracker.add_on(parsnip(), 4, date(12, Season::Summer, 1));
        tracker.add_on(melon(), 2, date(1, Season::Summer, 1));
        tracker.add_on(parsnip(), -6, date(2, Season::Summer, 1));
        tracker.add_on(melon(), 9, date(28, Season::Spring, 1));
        tracker.add_on(parsnip(), 1, date(12, Season::Summer, 1));

        let a = date(26, Season::Spring, 1);
        let b = date(15, Season::Summer, 1);

        let whole = tracker.net_in_range(a, b);
        let mut summed: HashMap<ResourceKey, i64> = HashMap::new();
        let mut day = a;
        while day <= b {
            for entry in tracker.net_in_range(day, day) {
                *summed.entry(entry.resource.key()).or_default() += entry.count;
            }
            day = day.add_days(1).unwrap();
        }

        assert_eq!(whole.len(), summed.len());
        for entry in whole {
            assert_eq!(summed[&entry.resource.key()], entry.count);
        }
    }

    #[test]
    fn test_yesterday() {
        let (calendar, mut tracker) = tracker_on(date(1, Season::Summer, 1));
        tracker.add(parsnip(), 2);

        calendar.next_day();
        tracker.add(parsnip(), 5);

        assert_eq!(count_of(&tracker.produced_yesterday(), &parsnip()), Some(2));
        assert_eq!(count_of(&tracker.produced_today(), &parsnip()), Some(5));
    }

    #[test]
    fn test_yesterday_on_first_day_is_empty() {
        let (_calendar, mut tracker) = tracker_on(CalendarDate::first_day());
        tracker.add(parsnip(), 2);

        assert!(tracker.produced_yesterday().is_empty());
    }

    #[test]
    fn test_this_week_window() {
        let (_calendar, mut tracker) = tracker_on(date(10, Season::Fall, 1));

        tracker.add_on(melon(), 1, date(7, Season::Fall, 1)); // previous week
        tracker.add_on(melon(), 2, date(8, Season::Fall, 1));
        tracker.add_on(melon(), 3, date(14, Season::Fall, 1));
        tracker.add_on(melon(), 4, date(15, Season::Fall, 1)); // next week

        assert_eq!(count_of(&tracker.produced_this_week(), &melon()), Some(5));
    }

    #[test]
    fn test_this_season_window() {
        let (_calendar, mut tracker) = tracker_on(date(20, Season::Summer, 2));

        tracker.add_on(melon(), 1, date(1, Season::Summer, 2));
        tracker.add_on(melon(), 1, date(28, Season::Summer, 2));
        tracker.add_on(melon(), 10, date(28, Season::Spring, 2));
        tracker.add_on(melon(), 10, date(1, Season::Fall, 2));
        tracker.add_on(melon(), 10, date(5, Season::Summer, 1));

        assert_eq!(count_of(&tracker.produced_this_season(), &melon()), Some(2));
    }

    #[test]
    fn test_this_year_window() {
        let (_calendar, mut tracker) = tracker_on(date(3, Season::Fall, 2));

        tracker.add_on(parsnip(), 1, date(1, Season::Spring, 2));
        tracker.add_on(parsnip(), 1, date(28, Season::Winter, 2));
        tracker.add_on(parsnip(), 10, date(28, Season::Winter, 1));
        tracker.add_on(parsnip(), 10, date(1, Season::Spring, 3));

        assert_eq!(count_of(&tracker.produced_this_year(), &parsnip()), Some(2));
    }

    #[test]
    fn test_reset_clears_history_but_keeps_start() {
        let calendar = Rc::new(ManualCalendar::new(date(9, Season::Spring, 1)));
        let start = date(3, Season::Spring, 1);
        let mut tracker = InventoryTracker::new(calendar, start);
        tracker.add(parsnip(), 8);

        tracker.reset();

        assert!(tracker.is_empty());
        assert_eq!(tracker.start(), start);
        let far_future = date(28, Season::Winter, 99);
        assert!(tracker.produced_in_range(start, far_future).is_empty());
    }

    #[test]
    fn test_empty_log_returns_empty() {
        let (_calendar, tracker) = tracker_on(date(4, Season::Winter, 1));
        for window in ProductionWindow::ALL {
            assert!(tracker.produced(window).is_empty());
        }
    }

    #[test]
    fn test_window_parse() {
        assert_eq!("week".parse::<ProductionWindow>(), Ok(ProductionWindow::ThisWeek));
        assert_eq!("this-season".parse::<ProductionWindow>(), Ok(ProductionWindow::ThisSeason));
        assert!("month".parse::<ProductionWindow>().is_err());
    }
}
