// ↕️ Sort Orders - Fixed rotation applied with the sort key
//
// None → Name (asc) → Name (desc) → Count (asc) → Count (desc) → None ...

use crate::resource::StockEntry;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    None,
    AscendingByName,
    DescendingByName,
    AscendingByCount,
    DescendingByCount,
}

impl SortOrder {
    /// Rotation order used by [`SortCycle`].
    pub const ROTATION: [SortOrder; 5] = [
        SortOrder::None,
        SortOrder::AscendingByName,
        SortOrder::DescendingByName,
        SortOrder::AscendingByCount,
        SortOrder::DescendingByCount,
    ];

    /// Label shown to the player
    pub fn description(&self) -> &'static str {
        match self {
            SortOrder::None => "None",
            SortOrder::AscendingByName => "Name (asc)",
            SortOrder::DescendingByName => "Name (desc)",
            SortOrder::AscendingByCount => "Count (asc)",
            SortOrder::DescendingByCount => "Count (desc)",
        }
    }

    /// Sort `entries` in place. Name orders compare display names
    /// ordinally; `None` leaves the slice untouched. Sorting is stable.
    pub fn apply(&self, entries: &mut [StockEntry]) {
        match self {
            SortOrder::None => {}
            SortOrder::AscendingByName => entries.sort_by(|a, b| a.name().cmp(b.name())),
            SortOrder::DescendingByName => entries.sort_by(|a, b| b.name().cmp(a.name())),
            SortOrder::AscendingByCount => entries.sort_by_key(|e| e.count),
            SortOrder::DescendingByCount => entries.sort_by(|a, b| b.count.cmp(&a.count)),
        }
    }

    /// Sorted copy of `entries`.
    pub fn sorted(&self, entries: &[StockEntry]) -> Vec<StockEntry> {
        let mut sorted = entries.to_vec();
        self.apply(&mut sorted);
        sorted
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Queue of sort orders. Each `advance` hands out the head and moves it to
/// the tail, so the rotation has period 5.
#[derive(Debug, Clone)]
pub struct SortCycle {
    queue: VecDeque<SortOrder>,
}

impl SortCycle {
    pub fn new() -> Self {
        SortCycle {
            queue: SortOrder::ROTATION.into_iter().collect(),
        }
    }

    /// The order the next `advance` will return.
    pub fn peek(&self) -> SortOrder {
        self.queue.front().copied().unwrap_or(SortOrder::None)
    }

    pub fn advance(&mut self) -> SortOrder {
        match self.queue.pop_front() {
            Some(order) => {
                self.queue.push_back(order);
                order
            }
            None => SortOrder::None,
        }
    }
}

impl Default for SortCycle {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
