// 🎮 Session - Owns the tracker and menu state for one loaded save
//
// Host notifications arrive as `Notification` values and are processed one
// at a time by `dispatch`. Only the local player's inventory changes are
// recorded. Menu requests (pages, sort key, search box, scrolling) go
// through the same context so there is no ambient mutable state.

use crate::calendar::DateProvider;
use crate::holdings::{build_snapshot, HoldingsSource, OwnerId};
use crate::persistence::{load_tracker, save_tracker, PersistenceError, SaveDataStore};
use crate::resource::{ItemStack, Resource, StockEntry};
use crate::sort::{SortCycle, SortOrder};
use crate::tracker::InventoryTracker;
use crate::view::{Page, Presentation, ProductionView};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no save is loaded")]
    NotLoaded,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

// ============================================================================
// NOTIFICATIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Stacks entered `owner`'s inventory
    ItemsAdded { owner: OwnerId, items: Vec<ItemStack> },
    /// Stacks left `owner`'s inventory
    ItemsRemoved { owner: OwnerId, items: Vec<ItemStack> },
    /// An existing stack changed size
    StackSizeChanged {
        owner: OwnerId,
        resource: Resource,
        old_size: i32,
        new_size: i32,
    },
    SaveLoaded,
    Saving,
    ReturnedToTitle,
}

impl Notification {
    fn owner(&self) -> Option<OwnerId> {
        match self {
            Notification::ItemsAdded { owner, .. }
            | Notification::ItemsRemoved { owner, .. }
            | Notification::StackSizeChanged { owner, .. } => Some(*owner),
            _ => None,
        }
    }
}

/// Status line shown after the sort key is pressed.
pub fn sort_message(order: SortOrder) -> String {
    format!("View sorted by {}", order.description())
}

// ============================================================================
// SESSION
// ============================================================================

pub struct Session<S: SaveDataStore> {
    local_owner: OwnerId,
    save_key: String,
    store: S,
    calendar: Rc<dyn DateProvider>,
    tracker: Option<InventoryTracker>,
    sort_cycle: SortCycle,
    view: Option<ProductionView>,
    scroll_amount: u32,
}

impl<S: SaveDataStore> Session<S> {
    pub fn new(
        store: S,
        calendar: Rc<dyn DateProvider>,
        local_owner: OwnerId,
        save_key: impl Into<String>,
        scroll_amount: u32,
    ) -> Self {
        Session {
            local_owner,
            save_key: save_key.into(),
            store,
            calendar,
            tracker: None,
            sort_cycle: SortCycle::new(),
            view: None,
            scroll_amount,
        }
    }

    pub fn local_owner(&self) -> OwnerId {
        self.local_owner
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn tracker(&self) -> Option<&InventoryTracker> {
        self.tracker.as_ref()
    }

    pub fn tracker_mut(&mut self) -> Option<&mut InventoryTracker> {
        self.tracker.as_mut()
    }

    pub fn is_loaded(&self) -> bool {
        self.tracker.is_some()
    }

    /// Process one host notification.
    pub fn dispatch(&mut self, notification: Notification) -> Result<()> {
        if let Some(owner) = notification.owner() {
            if owner != self.local_owner {
                debug!(owner, local = self.local_owner, "session.foreign_owner_ignored");
                return Ok(());
            }
        }

        match notification {
            Notification::SaveLoaded => {
                let tracker = load_tracker(&self.store, &self.save_key, self.calendar.clone())?;
                self.tracker = Some(tracker);
            }
            Notification::Saving => match &self.tracker {
                Some(tracker) => save_tracker(&mut self.store, &self.save_key, tracker)?,
                None => debug!("session.save_skipped"),
            },
            Notification::ReturnedToTitle => {
                self.view = None;
                if let Some(tracker) = self.tracker.as_mut() {
                    tracker.reset();
                }
            }
            Notification::ItemsAdded { items, .. } => {
                for stack in items {
                    self.record(stack.resource, stack.stack as i64);
                }
            }
            Notification::ItemsRemoved { items, .. } => {
                for stack in items {
                    self.record(stack.resource, -(stack.stack as i64));
                }
            }
            Notification::StackSizeChanged {
                resource,
                old_size,
                new_size,
                ..
            } => {
                let delta = new_size as i64 - old_size as i64;
                if delta != 0 {
                    self.record(resource, delta);
                }
            }
        }

        Ok(())
    }

    fn record(&mut self, resource: Resource, count: i64) {
        match self.tracker.as_mut() {
            Some(tracker) => tracker.add(resource, count),
            None => debug!(item = %resource.qualified_id, count, "session.change_before_load"),
        }
    }

    // ------------------------------------------------------------------------
    // Menu
    // ------------------------------------------------------------------------

    /// Entries a page lists: live stock for the inventory page, a tracker
    /// rollup for the others.
    pub fn entries_for(&self, page: Page, sources: &[&dyn HoldingsSource]) -> Result<Vec<StockEntry>> {
        match page {
            Page::Inventory => Ok(build_snapshot(sources, self.local_owner)),
            Page::Produced(window) => {
                let tracker = self.tracker.as_ref().ok_or(SessionError::NotLoaded)?;
                Ok(tracker.produced(window))
            }
        }
    }

    /// Open the menu on `page`, or switch the open menu to it.
    pub fn show_page(&mut self, page: Page, sources: &[&dyn HoldingsSource]) -> Result<()> {
        let entries = self.entries_for(page, sources)?;
        info!(page = page.title(), entries = entries.len(), "menu.page");
        match self.view.as_mut() {
            Some(view) => view.set_page(page, entries),
            None => self.view = Some(ProductionView::new(page, entries, self.scroll_amount)),
        }
        Ok(())
    }

    pub fn next_page(&mut self, sources: &[&dyn HoldingsSource]) -> Result<()> {
        let page = self.current_page().map_or(Page::Inventory, |p| p.next());
        self.show_page(page, sources)
    }

    pub fn previous_page(&mut self, sources: &[&dyn HoldingsSource]) -> Result<()> {
        let page = self.current_page().map_or(Page::Inventory, |p| p.previous());
        self.show_page(page, sources)
    }

    /// Reload the open page so new events show up. No-op with the menu closed.
    pub fn refresh(&mut self, sources: &[&dyn HoldingsSource]) -> Result<()> {
        match self.current_page() {
            Some(page) => {
                let entries = self.entries_for(page, sources)?;
                if let Some(view) = self.view.as_mut() {
                    let scroll = view.scroll().current();
                    // set_page re-measures against the new rows, so this
                    // restores the offset clamped to the fresh max
                    view.set_page(page, entries);
                    view.scroll_mut().scroll_down(Some(scroll));
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub fn current_page(&self) -> Option<Page> {
        self.view.as_ref().map(|v| v.page())
    }

    pub fn view(&self) -> Option<&ProductionView> {
        self.view.as_ref()
    }

    pub fn view_mut(&mut self) -> Option<&mut ProductionView> {
        self.view.as_mut()
    }

    pub fn presentation(&self) -> Option<Presentation> {
        self.view.as_ref().map(|v| v.presentation())
    }

    pub fn close_menu(&mut self) {
        self.view = None;
    }

    /// Apply the next order in the rotation to the open page.
    ///
    /// Returns `None`, without moving the rotation, when no menu is open or
    /// a search is active.
    pub fn advance_sort(&mut self) -> Option<SortOrder> {
        let view = self.view.as_mut()?;
        if view.is_filtering() {
            debug!(query = view.search_text(), "menu.sort_ignored");
            return None;
        }
        let order = self.sort_cycle.advance();
        view.apply_sort(order);
        info!(order = order.description(), "menu.sorted");
        Some(order)
    }

    pub fn set_search(&mut self, text: &str) {
        if let Some(view) = self.view.as_mut() {
            view.set_search(text);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
