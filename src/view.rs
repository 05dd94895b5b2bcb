// 🖼️ Production View - What the menu shows for one page
//
// Holds the page's base list and derives the visible list from it:
// an active search ranks by match quality, otherwise the chosen sort order
// applies. The scroll clamp is part of the view because every change to the
// visible list changes the content height.

use crate::resource::StockEntry;
use crate::scroll::ScrollState;
use crate::search::SearchQuery;
use crate::sort::SortOrder;
use crate::tracker::ProductionWindow;
use serde::Serialize;

// ============================================================================
// PAGE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    /// Live stock across all storages
    Inventory,
    /// Rollup from the tracker
    Produced(ProductionWindow),
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Inventory,
        Page::Produced(ProductionWindow::Today),
        Page::Produced(ProductionWindow::Yesterday),
        Page::Produced(ProductionWindow::ThisWeek),
        Page::Produced(ProductionWindow::ThisSeason),
        Page::Produced(ProductionWindow::ThisYear),
    ];

    fn position(&self) -> usize {
        Page::ALL.iter().position(|p| p == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Page::ALL[(self.position() + 1) % Page::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        Page::ALL[(self.position() + Page::ALL.len() - 1) % Page::ALL.len()]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Inventory => "Inventory",
            Page::Produced(window) => window.title(),
        }
    }
}

// ============================================================================
// PRESENTATION
// ============================================================================

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    pub title: String,
    pub entries: Vec<StockEntry>,
    pub scroll_current: u32,
    pub scroll_max: u32,
    pub sort_label: String,
    pub filtering: bool,
}

// ============================================================================
// PRODUCTION VIEW
// ============================================================================

#[derive(Debug, Clone)]
pub struct ProductionView {
    page: Page,
    base: Vec<StockEntry>,
    visible: Vec<StockEntry>,
    sort_order: SortOrder,
    query: SearchQuery,
    scroll: ScrollState,
    /// Last measured viewport height; `None` until the first layout
    viewport_height: Option<u32>,
}

impl ProductionView {
    pub fn new(page: Page, entries: Vec<StockEntry>, scroll_amount: u32) -> Self {
        let mut view = ProductionView {
            page,
            visible: entries.clone(),
            base: entries,
            sort_order: SortOrder::None,
            query: SearchQuery::default(),
            scroll: ScrollState::new(scroll_amount),
            viewport_height: None,
        };
        view.refresh();
        view
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn title(&self) -> &'static str {
        self.page.title()
    }

    /// Swap in a new page. Search text and sort order carry over.
    pub fn set_page(&mut self, page: Page, entries: Vec<StockEntry>) {
        self.page = page;
        self.base = entries;
        self.scroll.scroll_to_top();
        self.refresh();
    }

    pub fn entries(&self) -> &[StockEntry] {
        &self.base
    }

    /// The list to draw, in order.
    pub fn visible(&self) -> &[StockEntry] {
        &self.visible
    }

    pub fn search_text(&self) -> &str {
        self.query.text()
    }

    pub fn is_filtering(&self) -> bool {
        self.query.is_active()
    }

    pub fn set_search(&mut self, text: &str) {
        self.query = SearchQuery::new(text);
        self.refresh();
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Apply a sort order. Ignored (returns false) while a search is active.
    pub fn apply_sort(&mut self, order: SortOrder) -> bool {
        if self.is_filtering() {
            return false;
        }
        self.sort_order = order;
        self.refresh();
        true
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn scroll_mut(&mut self) -> &mut ScrollState {
        &mut self.scroll
    }

    /// Feed a fresh layout measurement into the scroll clamp.
    pub fn layout(&mut self, content_height: u32, viewport_height: u32) {
        self.viewport_height = Some(viewport_height);
        self.scroll.fit_content(content_height, viewport_height);
    }

    pub fn presentation(&self) -> Presentation {
        Presentation {
            title: self.title().to_string(),
            entries: self.visible.clone(),
            scroll_current: self.scroll.current(),
            scroll_max: self.scroll.max(),
            sort_label: self.sort_order.description().to_string(),
            filtering: self.is_filtering(),
        }
    }

    fn refresh(&mut self) {
        self.visible = if self.query.is_active() {
            self.query.apply(&self.base)
        } else {
            self.sort_order.sorted(&self.base)
        };
        // One row per entry
        if let Some(viewport) = self.viewport_height {
            self.scroll.fit_content(self.visible.len() as u32, viewport);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
