// 📜 Scroll - Viewport offset kept inside the measured content
//
// The renderer lays content out shifted up by the current offset, measures
// where it ends, and reports that back through `relayout`. The maximum
// scroll is recomputed from that measurement every time, then the offset is
// clamped into [0, max]. Content height changes whenever the filter, sort or
// page changes, so a stale max is never reused.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollState {
    current: u32,
    max: u32,
    default_amount: u32,
}

impl ScrollState {
    pub fn new(default_amount: u32) -> Self {
        ScrollState {
            current: 0,
            max: 0,
            default_amount,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn default_amount(&self) -> u32 {
        self.default_amount
    }

    /// Scroll towards the top by `amount`, or the default amount.
    pub fn scroll_up(&mut self, amount: Option<u32>) {
        let amount = amount.unwrap_or(self.default_amount);
        self.current = self.current.saturating_sub(amount);
    }

    /// Scroll towards the bottom by `amount`, or the default amount.
    pub fn scroll_down(&mut self, amount: Option<u32>) {
        let amount = amount.unwrap_or(self.default_amount);
        self.current = self.current.saturating_add(amount).min(self.max);
    }

    pub fn page_up(&mut self, viewport_height: u32) {
        self.scroll_up(Some(viewport_height));
    }

    pub fn page_down(&mut self, viewport_height: u32) {
        self.scroll_down(Some(viewport_height));
    }

    pub fn scroll_to_top(&mut self) {
        self.current = 0;
    }

    /// Recompute the maximum from a fresh layout and clamp the offset.
    ///
    /// `rendered_bottom` is where the content ended relative to the top of
    /// the viewport, with the content already shifted up by the current
    /// offset (it may be negative when scrolled past the end).
    pub fn relayout(&mut self, rendered_bottom: i64, viewport_height: u32) {
        let max = rendered_bottom - viewport_height as i64 + self.current as i64;
        self.max = max.clamp(0, u32::MAX as i64) as u32;
        self.current = self.current.min(self.max);
    }

    /// Same as [`relayout`](Self::relayout) for callers that know the
    /// total (unshifted) content height.
    pub fn fit_content(&mut self, content_height: u32, viewport_height: u32) {
        let rendered_bottom = content_height as i64 - self.current as i64;
        self.relayout(rendered_bottom, viewport_height);
    }

    /// Whether the "scroll up" arrow should be shown.
    pub fn can_scroll_up(&self) -> bool {
        self.max > 0 && self.current > 0
    }

    /// Whether the "scroll down" arrow should be shown.
    pub fn can_scroll_down(&self) -> bool {
        self.max > 0 && self.current < self.max
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_scroll_from_layout() {
        let mut scroll = ScrollState::new(160);

        scroll.fit_content(1000, 400);

        assert_eq!(scroll.max(), 600);
        assert_eq!(scroll.current(), 0);
    }

    #[test]
    fn test_scroll_down_clamps_to_max() {
        let mut scroll = ScrollState::new(160);
        scroll.fit_content(1000, 400);

        scroll.scroll_down(Some(900));

        assert_eq!(scroll.current(), 600);
    }

    #[test]
    fn test_scroll_up_stops_at_zero() {
        let mut scroll = ScrollState::new(160);
        scroll.fit_content(1000, 400);
        scroll.scroll_down(None);

        assert_eq!(scroll.current(), 160);
        scroll.scroll_up(None);
        scroll.scroll_up(None);
        assert_eq!(scroll.current(), 0);
    }

    #[test]
    fn test_relayout_with_shifted_measurement() {
        let mut scroll = ScrollState::new(160);
        scroll.relayout(1000, 400);
        scroll.scroll_down(Some(500));

        // Content is now drawn 500 higher: it ends at 500
        scroll.relayout(500, 400);

        assert_eq!(scroll.max(), 600);
        assert_eq!(scroll.current(), 500);
    }

    #[test]
    fn test_shrinking_content_reclamps() {
        let mut scroll = ScrollState::new(160);
        scroll.fit_content(1000, 400);
        scroll.scroll_down(Some(600));

        // A filter leaves far fewer rows
        scroll.fit_content(550, 400);

        assert_eq!(scroll.max(), 150);
        assert_eq!(scroll.current(), 150);

        scroll.fit_content(100, 400);
        assert_eq!(scroll.max(), 0);
        assert_eq!(scroll.current(), 0);
    }

    #[test]
    fn test_arrows() {
        let mut scroll = ScrollState::new(10);
        scroll.fit_content(300, 400);
        assert!(!scroll.can_scroll_up());
        assert!(!scroll.can_scroll_down());

        scroll.fit_content(1000, 400);
        assert!(!scroll.can_scroll_up());
        assert!(scroll.can_scroll_down());

        scroll.page_down(400);
        scroll.page_down(400);
        assert!(scroll.can_scroll_up());
        assert!(!scroll.can_scroll_down());
    }
}
