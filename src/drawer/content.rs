//! Drawer list content
//!
//! The drawer treats its list as an opaque indexed row source plus a
//! `ScrollRegion`. `ShortcutList` is the in-memory list the shell and the
//! replay tool use.

use serde::Serialize;

use crate::error::{DrawerError, Result};
use crate::input::ScrollRegion;

/// Height of one list row
pub const ROW_HEIGHT: f64 = 65.0;

/// One shortcut row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortcutRow {
    /// Icon name, resolved by the renderer
    pub icon: String,
    pub title: String,
    pub description: String,
}

impl ShortcutRow {
    pub fn new(icon: &str, title: &str, description: &str) -> Self {
        Self {
            icon: icon.to_string(),
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// A row the user tapped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowSelection {
    pub index: usize,
    pub row: ShortcutRow,
}

/// Indexed row data for the drawer list
pub trait RowSource {
    fn row_count(&self) -> usize;

    /// Row at `index`, `RowOutOfRange` past the end
    fn row(&self, index: usize) -> Result<ShortcutRow>;
}

/// Stock shortcut actions shown in the drawer
pub fn default_shortcuts() -> Vec<ShortcutRow> {
    vec![
        ShortcutRow::new(
            "messages",
            "Send Message",
            "Sends a message. Pass images, videos, or other files as input to include attachments.",
        ),
        ShortcutRow::new(
            "maps",
            "Get Distance",
            "Calculates the distance to the location passed into this action.",
        ),
        ShortcutRow::new(
            "settings",
            "Get Name",
            "Returns the name of every item passed as input.",
        ),
        ShortcutRow::new(
            "photos",
            "Find Photos",
            "Searches for the photos in your library that match the given criteria.",
        ),
        ShortcutRow::new(
            "store",
            "Search App Store",
            "Searches the store, returning the apps that match the specified search terms.",
        ),
        ShortcutRow::new(
            "music",
            "Add to Playlist",
            "Adds the item passed as input to the specified playlist.",
        ),
    ]
}

/// In-memory scrollable list of shortcut rows
#[derive(Debug, Clone)]
pub struct ShortcutList {
    rows: Vec<ShortcutRow>,
    row_height: f64,
    viewport_height: f64,
    content_offset_y: f64,
    pan_enabled: bool,
    scroll_enabled: bool,
    /// List currently holds the active touch
    tracking: bool,
}

impl ShortcutList {
    pub fn new(rows: Vec<ShortcutRow>) -> Self {
        Self {
            rows,
            row_height: ROW_HEIGHT,
            viewport_height: 0.0,
            content_offset_y: 0.0,
            pan_enabled: true,
            scroll_enabled: true,
            tracking: false,
        }
    }

    /// `count` rows cycling through the stock shortcuts
    pub fn with_sample_rows(count: usize) -> Self {
        let samples = default_shortcuts();
        let rows = (0..count).map(|i| samples[i % samples.len()].clone()).collect();
        Self::new(rows)
    }

    pub fn content_height(&self) -> f64 {
        self.rows.len() as f64 * self.row_height
    }

    /// Visible height of the list, used to bound scrolling
    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = height.max(0.0);
        self.content_offset_y = self.content_offset_y.min(self.max_offset());
    }

    pub fn max_offset(&self) -> f64 {
        (self.content_height() - self.viewport_height).max(0.0)
    }

    pub fn set_content_offset_y(&mut self, offset: f64) {
        self.content_offset_y = offset.clamp(0.0, self.max_offset());
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Rows currently inside the viewport
    pub fn visible_rows(&self) -> std::ops::Range<usize> {
        if self.row_height <= 0.0 || self.rows.is_empty() {
            return 0..0;
        }
        let first = (self.content_offset_y / self.row_height).floor() as usize;
        let last = ((self.content_offset_y + self.viewport_height) / self.row_height).ceil() as usize;
        first.min(self.rows.len())..last.min(self.rows.len())
    }

    /// Index of the row at `viewport_y`, measured from the top of the
    /// list's viewport
    pub fn row_at(&self, viewport_y: f64) -> Option<usize> {
        if !(0.0..self.viewport_height).contains(&viewport_y) {
            return None;
        }
        let index = ((self.content_offset_y + viewport_y) / self.row_height).floor() as usize;
        self.visible_rows().contains(&index).then_some(index)
    }
}

impl RowSource for ShortcutList {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn row(&self, index: usize) -> Result<ShortcutRow> {
        self.rows.get(index).cloned().ok_or(DrawerError::RowOutOfRange {
            index,
            count: self.rows.len(),
        })
    }
}

impl ScrollRegion for ShortcutList {
    fn content_offset_y(&self) -> f64 {
        self.content_offset_y
    }

    fn is_pan_enabled(&self) -> bool {
        self.pan_enabled
    }

    fn set_pan_enabled(&mut self, enabled: bool) {
        self.pan_enabled = enabled;
    }

    fn set_scroll_enabled(&mut self, enabled: bool) {
        self.scroll_enabled = enabled;
        if !enabled {
            self.tracking = false;
        }
    }

    fn begin_touch(&mut self) {
        self.tracking = self.scroll_enabled;
    }

    fn end_touch(&mut self) {
        self.tracking = false;
    }

    fn scroll_by(&mut self, finger_dy: f64) -> bool {
        if !(self.pan_enabled && self.scroll_enabled && self.tracking) {
            return false;
        }
        // Finger down scrolls content back toward the top
        self.content_offset_y = (self.content_offset_y - finger_dy).clamp(0.0, self.max_offset());
        true
    }
}
