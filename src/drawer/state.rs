//! Drawer expansion states and their rest heights

use serde::{Deserialize, Serialize};

use crate::geometry::Size;

/// Rest height state of the drawer inside its container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpansionState {
    /// Only the header peeks above the bottom edge
    #[default]
    Compressed,
    /// Header plus the first rows of the list
    Expanded,
    /// Covers the container except a strip at the top
    FullHeight,
}

impl ExpansionState {
    pub const ALL: [ExpansionState; 3] = [
        ExpansionState::Compressed,
        ExpansionState::Expanded,
        ExpansionState::FullHeight,
    ];

    /// Height of the drawer in this state with the stock heights
    pub fn height(self, container: Size) -> f64 {
        self.height_with(&DrawerHeights::default(), container)
    }

    /// Height of the drawer in this state
    ///
    /// Always derived from the container size passed in; callers must not
    /// cache the result across a bounds change.
    pub fn height_with(self, heights: &DrawerHeights, container: Size) -> f64 {
        match self {
            ExpansionState::Compressed => heights.compressed,
            ExpansionState::Expanded => heights.expanded,
            ExpansionState::FullHeight => container.h - heights.full_height_inset,
        }
    }

    /// Distance from the container's top edge to the drawer's top edge
    pub fn top_offset_with(self, heights: &DrawerHeights, container: Size) -> f64 {
        container.h - self.height_with(heights, container)
    }
}

/// Rest heights of the three expansion states
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawerHeights {
    pub compressed: f64,
    pub expanded: f64,
    /// Gap left between the container top and a full height drawer
    pub full_height_inset: f64,
}

impl Default for DrawerHeights {
    fn default() -> Self {
        Self {
            compressed: 120.0,
            expanded: 300.0,
            full_height_inset: 35.0,
        }
    }
}

/// The three rest offsets for one container size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestOffsets {
    pub compressed: f64,
    pub expanded: f64,
    pub full_height: f64,
}

impl RestOffsets {
    pub fn new(heights: &DrawerHeights, container: Size) -> Self {
        Self {
            compressed: ExpansionState::Compressed.top_offset_with(heights, container),
            expanded: ExpansionState::Expanded.top_offset_with(heights, container),
            full_height: ExpansionState::FullHeight.top_offset_with(heights, container),
        }
    }

    pub fn for_state(&self, state: ExpansionState) -> f64 {
        match state {
            ExpansionState::Compressed => self.compressed,
            ExpansionState::Expanded => self.expanded,
            ExpansionState::FullHeight => self.full_height,
        }
    }

    /// State whose rest offset is exactly `offset`, if any
    pub fn state_at(&self, offset: f64) -> Option<ExpansionState> {
        // Compare full height first: on a degenerate container several
        // offsets coincide and the tallest state wins.
        if offset == self.full_height {
            Some(ExpansionState::FullHeight)
        } else if offset == self.expanded {
            Some(ExpansionState::Expanded)
        } else if offset == self.compressed {
            Some(ExpansionState::Compressed)
        } else {
            None
        }
    }
}
