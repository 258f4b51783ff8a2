//! Input handling - touch tracking and drag ownership
//!
//! This module provides:
//! - Pan recognition for the first touch slot
//! - Arbitration between the drawer drag and the nested list scroll
//! - Scroll hand-off when the list reaches its top

mod arbitration;
mod gestures;
mod scroll;

pub use arbitration::*;
pub use gestures::*;
pub use scroll::*;
