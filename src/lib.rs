//! Flick bottom drawer
//!
//! Headless engine for a three-state draggable panel with a scrollable list
//! nested inside it. Hosts push touches and frame ticks into a
//! [`drawer::Drawer`] and render the [`drawer::DrawerFrame`] it reports.

pub mod animation;
pub mod config;
pub mod drawer;
pub mod error;
pub mod geometry;
pub mod input;
pub mod replay;

pub use config::DrawerConfig;
pub use drawer::{Drawer, DrawerFrame, ExpansionState};
pub use error::{DrawerError, Result};
