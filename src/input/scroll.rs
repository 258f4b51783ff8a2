//! Scroll hand-off between the nested list and the drawer drag
//!
//! While the drawer is at full height a downward drag first scrolls the
//! list back to its top. The moment the list reaches the top with the
//! finger still moving, the list is flushed and the drawer drag re-armed so
//! the rest of the same gesture pulls the drawer down.

use tracing::debug;

use crate::drawer::{DrawerController, ExpansionState};
use crate::geometry::Point;

/// The nested scrollable list as seen by the drawer
pub trait ScrollRegion {
    /// Vertical content offset, 0.0 when scrolled to the top
    fn content_offset_y(&self) -> f64;

    /// Whether the list's own pan recognizer is enabled
    fn is_pan_enabled(&self) -> bool;

    fn set_pan_enabled(&mut self, enabled: bool);

    /// Toggle scrolling. Disabling cancels the list's hold on the current
    /// touch along with any momentum.
    fn set_scroll_enabled(&mut self, enabled: bool);

    /// A touch landed on the list
    fn begin_touch(&mut self);

    /// The touch on the list ended
    fn end_touch(&mut self);

    /// Apply a finger movement (positive = finger moved down). Returns true
    /// if the list consumed it.
    fn scroll_by(&mut self, finger_dy: f64) -> bool;
}

/// Whether a list offset change should hand the gesture back to the drawer
pub fn should_hand_off(state: ExpansionState, content_offset_y: f64, drag_velocity_y: f64) -> bool {
    content_offset_y <= 0.0 && state == ExpansionState::FullHeight && drag_velocity_y != 0.0
}

/// Observes list offset changes on behalf of the drawer controller
#[derive(Debug, Default, Clone, Copy)]
pub struct ScrollCoordinator;

impl ScrollCoordinator {
    /// Called after the list's content offset changed
    ///
    /// Returns true when the drawer drag was re-armed while it had been
    /// ignoring moves, i.e. the touch just changed hands mid-gesture.
    pub fn scroll_did_change(
        &self,
        controller: &mut DrawerController,
        region: &mut dyn ScrollRegion,
        drag_velocity: Point,
    ) -> bool {
        let offset = region.content_offset_y();
        if !should_hand_off(controller.expansion_state(), offset, drag_velocity.y) {
            return false;
        }

        let was_handling = controller.should_handle_gesture();
        controller.set_should_handle_gesture(true);
        region.set_scroll_enabled(false);
        region.set_scroll_enabled(true);

        debug!(offset, velocity_y = drag_velocity.y, was_handling, "List reached top, drawer drag re-armed");
        !was_handling
    }
}
