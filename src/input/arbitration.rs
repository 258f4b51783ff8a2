//! Ownership arbitration between the drawer drag and the nested list scroll
//!
//! When the drawer's pan and the list's own scroll pan both want a touch,
//! `decide` picks who moves. The decision is a pure function of the drawer
//! state, the drag direction and the list offset; `GestureArbitrator`
//! applies its side effects to the list and the controller.

use tracing::debug;

use crate::drawer::{DrawerController, ExpansionState};
use crate::input::ScrollRegion;

/// The other recognizer taking part in a simultaneous-recognition query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counterparty {
    /// The nested list's own scroll pan
    InnerScroll,
    /// Any unrelated recognizer (header buttons, search field, ...)
    Other,
}

/// Outcome of one arbitration query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arbitration {
    /// Unrelated recognizer, both may run
    Unrelated,
    /// Drawer is compressed or expanded: only the drawer drag runs
    DrawerExclusive,
    /// Full height, dragging down with list content above the top: the list scrolls
    YieldToScroll,
    /// Full height, dragging down with the list at its top: the drawer takes the touch
    TakeOver,
    /// Full height, dragging up: the list owns the motion, drawer ignores moves
    ScrollOwnsMotion,
}

impl Arbitration {
    /// Whether the drawer drag recognizes simultaneously with the other recognizer
    pub fn recognize_simultaneously(self) -> bool {
        match self {
            Arbitration::Unrelated | Arbitration::YieldToScroll | Arbitration::ScrollOwnsMotion => true,
            Arbitration::DrawerExclusive | Arbitration::TakeOver => false,
        }
    }

    /// New value for the controller's move-handling flag, if this outcome sets it
    pub fn should_handle_gesture(self) -> Option<bool> {
        match self {
            Arbitration::TakeOver => Some(true),
            Arbitration::ScrollOwnsMotion => Some(false),
            _ => None,
        }
    }

    /// Whether the list's own pan stays enabled after the query
    pub fn inner_pan_enabled(self) -> bool {
        self != Arbitration::TakeOver
    }
}

/// Pure arbitration table
pub fn decide(
    counterparty: Counterparty,
    state: ExpansionState,
    velocity_y: f64,
    scroll_offset_y: f64,
) -> Arbitration {
    if counterparty == Counterparty::Other {
        return Arbitration::Unrelated;
    }
    match state {
        ExpansionState::Compressed | ExpansionState::Expanded => Arbitration::DrawerExclusive,
        ExpansionState::FullHeight => {
            if velocity_y > 0.0 {
                // Dragging down
                if scroll_offset_y > 0.0 {
                    Arbitration::YieldToScroll
                } else {
                    Arbitration::TakeOver
                }
            } else {
                // Dragging up
                Arbitration::ScrollOwnsMotion
            }
        }
    }
}

/// Applies arbitration decisions to the list and the drawer controller
#[derive(Debug, Default, Clone, Copy)]
pub struct GestureArbitrator;

impl GestureArbitrator {
    /// Answer a simultaneous-recognition query for the drawer drag
    ///
    /// Returns whether the drawer drag should also recognize the touch.
    pub fn should_recognize_simultaneously(
        &self,
        counterparty: Counterparty,
        velocity_y: f64,
        controller: &mut DrawerController,
        region: &mut dyn ScrollRegion,
    ) -> Arbitration {
        // Never leave the list's pan stuck disabled across state changes
        region.set_pan_enabled(true);

        let outcome = decide(
            counterparty,
            controller.expansion_state(),
            velocity_y,
            region.content_offset_y(),
        );

        if let Some(handle) = outcome.should_handle_gesture() {
            controller.set_should_handle_gesture(handle);
        }
        if !outcome.inner_pan_enabled() {
            region.set_pan_enabled(false);
        }

        debug!(
            ?outcome,
            state = ?controller.expansion_state(),
            velocity_y,
            offset = region.content_offset_y(),
            "Arbitrated drawer drag"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DrawerConfig;
    use crate::drawer::ShortcutList;

    #[test]
    fn test_decision_table() {
        use Arbitration::*;
        use ExpansionState::*;

        // (state, velocity_y, offset) -> outcome
        let cases = [
            (Compressed, 10.0, 0.0, DrawerExclusive),
            (Compressed, 10.0, 40.0, DrawerExclusive),
            (Compressed, -10.0, 0.0, DrawerExclusive),
            (Compressed, 0.0, 40.0, DrawerExclusive),
            (Expanded, 10.0, 0.0, DrawerExclusive),
            (Expanded, 10.0, 40.0, DrawerExclusive),
            (Expanded, -10.0, 0.0, DrawerExclusive),
            (Expanded, 0.0, 40.0, DrawerExclusive),
            (FullHeight, 10.0, 40.0, YieldToScroll),
            (FullHeight, 10.0, 0.0, TakeOver),
            (FullHeight, 10.0, -5.0, TakeOver),
            (FullHeight, 0.0, 0.0, ScrollOwnsMotion),
            (FullHeight, 0.0, 40.0, ScrollOwnsMotion),
            (FullHeight, -10.0, 0.0, ScrollOwnsMotion),
            (FullHeight, -10.0, 40.0, ScrollOwnsMotion),
        ];
        for (state, velocity, offset, expected) in cases {
            assert_eq!(
                decide(Counterparty::InnerScroll, state, velocity, offset),
                expected,
                "state={state:?} velocity={velocity} offset={offset}"
            );
        }
    }

    #[test]
    fn test_unrelated_recognizer_always_simultaneous() {
        for state in ExpansionState::ALL {
            for velocity in [-10.0, 0.0, 10.0] {
                let outcome = decide(Counterparty::Other, state, velocity, 0.0);
                assert_eq!(outcome, Arbitration::Unrelated);
                assert!(outcome.recognize_simultaneously());
            }
        }
    }

    #[test]
    fn test_simultaneous_answers() {
        assert!(!Arbitration::DrawerExclusive.recognize_simultaneously());
        assert!(Arbitration::YieldToScroll.recognize_simultaneously());
        assert!(!Arbitration::TakeOver.recognize_simultaneously());
        assert!(Arbitration::ScrollOwnsMotion.recognize_simultaneously());
    }

    fn full_height_controller(list: &mut ShortcutList) -> DrawerController {
        let mut controller = DrawerController::new(&DrawerConfig::default());
        controller.set_expansion_state(ExpansionState::FullHeight, list);
        controller
    }

    #[test]
    fn test_take_over_disables_list_pan() {
        let mut list = ShortcutList::with_sample_rows(20);
        let mut controller = full_height_controller(&mut list);
        controller.set_should_handle_gesture(false);

        let outcome = GestureArbitrator.should_recognize_simultaneously(
            Counterparty::InnerScroll,
            120.0,
            &mut controller,
            &mut list,
        );
        assert_eq!(outcome, Arbitration::TakeOver);
        assert!(controller.should_handle_gesture());
        assert!(!list.is_pan_enabled());
    }

    #[test]
    fn test_drag_up_hands_motion_to_list() {
        let mut list = ShortcutList::with_sample_rows(20);
        let mut controller = full_height_controller(&mut list);

        let outcome = GestureArbitrator.should_recognize_simultaneously(
            Counterparty::InnerScroll,
            -300.0,
            &mut controller,
            &mut list,
        );
        assert_eq!(outcome, Arbitration::ScrollOwnsMotion);
        assert!(!controller.should_handle_gesture());
        assert!(list.is_pan_enabled());
    }

    #[test]
    fn test_query_reenables_list_pan() {
        let mut list = ShortcutList::with_sample_rows(20);
        let mut controller = DrawerController::new(&DrawerConfig::default());
        controller.load(&mut list);
        assert!(!list.is_pan_enabled());

        let outcome = GestureArbitrator.should_recognize_simultaneously(
            Counterparty::InnerScroll,
            -300.0,
            &mut controller,
            &mut list,
        );
        assert_eq!(outcome, Arbitration::DrawerExclusive);
        assert!(list.is_pan_enabled());
        assert!(controller.should_handle_gesture());
    }

    #[test]
    fn test_yield_leaves_flag_alone() {
        let mut list = ShortcutList::with_sample_rows(20);
        list.set_content_offset_y(80.0);
        let mut controller = full_height_controller(&mut list);
        let before = controller.should_handle_gesture();

        let outcome = GestureArbitrator.should_recognize_simultaneously(
            Counterparty::InnerScroll,
            200.0,
            &mut controller,
            &mut list,
        );
        assert_eq!(outcome, Arbitration::YieldToScroll);
        assert_eq!(controller.should_handle_gesture(), before);
        assert!(list.is_pan_enabled());
    }
}
