//! Bottom drawer - three-state draggable panel
//!
//! Components:
//! - Expansion states and their rest heights
//! - Drawer controller (state, header fade, move forwarding)
//! - Container translator (offset, overlay, settle springs)
//! - Shortcut list nested inside the drawer
//!
//! [`Drawer`] wires them to the pan recognizer and routes raw touches.

mod container;
mod content;
mod controller;
mod state;

pub use container::*;
pub use content::*;
pub use controller::*;
pub use state::*;

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::DrawerConfig;
use crate::error::Result;
use crate::geometry::{Point, Size};
use crate::input::{
    Arbitration, Counterparty, DragPhase, DragSample, GestureArbitrator, PanRecognizer, PanState,
    ScrollCoordinator, ScrollRegion,
};

/// What the host needs to draw one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawerFrame {
    pub top_offset: f64,
    pub overlay_alpha: f64,
    pub header_alpha: f64,
    pub content_interaction_enabled: bool,
    pub expansion_state: ExpansionState,
    pub animating: bool,
}

/// Part of the drawer a touch landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchTarget {
    /// Title bar and search field
    Header,
    /// Shortcut list
    List,
}

#[derive(Debug, Clone, Copy)]
struct TouchRoute {
    id: i32,
    target: TouchTarget,
    arbitration: Option<Arbitration>,
    down_pos: Point,
    last_y: f64,
}

/// Drawer composition root
pub struct Drawer {
    config: DrawerConfig,
    controller: DrawerController,
    container: ContainerTranslator,
    list: ShortcutList,
    pan: PanRecognizer,
    arbitrator: GestureArbitrator,
    coordinator: ScrollCoordinator,
    touch: Option<TouchRoute>,
    last_selection: Option<RowSelection>,
}

impl Drawer {
    /// Build a drawer resting compressed inside `container`
    pub fn new(config: DrawerConfig, container: Size, list: ShortcutList) -> Result<Self> {
        config.validate()?;

        let mut drawer = Self {
            controller: DrawerController::new(&config),
            container: ContainerTranslator::new(config.clone(), container),
            pan: PanRecognizer::new(config.touch_slop, config.velocity_window()),
            list,
            arbitrator: GestureArbitrator,
            coordinator: ScrollCoordinator,
            touch: None,
            last_selection: None,
            config,
        };
        drawer.update_list_viewport();
        drawer.controller.load(&mut drawer.list);

        info!(
            w = container.w,
            h = container.h,
            rows = drawer.list.row_count(),
            "Drawer loaded"
        );
        Ok(drawer)
    }

    pub fn config(&self) -> &DrawerConfig {
        &self.config
    }

    pub fn expansion_state(&self) -> ExpansionState {
        self.controller.expansion_state()
    }

    pub fn controller(&self) -> &DrawerController {
        &self.controller
    }

    pub fn container(&self) -> &ContainerTranslator {
        &self.container
    }

    pub fn list(&self) -> &ShortcutList {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ShortcutList {
        &mut self.list
    }

    pub fn pan(&self) -> &PanRecognizer {
        &self.pan
    }

    /// Snapshot for rendering
    pub fn frame(&self) -> DrawerFrame {
        DrawerFrame {
            top_offset: self.container.top_offset(),
            overlay_alpha: self.container.overlay_alpha(),
            header_alpha: self.controller.header().alpha(),
            content_interaction_enabled: self.controller.content_interaction_enabled(),
            expansion_state: self.controller.expansion_state(),
            animating: self.container.is_animating() || self.controller.header().is_fading(),
        }
    }

    fn update_list_viewport(&mut self) {
        let heights = &self.config.heights;
        let drawer_height = ExpansionState::FullHeight.height_with(heights, self.container.container());
        self.list
            .set_viewport_height(drawer_height - self.config.header_height);
    }

    /// Container bounds changed (rotation, window resize)
    ///
    /// A resting drawer jumps to its state's offset for the new bounds. A
    /// drawer that is being dragged keeps following the finger.
    pub fn set_container_bounds(&mut self, container: Size) {
        self.container.set_container_bounds(container);
        self.update_list_viewport();
        if self.container.session().is_none() {
            self.container.snap_to(self.controller.expansion_state());
        }
    }

    /// Which part of the drawer sits under `pos`, if any
    pub fn hit_test(&self, pos: Point) -> Option<TouchTarget> {
        let top = self.container.top_offset();
        if pos.y < top {
            None
        } else if pos.y < top + self.config.header_height {
            Some(TouchTarget::Header)
        } else {
            Some(TouchTarget::List)
        }
    }

    /// Touch down. Returns whether the drawer took the touch.
    pub fn touch_down(&mut self, id: i32, pos: Point, time: Duration) -> bool {
        let Some(target) = self.hit_test(pos) else {
            return false;
        };
        if !self.pan.touch_down(id, pos, time) {
            return false;
        }
        if target == TouchTarget::List {
            self.list.begin_touch();
        }
        debug!(id, y = pos.y, ?target, "Drawer touch down");
        self.touch = Some(TouchRoute {
            id,
            target,
            arbitration: None,
            down_pos: pos,
            last_y: pos.y,
        });
        true
    }

    pub fn touch_motion(&mut self, id: i32, pos: Point, time: Duration) {
        let Some(mut route) = self.touch.filter(|route| route.id == id) else {
            return;
        };
        let finger_dy = pos.y - route.last_y;
        route.last_y = pos.y;

        let sample = self.pan.touch_motion(id, pos, time);
        if let Some(sample) = sample {
            match sample.phase {
                DragPhase::Began => {
                    let counterparty = match route.target {
                        TouchTarget::List => Counterparty::InnerScroll,
                        TouchTarget::Header => Counterparty::Other,
                    };
                    route.arbitration = Some(self.arbitrator.should_recognize_simultaneously(
                        counterparty,
                        sample.velocity.y,
                        &mut self.controller,
                        &mut self.list,
                    ));
                    self.dispatch(&sample);
                }
                DragPhase::Changed => {
                    let sample = self.scroll_list(&route, sample, finger_dy);
                    self.dispatch(&sample);
                }
                DragPhase::Ended => self.dispatch(&sample),
            }
        }
        self.touch = Some(route);
    }

    /// Let the list take its share of a move, handing the touch back to the
    /// drawer once the list is at its top
    fn scroll_list(&mut self, route: &TouchRoute, sample: DragSample, finger_dy: f64) -> DragSample {
        let simultaneous = route
            .arbitration
            .is_some_and(Arbitration::recognize_simultaneously);
        if route.target != TouchTarget::List || !simultaneous {
            return sample;
        }
        if !self.list.scroll_by(finger_dy) {
            return sample;
        }
        if !self
            .coordinator
            .scroll_did_change(&mut self.controller, &mut self.list, sample.velocity)
        {
            return sample;
        }

        // Drawer picks up from under the finger
        self.pan.reset_translation();
        DragSample {
            translation: self.pan.translation(),
            ..sample
        }
    }

    /// Touch up. A tap on the list selects the row under it.
    pub fn touch_up(&mut self, id: i32, time: Duration) -> Option<RowSelection> {
        let route = self.touch.filter(|route| route.id == id)?;
        let tapped = self.pan.state() == PanState::Possible;
        if let Some(sample) = self.pan.touch_up(id, time) {
            self.dispatch(&sample);
        }
        self.end_touch(route);

        if !tapped || route.target != TouchTarget::List {
            return None;
        }
        self.select_row_at(route.down_pos)
    }

    /// Most recent row selection
    pub fn last_selection(&self) -> Option<&RowSelection> {
        self.last_selection.as_ref()
    }

    fn select_row_at(&mut self, pos: Point) -> Option<RowSelection> {
        // Rows ignore taps while the drawer is being dragged or settling
        if !self.controller.content_interaction_enabled() || self.container.is_animating() {
            debug!(y = pos.y, "Tap on moving drawer ignored");
            return None;
        }
        let list_top = self.container.top_offset() + self.config.header_height;
        let index = self.list.row_at(pos.y - list_top)?;
        let row = match self.list.row(index) {
            Ok(row) => row,
            Err(err) => {
                warn!(%err, "Tapped row could not be resolved");
                return None;
            }
        };
        info!(index, title = %row.title, "Shortcut selected");
        let selection = RowSelection { index, row };
        self.last_selection = Some(selection.clone());
        Some(selection)
    }

    /// Touch cancelled by the system. A drawer that was being dragged settles
    /// from where it is, as if released without velocity.
    pub fn touch_cancel(&mut self) {
        let Some(route) = self.touch else {
            return;
        };
        let was_panning = self.pan.is_panning();
        let translation = self.pan.translation();
        self.pan.touch_cancel();
        if was_panning {
            self.dispatch(&DragSample {
                translation,
                velocity: Point::ZERO,
                phase: DragPhase::Ended,
            });
        }
        self.end_touch(route);
    }

    fn end_touch(&mut self, route: TouchRoute) {
        if route.target == TouchTarget::List {
            self.list.end_touch();
        }
        self.touch = None;
    }

    fn dispatch(&mut self, sample: &DragSample) {
        self.controller
            .handle_pan(sample, &mut self.list, Some(&mut self.container));
    }

    /// The search field started editing
    pub fn search_did_begin_editing(&mut self) {
        self.controller
            .search_did_begin_editing(&mut self.list, Some(&mut self.container));
    }

    /// Advance animations. Returns true while anything is still moving.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let header = self.controller.tick(dt);
        let container = self.container.tick(dt);
        header || container
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn drawer() -> Drawer {
        Drawer::new(
            DrawerConfig::default(),
            Size::new(390.0, 800.0),
            ShortcutList::with_sample_rows(20),
        )
        .unwrap()
    }

    fn settle(drawer: &mut Drawer) {
        let mut frames = 0;
        while drawer.tick(FRAME) {
            frames += 1;
            assert!(frames < 1000, "animation never finished");
        }
    }

    fn full_height_drawer() -> Drawer {
        let mut d = drawer();
        d.search_did_begin_editing();
        settle(&mut d);
        d
    }

    #[test]
    fn test_initial_frame() {
        let mut d = drawer();
        settle(&mut d);
        let frame = d.frame();
        assert_eq!(frame.top_offset, 680.0);
        assert_eq!(frame.overlay_alpha, 0.0);
        assert_eq!(frame.header_alpha, 0.0);
        assert_eq!(frame.expansion_state, ExpansionState::Compressed);
        assert!(frame.content_interaction_enabled);
        assert!(!frame.animating);
    }

    #[test]
    fn test_touch_above_drawer_ignored() {
        let mut d = drawer();
        assert!(!d.touch_down(0, Point::new(100.0, 300.0), ms(0)));
        assert_eq!(d.hit_test(Point::new(100.0, 700.0)), Some(TouchTarget::Header));
        assert_eq!(d.hit_test(Point::new(100.0, 760.0)), Some(TouchTarget::List));
    }

    #[test]
    fn test_slow_drag_opens_full_height() {
        let mut d = drawer();
        assert!(d.touch_down(0, Point::new(100.0, 760.0), ms(0)));
        d.touch_motion(0, Point::new(100.0, 740.0), ms(16));
        d.touch_motion(0, Point::new(100.0, 600.0), ms(50));
        d.touch_motion(0, Point::new(100.0, 480.0), ms(100));
        assert_eq!(d.frame().top_offset, 400.0);
        assert!(!d.frame().content_interaction_enabled);

        // Rest before lifting so the release is slow
        d.touch_motion(0, Point::new(100.0, 480.0), ms(300));
        d.touch_up(0, ms(310));
        assert_eq!(d.expansion_state(), ExpansionState::FullHeight);
        assert!(d.frame().content_interaction_enabled);

        settle(&mut d);
        let frame = d.frame();
        assert_eq!(frame.top_offset, 35.0);
        assert!((frame.overlay_alpha - 0.4).abs() < 1e-9);
        assert_eq!(frame.header_alpha, 1.0);
        assert!(d.list().is_pan_enabled());
    }

    #[test]
    fn test_tap_does_not_move_drawer() {
        let mut d = drawer();
        d.touch_down(0, Point::new(100.0, 760.0), ms(0));
        d.touch_motion(0, Point::new(102.0, 763.0), ms(10));
        d.touch_up(0, ms(20));
        assert_eq!(d.frame().top_offset, 680.0);
        assert!(!d.container().is_animating());
        assert!(!d.list().is_tracking());
    }

    #[test]
    fn test_scrolled_list_owns_upward_drag_then_hands_off() {
        let mut d = full_height_drawer();
        d.list_mut().set_content_offset_y(100.0);

        d.touch_down(0, Point::new(100.0, 400.0), ms(0));
        d.touch_motion(0, Point::new(100.0, 380.0), ms(16));
        assert!(!d.controller().should_handle_gesture());

        // Drag up scrolls the list, the drawer stays put
        d.touch_motion(0, Point::new(100.0, 300.0), ms(32));
        assert_eq!(d.list().content_offset_y(), 180.0);
        assert_eq!(d.frame().top_offset, 35.0);

        // Back down: the list reaches its top and the drawer takes over
        d.touch_motion(0, Point::new(100.0, 400.0), ms(48));
        assert_eq!(d.list().content_offset_y(), 80.0);
        d.touch_motion(0, Point::new(100.0, 500.0), ms(64));
        assert_eq!(d.list().content_offset_y(), 0.0);
        assert!(d.controller().should_handle_gesture());
        assert_eq!(d.frame().top_offset, 35.0);

        d.touch_motion(0, Point::new(100.0, 600.0), ms(80));
        assert_eq!(d.list().content_offset_y(), 0.0);
        assert_eq!(d.frame().top_offset, 135.0);
    }

    #[test]
    fn test_drag_down_at_list_top_takes_over() {
        let mut d = full_height_drawer();
        d.touch_down(0, Point::new(100.0, 400.0), ms(0));
        d.touch_motion(0, Point::new(100.0, 420.0), ms(16));
        assert!(d.controller().should_handle_gesture());
        assert!(!d.list().is_pan_enabled());

        d.touch_motion(0, Point::new(100.0, 520.0), ms(32));
        assert_eq!(d.frame().top_offset, 35.0 + 120.0);
        assert_eq!(d.list().content_offset_y(), 0.0);
    }

    #[test]
    fn test_cancel_settles_without_velocity() {
        let mut d = drawer();
        d.touch_down(0, Point::new(100.0, 760.0), ms(0));
        d.touch_motion(0, Point::new(100.0, 740.0), ms(16));
        d.touch_motion(0, Point::new(100.0, 660.0), ms(32));
        assert_eq!(d.frame().top_offset, 580.0);

        d.touch_cancel();
        assert_eq!(d.expansion_state(), ExpansionState::Expanded);
        assert!(d.frame().content_interaction_enabled);
        settle(&mut d);
        assert_eq!(d.frame().top_offset, 500.0);
    }

    #[test]
    fn test_drag_during_settle_continues_from_drawn_offset() {
        let mut d = drawer();
        d.search_did_begin_editing();
        for _ in 0..5 {
            d.tick(FRAME);
        }
        let drawn = d.frame().top_offset;
        assert!(drawn < 680.0 && drawn > 35.0);

        let y = drawn + 100.0;
        d.touch_down(0, Point::new(100.0, y), ms(0));
        d.touch_motion(0, Point::new(100.0, y + 20.0), ms(16));
        d.touch_motion(0, Point::new(100.0, y + 30.0), ms(32));
        assert!(!d.container().is_animating());
        assert_eq!(d.frame().top_offset, drawn + 30.0);
    }

    #[test]
    fn test_resize_snaps_resting_drawer() {
        let mut d = full_height_drawer();
        d.set_container_bounds(Size::new(800.0, 390.0));
        assert_eq!(d.frame().top_offset, 35.0);
        assert_eq!(d.container().rest_offsets().compressed, 270.0);
        assert!(d.list().max_offset() > 0.0);
    }

    #[test]
    fn test_search_focus_from_expanded() {
        let mut d = drawer();
        d.touch_down(0, Point::new(100.0, 700.0), ms(0));
        d.touch_motion(0, Point::new(100.0, 680.0), ms(16));
        d.touch_motion(0, Point::new(100.0, 600.0), ms(50));
        d.touch_motion(0, Point::new(100.0, 600.0), ms(300));
        d.touch_up(0, ms(310));
        assert_eq!(d.expansion_state(), ExpansionState::Expanded);
        settle(&mut d);

        d.search_did_begin_editing();
        assert_eq!(d.expansion_state(), ExpansionState::FullHeight);
        settle(&mut d);
        assert_eq!(d.frame().top_offset, 35.0);
    }

    #[test]
    fn test_tap_selects_row_under_finger() {
        let mut d = full_height_drawer();
        d.list_mut().set_content_offset_y(30.0);

        // List starts at 35 + 56 = 91; 91 + 100 - 30 offset = row 2
        let y = 91.0 + 100.0;
        assert!(d.touch_down(0, Point::new(100.0, y), ms(0)));
        d.touch_motion(0, Point::new(101.0, y + 2.0), ms(30));
        let selection = d.touch_up(0, ms(60)).unwrap();
        assert_eq!(selection.index, 2);
        assert_eq!(selection.row.title, "Get Name");
        assert_eq!(d.last_selection(), Some(&selection));
        assert_eq!(d.frame().top_offset, 35.0);
    }

    #[test]
    fn test_header_tap_selects_nothing() {
        let mut d = full_height_drawer();
        d.touch_down(0, Point::new(100.0, 50.0), ms(0));
        assert_eq!(d.touch_up(0, ms(40)), None);
        assert_eq!(d.last_selection(), None);
    }

    #[test]
    fn test_drag_selects_nothing() {
        let mut d = full_height_drawer();
        d.touch_down(0, Point::new(100.0, 300.0), ms(0));
        d.touch_motion(0, Point::new(100.0, 320.0), ms(16));
        d.touch_motion(0, Point::new(100.0, 360.0), ms(32));

        // Second finger tapping a row mid-drag is not tracked
        assert!(!d.touch_down(1, Point::new(100.0, 500.0), ms(40)));
        assert_eq!(d.touch_up(1, ms(60)), None);

        assert_eq!(d.touch_up(0, ms(80)), None);
        assert_eq!(d.last_selection(), None);
    }

    #[test]
    fn test_tap_during_settle_selects_nothing() {
        let mut d = drawer();
        d.search_did_begin_editing();
        d.tick(FRAME);
        assert!(d.container().is_animating());

        let y = d.frame().top_offset + 56.0 + 10.0;
        d.touch_down(0, Point::new(100.0, y), ms(0));
        assert_eq!(d.touch_up(0, ms(40)), None);

        settle(&mut d);
        d.touch_down(0, Point::new(100.0, 91.0 + 10.0), ms(1000));
        assert_eq!(d.touch_up(0, ms(1040)).map(|s| s.index), Some(0));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = DrawerConfig {
            damping_ratio: 0.0,
            ..DrawerConfig::default()
        };
        assert!(Drawer::new(config, Size::new(390.0, 800.0), ShortcutList::with_sample_rows(3)).is_err());
    }
}
