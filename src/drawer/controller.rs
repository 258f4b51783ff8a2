//! Drawer controller - owns the expansion state and the move-handling flag
//!
//! The controller sits between the pan recognizer and whoever positions the
//! drawer (normally `ContainerTranslator`). It forwards drag updates to its
//! listener while it is handling moves, and runs the per-state side effects
//! (header title fade, list pan enable) whenever its state changes.

use std::time::Duration;

use tracing::{info, trace};

use crate::animation::Fade;
use crate::config::DrawerConfig;
use crate::drawer::ExpansionState;
use crate::geometry::Point;
use crate::input::{DragPhase, DragSample, ScrollRegion};

/// Receives drag updates from a `DrawerController`
///
/// Every callback gets a handle back to the drawer so the listener can
/// change its state in response.
pub trait DrawerListener {
    /// The drawer was dragged
    fn drawer_did_change_translation(
        &mut self,
        drawer: &mut dyn ExpansionStateSink,
        translation: Point,
        velocity: Point,
    );

    /// The finger lifted after a drag
    fn drawer_did_end_translation(
        &mut self,
        drawer: &mut dyn ExpansionStateSink,
        translation: Point,
        velocity: Point,
    );

    /// The drawer asked to move to a state on its own (search field focus)
    fn drawer_did_request_expansion_state(
        &mut self,
        drawer: &mut dyn ExpansionStateSink,
        state: ExpansionState,
    );
}

/// The part of the drawer a listener may change
pub trait ExpansionStateSink {
    fn expansion_state(&self) -> ExpansionState;

    fn set_expansion_state(&mut self, state: ExpansionState);

    /// Enable or disable taps on the drawer content (rows, search field)
    fn set_content_interaction_enabled(&mut self, enabled: bool);
}

/// Borrowed controller plus its list, handed to listeners
pub struct DrawerHandle<'a> {
    pub controller: &'a mut DrawerController,
    pub region: &'a mut dyn ScrollRegion,
}

impl ExpansionStateSink for DrawerHandle<'_> {
    fn expansion_state(&self) -> ExpansionState {
        self.controller.expansion_state()
    }

    fn set_expansion_state(&mut self, state: ExpansionState) {
        self.controller.set_expansion_state(state, self.region);
    }

    fn set_content_interaction_enabled(&mut self, enabled: bool) {
        self.controller.set_content_interaction_enabled(enabled);
    }
}

/// Header title opacity and its running fade
#[derive(Debug, Clone)]
pub struct HeaderTitle {
    alpha: f64,
    fade: Option<Fade>,
    fades_scheduled: u32,
}

impl HeaderTitle {
    fn new() -> Self {
        Self {
            alpha: 1.0,
            fade: None,
            fades_scheduled: 0,
        }
    }

    fn fade_to(&mut self, alpha: f64, duration: Duration) {
        self.fade = Some(Fade::new(self.alpha, alpha, duration));
        self.fades_scheduled += 1;
    }

    fn tick(&mut self, dt: Duration) -> bool {
        let Some(fade) = self.fade.as_mut() else {
            return false;
        };
        self.alpha = fade.tick(dt);
        if fade.is_finished() {
            self.fade = None;
        }
        true
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Alpha the title is heading to
    pub fn target_alpha(&self) -> f64 {
        self.fade.as_ref().map_or(self.alpha, Fade::target)
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Number of fades started so far
    pub fn fades_scheduled(&self) -> u32 {
        self.fades_scheduled
    }
}

/// Drawer controller state
#[derive(Debug, Clone)]
pub struct DrawerController {
    expansion_state: ExpansionState,
    /// Whether drag moves are forwarded to the listener
    should_handle_gesture: bool,
    content_interaction_enabled: bool,
    header: HeaderTitle,
    header_fade: Duration,
}

impl DrawerController {
    pub fn new(config: &DrawerConfig) -> Self {
        Self {
            expansion_state: ExpansionState::Compressed,
            should_handle_gesture: true,
            content_interaction_enabled: true,
            header: HeaderTitle::new(),
            header_fade: config.header_fade(),
        }
    }

    /// Apply the initial state's side effects
    pub fn load(&mut self, region: &mut dyn ScrollRegion) {
        self.configure(region);
    }

    pub fn expansion_state(&self) -> ExpansionState {
        self.expansion_state
    }

    /// Change state, running the entry side effects once. Setting the
    /// current state again does nothing.
    pub fn set_expansion_state(&mut self, state: ExpansionState, region: &mut dyn ScrollRegion) {
        if state == self.expansion_state {
            return;
        }
        info!(from = ?self.expansion_state, to = ?state, "Drawer expansion state changed");
        self.expansion_state = state;
        self.configure(region);
    }

    fn configure(&mut self, region: &mut dyn ScrollRegion) {
        match self.expansion_state {
            ExpansionState::Compressed => {
                self.header.fade_to(0.0, self.header_fade);
                region.set_pan_enabled(false);
            }
            ExpansionState::Expanded => {
                self.header.fade_to(1.0, self.header_fade);
                region.set_pan_enabled(false);
            }
            ExpansionState::FullHeight => {
                self.header.fade_to(1.0, self.header_fade);
                // Drag moves only pass through while the list sits at its top
                self.should_handle_gesture = region.content_offset_y() <= 0.0;
                region.set_pan_enabled(true);
            }
        }
    }

    pub fn should_handle_gesture(&self) -> bool {
        self.should_handle_gesture
    }

    pub fn set_should_handle_gesture(&mut self, handle: bool) {
        self.should_handle_gesture = handle;
    }

    pub fn content_interaction_enabled(&self) -> bool {
        self.content_interaction_enabled
    }

    pub fn set_content_interaction_enabled(&mut self, enabled: bool) {
        self.content_interaction_enabled = enabled;
    }

    pub fn header(&self) -> &HeaderTitle {
        &self.header
    }

    /// Advance the header fade. Returns true while it is still running.
    pub fn tick(&mut self, dt: Duration) -> bool {
        self.header.tick(dt)
    }

    /// Forward a pan update to the listener
    ///
    /// `Began` is ignored; `Changed` and `Ended` are dropped while the
    /// controller is not handling moves or when nobody listens.
    pub fn handle_pan(
        &mut self,
        sample: &DragSample,
        region: &mut dyn ScrollRegion,
        listener: Option<&mut dyn DrawerListener>,
    ) {
        if !self.should_handle_gesture {
            return;
        }
        let Some(listener) = listener else {
            trace!(phase = ?sample.phase, "No drawer listener, pan dropped");
            return;
        };

        let mut handle = DrawerHandle {
            controller: self,
            region,
        };
        match sample.phase {
            DragPhase::Changed => {
                listener.drawer_did_change_translation(&mut handle, sample.translation, sample.velocity)
            }
            DragPhase::Ended => {
                listener.drawer_did_end_translation(&mut handle, sample.translation, sample.velocity)
            }
            DragPhase::Began => {}
        }
    }

    /// The search field started editing
    pub fn search_did_begin_editing(
        &mut self,
        region: &mut dyn ScrollRegion,
        listener: Option<&mut dyn DrawerListener>,
    ) {
        let Some(listener) = listener else {
            trace!("No drawer listener, search focus dropped");
            return;
        };
        let mut handle = DrawerHandle {
            controller: self,
            region,
        };
        listener.drawer_did_request_expansion_state(&mut handle, ExpansionState::FullHeight);
    }
}
