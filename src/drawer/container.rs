//! Container translator - positions the drawer inside its container
//!
//! Owns the drawer's top offset (distance from the container's top edge to
//! the drawer's top edge) and the dim overlay behind it. While a drag is
//! running the offset follows the finger; on release the settle algorithm
//! picks a rest state and a spring carries the offset there.
//!
//! Every settle animation gets a generation number. Starting a drag or a new
//! settle bumps the generation, so a superseded animation can never commit.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::animation::{SpringAnimation, SpringSpec};
use crate::config::DrawerConfig;
use crate::drawer::controller::{DrawerListener, ExpansionStateSink};
use crate::drawer::{ExpansionState, RestOffsets};
use crate::geometry::{Point, Size};

/// One drag, from the first forwarded move to release
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslationSession {
    /// Committed offset the drag started from
    pub previous_top_offset: f64,
    /// Last offset applied during the drag
    pub live_offset: f64,
}

/// Result of one settle decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Settle {
    /// Rest state the drag started from, if it started at rest
    pub from_state: Option<ExpansionState>,
    pub target: ExpansionState,
    pub from_offset: f64,
    pub target_offset: f64,
    pub release_velocity_y: f64,
    pub spring_velocity: f64,
    pub generation: u64,
}

#[derive(Debug, Clone)]
struct SettleAnimation {
    generation: u64,
    spring: SpringAnimation,
}

/// Pick the rest state for a released drag
///
/// `previous` is the offset the drag started from, `live` the offset at
/// release. Fast downward flicks branch on where the drag started; slow
/// releases go by position only.
pub fn settle_target(
    offsets: &RestOffsets,
    previous: f64,
    live: f64,
    velocity_y: f64,
    padding: f64,
    velocity_threshold: f64,
) -> ExpansionState {
    let past_expanded = live <= offsets.expanded - padding;

    if velocity_y > velocity_threshold {
        match offsets.state_at(previous) {
            Some(ExpansionState::FullHeight) => {
                if past_expanded {
                    ExpansionState::Expanded
                } else {
                    ExpansionState::Compressed
                }
            }
            // From expanded, compressed, or mid-flight
            _ => {
                if past_expanded {
                    ExpansionState::FullHeight
                } else {
                    ExpansionState::Compressed
                }
            }
        }
    } else if past_expanded {
        ExpansionState::FullHeight
    } else if live < offsets.compressed - padding {
        ExpansionState::Expanded
    } else {
        ExpansionState::Compressed
    }
}

/// Initial spring velocity for a settle covering `distance` after a release
/// at `velocity_y`
///
/// `1 / |velocity_y / distance|`, bounded to `[floor, ceiling]`. A zero
/// distance uses the floor and a zero velocity the ceiling, so the result is
/// always finite.
pub fn spring_velocity(velocity_y: f64, distance: f64, floor: f64, ceiling: f64) -> f64 {
    if distance == 0.0 || !distance.is_finite() {
        return floor;
    }
    let ratio = (velocity_y / distance).abs();
    let velocity = 1.0 / ratio;
    if !velocity.is_finite() {
        return ceiling;
    }
    velocity.clamp(floor, ceiling)
}

/// Drawer positioning state
#[derive(Debug, Clone)]
pub struct ContainerTranslator {
    config: DrawerConfig,
    container: Size,
    top_offset: f64,
    previous_top_offset: f64,
    overlay_alpha: f64,
    session: Option<TranslationSession>,
    animation: Option<SettleAnimation>,
    generation: u64,
    last_settle: Option<Settle>,
}

impl ContainerTranslator {
    /// Place the drawer at its compressed offset
    pub fn new(config: DrawerConfig, container: Size) -> Self {
        let compressed = ExpansionState::Compressed.top_offset_with(&config.heights, container);
        let mut translator = Self {
            config,
            container,
            top_offset: compressed,
            previous_top_offset: compressed,
            overlay_alpha: 0.0,
            session: None,
            animation: None,
            generation: 0,
            last_settle: None,
        };
        translator.update_overlay(compressed);
        translator
    }

    pub fn config(&self) -> &DrawerConfig {
        &self.config
    }

    pub fn container(&self) -> Size {
        self.container
    }

    /// New container bounds; offsets are derived from them on next use
    pub fn set_container_bounds(&mut self, container: Size) {
        debug!(w = container.w, h = container.h, "Drawer container resized");
        self.container = container;
    }

    /// Rest offsets for the current bounds
    pub fn rest_offsets(&self) -> RestOffsets {
        RestOffsets::new(&self.config.heights, self.container)
    }

    /// Offset the drawer is drawn at
    pub fn top_offset(&self) -> f64 {
        self.top_offset
    }

    /// Committed baseline the next drag starts from
    pub fn previous_top_offset(&self) -> f64 {
        self.previous_top_offset
    }

    pub fn overlay_alpha(&self) -> f64 {
        self.overlay_alpha
    }

    pub fn session(&self) -> Option<&TranslationSession> {
        self.session.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Generation of the newest settle animation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_settle(&self) -> Option<&Settle> {
        self.last_settle.as_ref()
    }

    /// Dim overlay alpha for the drawer at `offset`
    ///
    /// Grows from 0 at the expanded offset toward full height, capped at
    /// `overlay_max_alpha`.
    pub fn overlay_alpha_for(&self, offset: f64) -> f64 {
        let offsets = self.rest_offsets();
        let max_alpha = self.config.overlay_max_alpha;
        let total = offsets.expanded - offsets.full_height;
        let current = offsets.expanded - offset;

        let progress = if total.abs() < f64::EPSILON {
            // Expanded and full height coincide
            if current > 0.0 {
                max_alpha
            } else {
                0.0
            }
        } else {
            current / total
        };
        progress.max(0.0).min(max_alpha)
    }

    fn update_overlay(&mut self, offset: f64) {
        self.overlay_alpha = self.overlay_alpha_for(offset);
    }

    fn begin_session(&mut self) -> TranslationSession {
        if let Some(animation) = self.animation.take() {
            // Continue from where the drawer is drawn, not the old target
            self.generation += 1;
            self.previous_top_offset = self.top_offset;
            debug!(
                superseded = animation.generation,
                offset = self.top_offset,
                "Drag interrupted settle animation"
            );
        }
        let session = TranslationSession {
            previous_top_offset: self.previous_top_offset,
            live_offset: self.top_offset,
        };
        self.session = Some(session);
        session
    }

    /// Follow the finger
    ///
    /// Offsets above `full height offset - padding / 2` are refused; the
    /// drawer keeps its last applied offset.
    pub fn translate(&mut self, translation: Point) -> bool {
        let session = match self.session {
            Some(session) => session,
            None => self.begin_session(),
        };
        let candidate = session.previous_top_offset + translation.y;
        let ceiling = self.rest_offsets().full_height - self.config.constraint_padding / 2.0;

        if candidate < ceiling {
            trace!(candidate, ceiling, "Drag past full height refused");
            return false;
        }
        self.top_offset = candidate;
        if let Some(session) = self.session.as_mut() {
            session.live_offset = candidate;
        }
        self.update_overlay(candidate);
        true
    }

    /// Run the settle algorithm for a released drag
    pub fn settle(&mut self, drawer: &mut dyn ExpansionStateSink, velocity: Point) -> Settle {
        self.session = None;
        let offsets = self.rest_offsets();
        let target = settle_target(
            &offsets,
            self.previous_top_offset,
            self.top_offset,
            velocity.y,
            self.config.constraint_padding,
            self.config.velocity_threshold,
        );
        drawer.set_expansion_state(target);
        self.animate_to(target, velocity)
    }

    /// Spring the drawer to `state`'s rest offset
    pub fn animate_to(&mut self, state: ExpansionState, velocity: Point) -> Settle {
        let offsets = self.rest_offsets();
        let from_state = offsets.state_at(self.previous_top_offset);
        let from_offset = self.top_offset;
        let target_offset = offsets.for_state(state);
        let initial_velocity = spring_velocity(
            velocity.y,
            from_offset - target_offset,
            self.config.min_spring_velocity,
            self.config.max_spring_velocity,
        );

        self.generation += 1;
        let spec = SpringSpec {
            duration: self.config.settle_duration(),
            damping_ratio: self.config.damping_ratio,
            initial_velocity,
        };
        self.animation = Some(SettleAnimation {
            generation: self.generation,
            spring: SpringAnimation::new(from_offset, target_offset, spec),
        });
        // The baseline moves to the target right away
        self.previous_top_offset = target_offset;

        let settle = Settle {
            from_state,
            target: state,
            from_offset,
            target_offset,
            release_velocity_y: velocity.y,
            spring_velocity: initial_velocity,
            generation: self.generation,
        };
        info!(
            from = ?from_state,
            to = ?state,
            from_offset,
            target_offset,
            velocity_y = velocity.y,
            spring_velocity = initial_velocity,
            "Drawer settling"
        );
        self.last_settle = Some(settle);
        settle
    }

    /// Jump to `state`'s rest offset without animating
    ///
    /// Used after the container bounds change under a resting drawer.
    pub fn snap_to(&mut self, state: ExpansionState) {
        if self.animation.take().is_some() {
            self.generation += 1;
        }
        let offset = self.rest_offsets().for_state(state);
        self.top_offset = offset;
        self.previous_top_offset = offset;
        self.update_overlay(offset);
    }

    /// Advance the settle animation. Returns true while it is running.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let Some(animation) = self.animation.as_mut() else {
            return false;
        };
        let offset = animation.spring.tick(dt);
        let finished = animation.spring.is_finished();
        let generation = animation.generation;

        self.top_offset = offset;
        self.update_overlay(offset);
        trace!(offset, overlay = self.overlay_alpha, "Settle frame");

        if finished {
            self.complete_animation(generation);
            return false;
        }
        true
    }

    /// Completion of the settle animation with `generation`
    ///
    /// Commits the target offset if that animation is still current. A
    /// superseded generation is ignored. Returns whether anything was
    /// committed.
    pub fn complete_animation(&mut self, generation: u64) -> bool {
        match self.animation.as_ref() {
            Some(animation) if animation.generation == generation => {
                let target = animation.spring.target();
                self.animation = None;
                self.top_offset = target;
                self.update_overlay(target);
                debug!(generation, offset = target, "Settle complete");
                true
            }
            _ => {
                trace!(generation, current = self.generation, "Stale settle completion ignored");
                false
            }
        }
    }
}

impl DrawerListener for ContainerTranslator {
    fn drawer_did_change_translation(
        &mut self,
        drawer: &mut dyn ExpansionStateSink,
        translation: Point,
        _velocity: Point,
    ) {
        // No taps on rows while the drawer is moving
        drawer.set_content_interaction_enabled(false);
        self.translate(translation);
    }

    fn drawer_did_end_translation(
        &mut self,
        drawer: &mut dyn ExpansionStateSink,
        _translation: Point,
        velocity: Point,
    ) {
        drawer.set_content_interaction_enabled(true);
        self.settle(drawer, velocity);
    }

    fn drawer_did_request_expansion_state(
        &mut self,
        drawer: &mut dyn ExpansionStateSink,
        state: ExpansionState,
    ) {
        drawer.set_expansion_state(state);
        let velocity = Point::new(0.0, self.config.search_focus_velocity);
        self.animate_to(state, velocity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Minimal drawer stand-in recording what the translator asks for
    struct FakeDrawer {
        state: ExpansionState,
        interaction: bool,
        state_changes: Vec<ExpansionState>,
    }

    impl FakeDrawer {
        fn new(state: ExpansionState) -> Self {
            Self {
                state,
                interaction: true,
                state_changes: Vec::new(),
            }
        }
    }

    impl ExpansionStateSink for FakeDrawer {
        fn expansion_state(&self) -> ExpansionState {
            self.state
        }

        fn set_expansion_state(&mut self, state: ExpansionState) {
            if state != self.state {
                self.state = state;
                self.state_changes.push(state);
            }
        }

        fn set_content_interaction_enabled(&mut self, enabled: bool) {
            self.interaction = enabled;
        }
    }

    const FRAME: Duration = Duration::from_millis(16);

    fn translator() -> ContainerTranslator {
        ContainerTranslator::new(DrawerConfig::default(), Size::new(390.0, 800.0))
    }

    /// Translator resting at `state`
    fn resting_at(state: ExpansionState) -> ContainerTranslator {
        let mut t = translator();
        let mut drawer = FakeDrawer::new(ExpansionState::Compressed);
        if state != ExpansionState::Compressed {
            t.animate_to(state, Point::new(0.0, -500.0));
            while t.tick(FRAME) {}
        }
        drawer.set_expansion_state(state);
        t
    }

    /// Drag from rest to `live` then release at `velocity_y`
    fn release(start: ExpansionState, live: f64, velocity_y: f64) -> (ExpansionState, ContainerTranslator) {
        let mut t = resting_at(start);
        let mut drawer = FakeDrawer::new(start);
        let translation = Point::new(0.0, live - t.previous_top_offset());
        let velocity = Point::new(0.0, velocity_y);
        t.drawer_did_change_translation(&mut drawer, translation, velocity);
        assert_eq!(t.top_offset(), live);
        assert!(!drawer.interaction);
        t.drawer_did_end_translation(&mut drawer, translation, velocity);
        assert!(drawer.interaction);
        (drawer.state, t)
    }

    #[test]
    fn test_initial_offset_is_compressed() {
        let t = translator();
        assert_eq!(t.top_offset(), 680.0);
        assert_eq!(t.previous_top_offset(), 680.0);
        assert_eq!(t.overlay_alpha(), 0.0);
    }

    #[test]
    fn test_slow_release_from_compressed() {
        assert_eq!(release(ExpansionState::Compressed, 400.0, 10.0).0, ExpansionState::FullHeight);
        assert_eq!(release(ExpansionState::Compressed, 600.0, 10.0).0, ExpansionState::Expanded);
        assert_eq!(release(ExpansionState::Compressed, 650.0, 10.0).0, ExpansionState::Compressed);
    }

    #[test]
    fn test_fast_release_from_full_height() {
        assert_eq!(release(ExpansionState::FullHeight, 460.0, 80.0).0, ExpansionState::Compressed);
        assert_eq!(release(ExpansionState::FullHeight, 430.0, 80.0).0, ExpansionState::Expanded);
    }

    #[test]
    fn test_fast_release_from_expanded() {
        assert_eq!(release(ExpansionState::Expanded, 440.0, 300.0).0, ExpansionState::FullHeight);
        assert_eq!(release(ExpansionState::Expanded, 560.0, 300.0).0, ExpansionState::Compressed);
    }

    #[test]
    fn test_fast_flick_down_from_compressed_stays() {
        assert_eq!(release(ExpansionState::Compressed, 700.0, 900.0).0, ExpansionState::Compressed);
    }

    #[test]
    fn test_settle_target_table() {
        let offsets = RestOffsets::new(&DrawerConfig::default().heights, Size::new(390.0, 800.0));
        // Slow, boundaries inclusive at expanded - padding, exclusive at compressed - padding
        assert_eq!(settle_target(&offsets, 680.0, 450.0, 50.0, 50.0, 50.0), ExpansionState::FullHeight);
        assert_eq!(settle_target(&offsets, 680.0, 629.0, 0.0, 50.0, 50.0), ExpansionState::Expanded);
        assert_eq!(settle_target(&offsets, 680.0, 630.0, -400.0, 50.0, 50.0), ExpansionState::Compressed);
        // Velocity exactly at the threshold takes the slow path
        assert_eq!(settle_target(&offsets, 35.0, 600.0, 50.0, 50.0, 50.0), ExpansionState::Expanded);
        assert_eq!(settle_target(&offsets, 35.0, 600.0, 50.1, 50.0, 50.0), ExpansionState::Compressed);
        // Unmatched start offset behaves like compressed
        assert_eq!(settle_target(&offsets, 321.5, 440.0, 200.0, 50.0, 50.0), ExpansionState::FullHeight);
    }

    #[test]
    fn test_settle_animates_to_target() {
        let (state, mut t) = release(ExpansionState::Compressed, 400.0, 10.0);
        assert_eq!(state, ExpansionState::FullHeight);
        assert_eq!(t.previous_top_offset(), 35.0);
        assert!(t.is_animating());

        let mut frames = 0;
        while t.tick(FRAME) {
            frames += 1;
            assert!(t.overlay_alpha() >= 0.0 && t.overlay_alpha() <= 0.4);
        }
        assert!(frames > 20, "settle should take about half a second");
        assert_eq!(t.top_offset(), 35.0);
        assert!((t.overlay_alpha() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_drag_clamped_near_full_height() {
        let mut t = resting_at(ExpansionState::FullHeight);
        let mut drawer = FakeDrawer::new(ExpansionState::FullHeight);
        let before = t.top_offset();

        // 35 - 30 = 5 < 35 - 25
        t.drawer_did_change_translation(&mut drawer, Point::new(0.0, -30.0), Point::ZERO);
        assert_eq!(t.top_offset(), before);

        // 35 - 25 = 10 is allowed
        t.drawer_did_change_translation(&mut drawer, Point::new(0.0, -25.0), Point::ZERO);
        assert_eq!(t.top_offset(), 10.0);

        t.drawer_did_change_translation(&mut drawer, Point::new(0.0, -200.0), Point::ZERO);
        assert_eq!(t.top_offset(), 10.0);
    }

    #[test]
    fn test_overlay_alpha_shape() {
        let t = translator();
        assert_eq!(t.overlay_alpha_for(500.0), 0.0);
        assert_eq!(t.overlay_alpha_for(680.0), 0.0);
        assert!((t.overlay_alpha_for(500.0 - 46.5) - 0.1).abs() < 1e-9);
        assert_eq!(t.overlay_alpha_for(35.0), 0.4);
        assert_eq!(t.overlay_alpha_for(-100.0), 0.4);
    }

    #[test]
    fn test_overlay_degenerate_container() {
        // 335 tall: expanded and full height offsets coincide at 35
        let t = ContainerTranslator::new(DrawerConfig::default(), Size::new(390.0, 335.0));
        assert_eq!(t.overlay_alpha_for(35.0), 0.0);
        assert_eq!(t.overlay_alpha_for(20.0), 0.4);
        assert_eq!(t.overlay_alpha_for(200.0), 0.0);
    }

    #[test]
    fn test_spring_velocity() {
        // 1 / |v / d| = |d / v|
        assert!((spring_velocity(-200.0, 400.0, 0.08, 20.0) - 2.0).abs() < 1e-12);
        assert_eq!(spring_velocity(-4536.0, 100.0, 0.08, 20.0), 0.08);
        assert_eq!(spring_velocity(0.0, 400.0, 0.08, 20.0), 20.0);
        assert_eq!(spring_velocity(300.0, 0.0, 0.08, 20.0), 0.08);
        assert_eq!(spring_velocity(0.0, 0.0, 0.08, 20.0), 0.08);
        assert_eq!(spring_velocity(1e-320, 400.0, 0.08, 20.0), 20.0);
    }

    #[test]
    fn test_stale_completion_is_noop() {
        let mut t = translator();
        let mut drawer = FakeDrawer::new(ExpansionState::Compressed);
        let first = t.animate_to(ExpansionState::FullHeight, Point::new(0.0, -900.0));
        t.tick(FRAME);
        t.tick(FRAME);

        // New drag supersedes the settle and continues from the drawn offset
        let drawn = t.top_offset();
        t.drawer_did_change_translation(&mut drawer, Point::new(0.0, 20.0), Point::ZERO);
        assert!(!t.is_animating());
        assert_eq!(t.top_offset(), drawn + 20.0);
        assert!(!t.complete_animation(first.generation));
        assert_eq!(t.top_offset(), drawn + 20.0);

        // Newer settle still completes normally
        t.drawer_did_end_translation(&mut drawer, Point::new(0.0, 20.0), Point::ZERO);
        let current = t.generation();
        assert!(!t.complete_animation(current - 1));
        assert!(t.complete_animation(current));
        assert!(!t.is_animating());
    }

    #[test]
    fn test_search_focus_goes_full_height() {
        let mut t = translator();
        let mut drawer = FakeDrawer::new(ExpansionState::Compressed);
        t.drawer_did_request_expansion_state(&mut drawer, ExpansionState::FullHeight);
        assert_eq!(drawer.state, ExpansionState::FullHeight);
        let settle = *t.last_settle().unwrap();
        assert_eq!(settle.target_offset, 35.0);
        assert_eq!(settle.release_velocity_y, -4536.0);
        assert!((settle.spring_velocity - 645.0 / 4536.0).abs() < 1e-12);
        while t.tick(FRAME) {}
        assert_eq!(t.top_offset(), 35.0);
    }

    #[test]
    fn test_bounds_change_recomputes_offsets() {
        let mut t = translator();
        assert_eq!(t.rest_offsets().full_height, 35.0);
        t.set_container_bounds(Size::new(800.0, 390.0));
        let offsets = t.rest_offsets();
        assert_eq!(offsets.compressed, 270.0);
        assert_eq!(offsets.expanded, 90.0);
        assert_eq!(offsets.full_height, 35.0);
    }

    proptest! {
        #[test]
        fn test_overlay_monotonic_and_bounded(a in 35.0f64..=500.0, b in 35.0f64..=500.0) {
            let t = translator();
            let (high, low) = if a >= b { (a, b) } else { (b, a) };
            let alpha_high = t.overlay_alpha_for(high);
            let alpha_low = t.overlay_alpha_for(low);
            prop_assert!(alpha_low >= alpha_high);
            prop_assert!((0.0..=0.4).contains(&alpha_low));
            prop_assert!((0.0..=0.4).contains(&alpha_high));
        }

        #[test]
        fn test_refused_candidates_never_commit(start in 35.0f64..680.0, dy in -2000.0f64..2000.0) {
            let mut t = translator();
            let mut drawer = FakeDrawer::new(ExpansionState::Compressed);
            t.drawer_did_change_translation(&mut drawer, Point::new(0.0, start - 680.0), Point::ZERO);
            let before = t.top_offset();
            t.drawer_did_change_translation(&mut drawer, Point::new(0.0, dy), Point::ZERO);
            let candidate = 680.0 + dy;
            if candidate < 35.0 - 25.0 {
                prop_assert_eq!(t.top_offset(), before);
            } else {
                prop_assert_eq!(t.top_offset(), candidate);
            }
        }

        #[test]
        fn test_spring_velocity_always_bounded(v in proptest::num::f64::ANY, d in proptest::num::f64::ANY) {
            let s = spring_velocity(v, d, 0.08, 20.0);
            prop_assert!(s.is_finite());
            prop_assert!((0.08..=20.0).contains(&s));
        }
    }
}
