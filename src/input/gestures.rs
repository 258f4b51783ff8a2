//! Single-slot pan recognition for the drawer
//!
//! Tracks the first touch slot that lands on the drawer and turns its
//! motion into `DragSample`s: translation from the touch origin plus a
//! velocity measured over a short sliding window of samples. Additional
//! slots are ignored while a touch is active.

use std::collections::VecDeque;
use std::time::Duration;

use crate::geometry::Point;

/// Phase of a pan gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    /// Touch moved past the slop and became a drag
    Began,
    /// Drag moved
    Changed,
    /// Finger lifted after a drag
    Ended,
}

/// One pan update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSample {
    /// Offset of the finger from the translation origin
    pub translation: Point,
    /// Finger velocity in px/s
    pub velocity: Point,
    pub phase: DragPhase,
}

/// Touch point tracking
#[derive(Debug, Clone)]
pub struct TouchPoint {
    pub id: i32,
    pub start_pos: Point,
    pub current_pos: Point,
    /// Position translation is measured from
    pub origin: Point,
    pub last_time: Duration,
    pub velocity: Point,
    samples: VecDeque<(Point, Duration)>,
}

impl TouchPoint {
    pub fn new(id: i32, pos: Point, time: Duration) -> Self {
        let mut samples = VecDeque::new();
        samples.push_back((pos, time));
        Self {
            id,
            start_pos: pos,
            current_pos: pos,
            origin: pos,
            last_time: time,
            velocity: Point::ZERO,
            samples,
        }
    }

    pub fn update(&mut self, pos: Point, time: Duration, window: Duration) {
        self.current_pos = pos;
        self.last_time = time;
        self.samples.push_back((pos, time));

        // Keep only samples inside the velocity window
        while let Some(&(_, t)) = self.samples.front() {
            if time.saturating_sub(t) > window {
                self.samples.pop_front();
            } else {
                break;
            }
        }

        self.velocity = match (self.samples.front(), self.samples.back()) {
            (Some(&(first_pos, first_t)), Some(&(last_pos, last_t))) => {
                let dt = last_t.saturating_sub(first_t).as_secs_f64();
                if dt > 0.001 {
                    Point::new(
                        (last_pos.x - first_pos.x) / dt,
                        (last_pos.y - first_pos.y) / dt,
                    )
                } else if self.samples.len() == 1 {
                    // Finger rested longer than the window
                    Point::ZERO
                } else {
                    self.velocity
                }
            }
            _ => Point::ZERO,
        };
    }

    pub fn translation(&self) -> Point {
        self.current_pos - self.origin
    }

    pub fn distance(&self) -> f64 {
        let d = self.current_pos - self.start_pos;
        (d.x * d.x + d.y * d.y).sqrt()
    }
}

/// Pan recognizer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanState {
    /// No touch
    Idle,
    /// Touch down, still inside the slop
    Possible,
    /// Dragging
    Panning,
}

/// Pan gesture recognizer tracking a single touch slot
#[derive(Debug, Clone)]
pub struct PanRecognizer {
    /// Movement before the touch counts as a drag
    pub touch_slop: f64,
    /// Sliding window for velocity estimation
    pub velocity_window: Duration,
    point: Option<TouchPoint>,
    state: PanState,
}

impl PanRecognizer {
    pub fn new(touch_slop: f64, velocity_window: Duration) -> Self {
        Self {
            touch_slop,
            velocity_window,
            point: None,
            state: PanState::Idle,
        }
    }

    pub fn state(&self) -> PanState {
        self.state
    }

    pub fn is_panning(&self) -> bool {
        self.state == PanState::Panning
    }

    /// Slot id of the tracked touch
    pub fn active_touch(&self) -> Option<i32> {
        self.point.as_ref().map(|p| p.id)
    }

    pub fn translation(&self) -> Point {
        self.point.as_ref().map_or(Point::ZERO, TouchPoint::translation)
    }

    /// Instantaneous finger velocity, zero when idle
    pub fn velocity(&self) -> Point {
        self.point.as_ref().map_or(Point::ZERO, |p| p.velocity)
    }

    /// Handle touch down. Returns false if another slot is already tracked.
    pub fn touch_down(&mut self, id: i32, pos: Point, time: Duration) -> bool {
        if self.point.is_some() {
            return false;
        }
        self.point = Some(TouchPoint::new(id, pos, time));
        self.state = PanState::Possible;
        true
    }

    /// Handle touch motion - emits `Began` once the slop is exceeded, then `Changed`
    pub fn touch_motion(&mut self, id: i32, pos: Point, time: Duration) -> Option<DragSample> {
        let window = self.velocity_window;
        let point = self.point.as_mut().filter(|p| p.id == id)?;
        point.update(pos, time, window);

        match self.state {
            PanState::Possible if point.distance() >= self.touch_slop => {
                self.state = PanState::Panning;
                Some(DragSample {
                    translation: point.translation(),
                    velocity: point.velocity,
                    phase: DragPhase::Began,
                })
            }
            PanState::Panning => Some(DragSample {
                translation: point.translation(),
                velocity: point.velocity,
                phase: DragPhase::Changed,
            }),
            _ => None,
        }
    }

    /// Handle touch up - emits `Ended` if the touch was a drag
    pub fn touch_up(&mut self, id: i32, time: Duration) -> Option<DragSample> {
        if self.active_touch() != Some(id) {
            return None;
        }
        let mut point = self.point.take()?;
        let was_panning = self.state == PanState::Panning;
        self.state = PanState::Idle;

        if !was_panning {
            return None;
        }
        let pos = point.current_pos;
        point.update(pos, time, self.velocity_window);
        Some(DragSample {
            translation: point.translation(),
            velocity: point.velocity,
            phase: DragPhase::Ended,
        })
    }

    /// Handle touch cancel - drop the tracked touch without an `Ended`
    pub fn touch_cancel(&mut self) {
        self.point = None;
        self.state = PanState::Idle;
    }

    /// Measure translation from the finger's current position from now on
    pub fn reset_translation(&mut self) {
        if let Some(point) = self.point.as_mut() {
            point.origin = point.current_pos;
        }
    }
}
