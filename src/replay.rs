//! Touch scenario replay
//!
//! A scenario is a TOML file describing a container, a list and a timed
//! sequence of touches. [`Replay`] feeds it into a [`Drawer`] frame by frame,
//! either on simulated time ([`Replay::run_to_end`]) or driven by a real
//! frame timer from the binary.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DrawerConfig;
use crate::drawer::{Drawer, DrawerFrame, ExpansionState, RowSelection, Settle, ShortcutList};
use crate::error::{DrawerError, Result};
use crate::geometry::{Point, Size};
use crate::input::ScrollRegion;

/// Simulated time allowed after the last step for animations to finish
const SETTLE_LIMIT: Duration = Duration::from_secs(10);

fn default_frame_ms() -> u64 {
    16
}

fn default_rows() -> usize {
    20
}

/// Container and list the scenario runs in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_rows")]
    pub rows: usize,
    /// Initial list scroll offset
    #[serde(default)]
    pub list_offset: f64,
}

/// What happens at a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    Down,
    Move,
    Up,
    Cancel,
    /// Search field takes focus
    Search,
    /// Container bounds change, `x`/`y` hold the new width/height
    Resize,
}

/// One timed scenario step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub at_ms: u64,
    pub kind: StepKind,
    #[serde(default)]
    pub id: i32,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl Step {
    pub fn at(&self) -> Duration {
        Duration::from_millis(self.at_ms)
    }

    fn point(&self, index: usize) -> Result<Point> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Ok(Point::new(x, y)),
            _ => Err(DrawerError::InvalidScenario(format!(
                "step {} ({:?}) needs both x and y",
                index, self.kind
            ))),
        }
    }
}

/// Expected outcome, checked once the replay finishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    pub state: ExpansionState,
    pub top_offset: Option<f64>,
}

/// Scenario file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
    pub stage: Stage,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
    pub expect: Option<Expectation>,
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let scenario = Self::from_toml_str(&contents)?;
        info!(name = %scenario.name, steps = scenario.steps.len(), "Loaded scenario from {:?}", path.as_ref());
        Ok(scenario)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Steps must be time ordered and carry the coordinates they need
    pub fn validate(&self) -> Result<()> {
        if self.frame_ms == 0 {
            return Err(DrawerError::InvalidScenario("frame_ms must be non-zero".to_string()));
        }
        if self.stage.width <= 0.0 || self.stage.height <= 0.0 {
            return Err(DrawerError::InvalidScenario(format!(
                "stage must have a positive size, got {}x{}",
                self.stage.width, self.stage.height
            )));
        }
        let mut last = 0;
        for (index, step) in self.steps.iter().enumerate() {
            if step.at_ms < last {
                return Err(DrawerError::InvalidScenario(format!(
                    "step {} at {}ms is earlier than the step before it ({}ms)",
                    index, step.at_ms, last
                )));
            }
            last = step.at_ms;
            if matches!(step.kind, StepKind::Down | StepKind::Move | StepKind::Resize) {
                step.point(index)?;
            }
        }
        Ok(())
    }

    pub fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }

    /// Time of the last step
    pub fn duration(&self) -> Duration {
        self.steps.last().map(Step::at).unwrap_or_default()
    }
}

/// Expansion state change observed during a replay
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transition {
    pub at_ms: u64,
    pub from: ExpansionState,
    pub to: ExpansionState,
}

/// Outcome of a replay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub scenario: String,
    pub elapsed_ms: u64,
    pub frames: u64,
    pub final_frame: DrawerFrame,
    pub list_offset: f64,
    pub transitions: Vec<Transition>,
    /// Rows tapped during the replay, in order
    pub selections: Vec<RowSelection>,
    pub last_settle: Option<Settle>,
    /// None when the scenario states no expectation
    pub expectation_met: Option<bool>,
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "scenario {} ({} ms, {} frames)", self.scenario, self.elapsed_ms, self.frames)?;
        for t in &self.transitions {
            writeln!(f, "  {:>6} ms  {:?} -> {:?}", t.at_ms, t.from, t.to)?;
        }
        for s in &self.selections {
            writeln!(f, "  selected row {} ({})", s.index, s.row.title)?;
        }
        writeln!(
            f,
            "final: {:?} at offset {:.1}, overlay {:.2}, header {:.2}, list offset {:.1}",
            self.final_frame.expansion_state,
            self.final_frame.top_offset,
            self.final_frame.overlay_alpha,
            self.final_frame.header_alpha,
            self.list_offset
        )?;
        match self.expectation_met {
            Some(true) => write!(f, "expectation met"),
            Some(false) => write!(f, "expectation NOT met"),
            None => write!(f, "no expectation"),
        }
    }
}

/// A scenario being played against a drawer
pub struct Replay {
    scenario: Scenario,
    drawer: Drawer,
    next_step: usize,
    last_tick: Duration,
    frames: u64,
    last_state: ExpansionState,
    transitions: Vec<Transition>,
    selections: Vec<RowSelection>,
}

impl Replay {
    pub fn new(scenario: Scenario, config: DrawerConfig) -> Result<Self> {
        scenario.validate()?;
        let stage = &scenario.stage;
        let list = ShortcutList::with_sample_rows(stage.rows);
        let mut drawer = Drawer::new(config, Size::new(stage.width, stage.height), list)?;
        drawer.list_mut().set_content_offset_y(stage.list_offset);

        let last_state = drawer.expansion_state();
        Ok(Self {
            scenario,
            drawer,
            next_step: 0,
            last_tick: Duration::ZERO,
            frames: 0,
            last_state,
            transitions: Vec::new(),
            selections: Vec::new(),
        })
    }

    pub fn drawer(&self) -> &Drawer {
        &self.drawer
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// All steps applied and nothing left moving, or out of time
    pub fn is_finished(&self, now: Duration) -> bool {
        let steps_done = self.next_step >= self.scenario.steps.len();
        if steps_done && !self.drawer.frame().animating {
            return true;
        }
        if now > self.scenario.duration() + SETTLE_LIMIT {
            warn!(now_ms = now.as_millis() as u64, "Replay gave up waiting for the drawer to settle");
            return true;
        }
        false
    }

    /// Apply every step due by `now`, then advance animations to `now`.
    /// Returns whether the replay should keep running.
    pub fn advance(&mut self, now: Duration) -> bool {
        while let Some(step) = self.scenario.steps.get(self.next_step).cloned() {
            if step.at() > now {
                break;
            }
            self.apply(&step);
            self.next_step += 1;
            self.record_transition(step.at());
        }

        let dt = now.saturating_sub(self.last_tick);
        self.last_tick = now;
        if !dt.is_zero() {
            self.drawer.tick(dt);
            self.frames += 1;
        }
        self.record_transition(now);

        !self.is_finished(now)
    }

    fn apply(&mut self, step: &Step) {
        let at = step.at();
        let point = Point::new(step.x.unwrap_or_default(), step.y.unwrap_or_default());
        debug!(at_ms = step.at_ms, kind = ?step.kind, x = point.x, y = point.y, "Replay step");
        match step.kind {
            StepKind::Down => {
                if !self.drawer.touch_down(step.id, point, at) {
                    debug!(id = step.id, "Touch missed the drawer");
                }
            }
            StepKind::Move => self.drawer.touch_motion(step.id, point, at),
            StepKind::Up => {
                if let Some(selection) = self.drawer.touch_up(step.id, at) {
                    self.selections.push(selection);
                }
            }
            StepKind::Cancel => self.drawer.touch_cancel(),
            StepKind::Search => self.drawer.search_did_begin_editing(),
            StepKind::Resize => self.drawer.set_container_bounds(Size::new(point.x, point.y)),
        }
    }

    fn record_transition(&mut self, now: Duration) {
        let state = self.drawer.expansion_state();
        if state != self.last_state {
            self.transitions.push(Transition {
                at_ms: now.as_millis() as u64,
                from: self.last_state,
                to: state,
            });
            self.last_state = state;
        }
    }

    /// Play the whole scenario on simulated time
    pub fn run_to_end(mut self) -> ReplayReport {
        let frame = self.scenario.frame();
        let mut now = Duration::ZERO;
        while self.advance(now) {
            now += frame;
        }
        self.report(now)
    }

    /// Summarize the replay as of `now`
    pub fn report(&self, now: Duration) -> ReplayReport {
        let final_frame = self.drawer.frame();
        let expectation_met = self.scenario.expect.as_ref().map(|expect| {
            let offset_ok = expect
                .top_offset
                .map_or(true, |offset| (offset - final_frame.top_offset).abs() < 0.5);
            expect.state == final_frame.expansion_state && offset_ok
        });
        ReplayReport {
            scenario: self.scenario.name.clone(),
            elapsed_ms: now.as_millis() as u64,
            frames: self.frames,
            final_frame,
            list_offset: self.drawer.list().content_offset_y(),
            transitions: self.transitions.clone(),
            selections: self.selections.clone(),
            last_settle: self.drawer.container().last_settle().copied(),
            expectation_met,
        }
    }
}
