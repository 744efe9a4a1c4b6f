//! Viewport reveals
//!
//! A reveal plays a short fade-and-rise forward when its element crosses the
//! trigger line, and back out when the element leaves after being fully
//! shown. Playback state is a small state machine:
//!
//! ```text
//! NotEntered ─┐
//! Hidden ─────┼─ Entered ──▶ PlayingForward ── ForwardComplete ──▶ Shown
//! PlayingReverse ┘                                                   │
//!      ▲                                                           Exited
//!      └───────────────────────────────────────────────────────────┘
//! PlayingReverse ── ReverseComplete ──▶ Hidden
//! ```
//!
//! Other events are ignored, with one exception: an exit during forward
//! playback is held until the forward run completes, then reverses it.

use scrubline_animation::presets::{REVEAL_DISTANCE_PX, REVEAL_DURATION_MS};
use scrubline_animation::{AnimationPreset, Easing, FrameBatch, TargetId, Timeline, TimelineState};
use scrubline_core::error::ConfigError;
use scrubline_core::events::{IntersectionEvent, IntersectionKind};
use scrubline_core::fsm::StateMachine;
use scrubline_core::host::{ElementId, ObserverId, Selector};
use serde::{Deserialize, Serialize};

/// Default trigger line (`"top 80%"`)
pub const DEFAULT_TRIGGER_LINE: f32 = 0.8;

/// Playback state of one reveal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealState {
    NotEntered,
    PlayingForward,
    Shown,
    PlayingReverse,
    Hidden,
}

/// Inputs to the reveal state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RevealEvent {
    Entered,
    Exited,
    ForwardComplete,
    ReverseComplete,
}

fn reveal_machine() -> StateMachine<RevealState, RevealEvent> {
    use RevealEvent::*;
    use RevealState::*;

    StateMachine::builder(NotEntered)
        .on(NotEntered, Entered, PlayingForward)
        .on(Hidden, Entered, PlayingForward)
        .on(PlayingReverse, Entered, PlayingForward)
        .on(PlayingForward, ForwardComplete, Shown)
        .on(Shown, Exited, PlayingReverse)
        .on(PlayingReverse, ReverseComplete, Hidden)
        .build()
}

fn default_trigger_line() -> f32 {
    DEFAULT_TRIGGER_LINE
}

fn default_duration_ms() -> u32 {
    REVEAL_DURATION_MS
}

fn default_distance_px() -> f32 {
    REVEAL_DISTANCE_PX
}

fn default_easing() -> Easing {
    Easing::EaseOutQuart
}

/// Reveal registration: every element matching `selector` gets its own
/// controller
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevealConfig {
    pub selector: Selector,
    /// Fraction of the viewport height the element's top must cross
    #[serde(default = "default_trigger_line")]
    pub trigger_line: f32,
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u32,
    #[serde(default = "default_distance_px")]
    pub distance_px: f32,
    #[serde(default = "default_easing")]
    pub easing: Easing,
}

impl RevealConfig {
    pub fn new(selector: impl Into<Selector>) -> Self {
        Self {
            selector: selector.into(),
            trigger_line: DEFAULT_TRIGGER_LINE,
            duration_ms: REVEAL_DURATION_MS,
            distance_px: REVEAL_DISTANCE_PX,
            easing: default_easing(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_ms == 0 {
            return Err(ConfigError::InvalidDuration(0.0));
        }
        if !(0.0..=1.0).contains(&self.trigger_line) {
            return Err(ConfigError::InvalidAnchor(format!(
                "trigger line {}",
                self.trigger_line
            )));
        }
        Ok(())
    }
}

/// Reveal playback for a single element
#[derive(Debug)]
pub struct RevealController {
    element: ElementId,
    observer: ObserverId,
    timeline: Timeline,
    machine: StateMachine<RevealState, RevealEvent>,
    /// Exit seen while playing forward
    pending_exit: bool,
}

impl RevealController {
    /// Build the reveal timeline for `target`, which addresses `element` alone
    pub fn new(
        element: ElementId,
        target: TargetId,
        observer: ObserverId,
        config: &RevealConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut timeline = Timeline::new();
        timeline.add_step(
            AnimationPreset::reveal(target, config.distance_px, config.duration_ms).ease(config.easing),
        )?;

        Ok(Self {
            element,
            observer,
            timeline,
            machine: reveal_machine(),
            pending_exit: false,
        })
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn observer(&self) -> ObserverId {
        self.observer
    }

    pub fn state(&self) -> RevealState {
        self.machine.current_state()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// True while an exit waits for forward playback to complete
    pub fn exit_pending(&self) -> bool {
        self.pending_exit
    }

    /// Feed an intersection transition. Returns the state change, if any.
    pub fn handle(&mut self, event: &IntersectionEvent) -> Option<(RevealState, RevealState)> {
        let input = match event.kind {
            IntersectionKind::Entered => RevealEvent::Entered,
            IntersectionKind::Exited => RevealEvent::Exited,
        };

        if self.state() == RevealState::PlayingForward {
            self.pending_exit = input == RevealEvent::Exited;
            if self.pending_exit {
                tracing::trace!("reveal holding exit ({:?}) until forward completes", event.direction);
            }
            return None;
        }

        let Some((from, to)) = self.machine.send(input) else {
            tracing::trace!(
                "reveal ignored {:?} ({:?}) in {:?}",
                input,
                event.direction,
                self.state()
            );
            return None;
        };

        self.start(to);
        Some((from, to))
    }

    fn start(&mut self, state: RevealState) {
        match state {
            RevealState::PlayingForward => self.timeline.play(),
            RevealState::PlayingReverse => self.timeline.reverse(),
            _ => {}
        }
    }

    /// Advance playback and settle into `Shown`/`Hidden` when it finishes
    pub fn advance(&mut self, dt_ms: f32) {
        self.timeline.tick(dt_ms);

        let finished = match (self.state(), self.timeline.state()) {
            (RevealState::PlayingForward, TimelineState::Complete) => Some(RevealEvent::ForwardComplete),
            (RevealState::PlayingReverse, TimelineState::Idle) if self.timeline.cursor_ms() <= 0.0 => {
                Some(RevealEvent::ReverseComplete)
            }
            _ => None,
        };
        if let Some(event) = finished {
            self.machine.send(event);
        }

        if self.pending_exit && self.state() == RevealState::Shown {
            self.pending_exit = false;
            if let Some((_, to)) = self.machine.send(RevealEvent::Exited) {
                self.start(to);
            }
        }
    }

    /// Stage the current pose if it changed since the last render
    pub fn render_into(&mut self, batch: &mut FrameBatch) {
        if !self.timeline.needs_render() {
            return;
        }
        for (target, properties) in self.timeline.render() {
            batch.stage(target, properties);
        }
    }

    /// Stop playback where it is
    pub fn halt(&mut self) {
        self.timeline.halt();
    }
}
