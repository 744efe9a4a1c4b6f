//! Phase segmentation of a scroll section
//!
//! A section's progress is split into three consecutive phases:
//!
//! ```text
//! 0 ────── entrance_end ────── exit_start ────── 1
//!   Entrance              Steady             Exit
//! ```
//!
//! Entrance and exit carry their own sub-progress in `[0, 1]`. The steady
//! phase is a plateau: targets hold their settled values.

use indexmap::IndexMap;
use scrubline_animation::Easing;
use scrubline_core::error::ConfigError;
use scrubline_core::host::Selector;
use scrubline_core::value::{PropertyMap, Value};
use serde::{Deserialize, Serialize};

/// Default end of the entrance phase
pub const DEFAULT_ENTRANCE_END: f32 = 0.3;

/// Default start of the exit phase
pub const DEFAULT_EXIT_START: f32 = 0.7;

/// Sub-range of section progress
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Entrance,
    Steady,
    Exit,
}

/// Phase plus progress within it
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseSample {
    pub phase: Phase,
    /// Linear rescale of progress into the phase, in `[0, 1]`; 0 while steady
    pub sub_progress: f32,
}

/// Splits progress at two boundaries
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseEvaluator {
    pub entrance_end: f32,
    pub exit_start: f32,
}

impl Default for PhaseEvaluator {
    fn default() -> Self {
        Self {
            entrance_end: DEFAULT_ENTRANCE_END,
            exit_start: DEFAULT_EXIT_START,
        }
    }
}

impl PhaseEvaluator {
    /// Boundaries must satisfy `0 < entrance_end < exit_start < 1`
    pub fn new(entrance_end: f32, exit_start: f32) -> Result<Self, ConfigError> {
        let evaluator = Self {
            entrance_end,
            exit_start,
        };
        evaluator.validate()?;
        Ok(evaluator)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = self.entrance_end > 0.0
            && self.entrance_end < self.exit_start
            && self.exit_start < 1.0;
        if ok {
            Ok(())
        } else {
            Err(ConfigError::InvalidPhaseBounds {
                entrance_end: self.entrance_end,
                exit_start: self.exit_start,
            })
        }
    }

    /// Phase and sub-progress for `progress`.
    ///
    /// `entrance_end` itself is the last entrance sample (sub-progress 1) and
    /// `exit_start` the first exit sample (sub-progress 0).
    pub fn evaluate(&self, progress: f32) -> PhaseSample {
        let p = progress.clamp(0.0, 1.0);
        if p <= self.entrance_end {
            PhaseSample {
                phase: Phase::Entrance,
                sub_progress: (p / self.entrance_end).clamp(0.0, 1.0),
            }
        } else if p >= self.exit_start {
            PhaseSample {
                phase: Phase::Exit,
                sub_progress: ((p - self.exit_start) / (1.0 - self.exit_start)).clamp(0.0, 1.0),
            }
        } else {
            PhaseSample {
                phase: Phase::Steady,
                sub_progress: 0.0,
            }
        }
    }
}

/// One property's motion across a phase
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ramp {
    pub from: Value,
    pub to: Value,
    #[serde(default)]
    pub easing: Easing,
}

impl Ramp {
    pub fn new(from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            easing: Easing::Linear,
        }
    }

    pub fn ease(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn at(&self, sub_progress: f32) -> Value {
        self.from.lerp(self.to, self.easing.apply(sub_progress))
    }
}

/// Property ramps of one phase, in write order
pub type PhaseMotion = IndexMap<String, Ramp>;

/// Per-target formulas of a scroll section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseTrack {
    pub target: Selector,
    #[serde(default)]
    pub entrance: PhaseMotion,
    #[serde(default)]
    pub exit: PhaseMotion,
}

impl PhaseTrack {
    pub fn new(target: impl Into<Selector>) -> Self {
        Self {
            target: target.into(),
            entrance: PhaseMotion::new(),
            exit: PhaseMotion::new(),
        }
    }

    /// Builder: add an entrance ramp
    pub fn entering(mut self, property: impl Into<String>, ramp: Ramp) -> Self {
        self.entrance.insert(property.into(), ramp);
        self
    }

    /// Builder: add an exit ramp
    pub fn exiting(mut self, property: impl Into<String>, ramp: Ramp) -> Self {
        self.exit.insert(property.into(), ramp);
        self
    }

    /// Values held between entrance and exit: each entrance ramp's end,
    /// then each exit ramp's start for properties the entrance leaves alone
    pub fn settled(&self) -> PropertyMap {
        let mut values: PropertyMap = self
            .entrance
            .iter()
            .map(|(name, ramp)| (name.clone(), ramp.to))
            .collect();
        for (name, ramp) in &self.exit {
            values.entry(name.clone()).or_insert(ramp.from);
        }
        values
    }

    /// Property values for `sample`
    pub fn values_at(&self, sample: PhaseSample) -> PropertyMap {
        let ramps = match sample.phase {
            Phase::Entrance => &self.entrance,
            Phase::Exit => &self.exit,
            Phase::Steady => return self.settled(),
        };
        ramps
            .iter()
            .map(|(name, ramp)| (name.clone(), ramp.at(sample.sub_progress)))
            .collect()
    }
}
