//! Pinned scroll sections
//!
//! A section is a scroll binding plus what to do with its progress: phase
//! tracks that turn entrance/exit sub-progress into property values, and an
//! optional timeline scrubbed directly by progress.

use scrubline_animation::{FrameBatch, Keyframe, TargetId, Timeline};
use scrubline_core::events::PinTransition;
use scrubline_core::host::{Selector, Viewport};
use serde::{Deserialize, Serialize};

use crate::binding::{ScrollBinding, ScrollConfig};
use crate::orchestrator::DriverHandle;
use crate::phase::{Phase, PhaseEvaluator, PhaseSample, PhaseTrack};

/// Scroll section registration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub phases: PhaseEvaluator,
    #[serde(default)]
    pub tracks: Vec<PhaseTrack>,
    /// Steps seeked to the section's progress every tick
    #[serde(default)]
    pub timeline: Vec<Keyframe<Selector>>,
}

impl SectionConfig {
    pub fn new(scroll: ScrollConfig) -> Self {
        Self {
            scroll,
            phases: PhaseEvaluator::default(),
            tracks: Vec::new(),
            timeline: Vec::new(),
        }
    }

    pub fn phases(mut self, phases: PhaseEvaluator) -> Self {
        self.phases = phases;
        self
    }

    pub fn track(mut self, track: PhaseTrack) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn step(mut self, step: Keyframe<Selector>) -> Self {
        self.timeline.push(step);
        self
    }
}

/// Progress report handed to a section's observer every tick
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ProgressUpdate {
    #[serde(skip)]
    pub section: DriverHandle,
    pub raw: f32,
    pub progress: f32,
    pub phase: PhaseSample,
}

/// Observer of section progress
pub type ProgressCallback = Box<dyn FnMut(ProgressUpdate)>;

/// Live section: binding, resolved tracks and the scrubbed timeline
pub(crate) struct ScrollSection {
    binding: ScrollBinding,
    phases: PhaseEvaluator,
    tracks: Vec<(TargetId, PhaseTrack)>,
    timeline: Option<Timeline>,
    last_phase: Option<Phase>,
    on_progress: Option<ProgressCallback>,
}

impl ScrollSection {
    pub(crate) fn new(
        binding: ScrollBinding,
        phases: PhaseEvaluator,
        tracks: Vec<(TargetId, PhaseTrack)>,
        timeline: Option<Timeline>,
        on_progress: Option<ProgressCallback>,
    ) -> Self {
        Self {
            binding,
            phases,
            tracks,
            timeline,
            last_phase: None,
            on_progress,
        }
    }

    pub(crate) fn binding(&self) -> &ScrollBinding {
        &self.binding
    }

    pub(crate) fn binding_mut(&mut self) -> &mut ScrollBinding {
        &mut self.binding
    }

    pub(crate) fn phase(&self) -> Option<Phase> {
        self.last_phase
    }

    /// One tick: update progress, stage track values and notify the observer.
    ///
    /// Nothing is staged while progress holds still. The steady phase stages
    /// the settled values once, on the tick it is entered.
    pub(crate) fn evaluate(
        &mut self,
        handle: DriverHandle,
        scroll: f32,
        viewport: &mut dyn Viewport,
        batch: &mut FrameBatch,
    ) -> Option<PinTransition> {
        let frame = self.binding.update(scroll, viewport);
        let sample = self.phases.evaluate(frame.progress);

        if frame.changed {
            let entering_steady = sample.phase == Phase::Steady && self.last_phase != Some(Phase::Steady);
            if sample.phase != Phase::Steady || entering_steady {
                for (target, track) in &self.tracks {
                    let values = track.values_at(sample);
                    if !values.is_empty() {
                        batch.stage(*target, values);
                    }
                }
            }

            if let Some(timeline) = &mut self.timeline {
                timeline.seek(frame.progress);
                if timeline.needs_render() {
                    for (target, properties) in timeline.render() {
                        batch.stage(target, properties);
                    }
                }
            }
        }

        if self.last_phase != Some(sample.phase) {
            tracing::debug!(
                "section `{}` entered {:?} at progress {:.3}",
                self.binding.config().trigger,
                sample.phase,
                frame.progress
            );
        }
        self.last_phase = Some(sample.phase);

        if let Some(on_progress) = &mut self.on_progress {
            on_progress(ProgressUpdate {
                section: handle,
                raw: frame.raw,
                progress: frame.progress,
                phase: sample,
            });
        }

        frame.pin
    }

    /// Release the pin and stop the scrubbed timeline
    pub(crate) fn release(&mut self, viewport: &mut dyn Viewport) -> Option<PinTransition> {
        if let Some(timeline) = &mut self.timeline {
            timeline.halt();
        }
        self.on_progress = None;
        self.binding.release(viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ExtendBy;
    use crate::phase::Ramp;
    use scrubline_core::value::Value;

    #[test]
    fn test_deserialize_section() {
        let toml = r#"
            [scroll]
            trigger = ".about"
            extend_by = "+=130%"
            pin = true
            scrub = { lag_ms = 600 }

            [phases]
            entrance_end = 0.25

            [[tracks]]
            target = ".about-body"
            entrance.x = { from = "-10vw", to = "0vw" }
            entrance.opacity = { from = 0, to = 1 }
            exit.x = { from = "0vw", to = "-6vw" }
        "#;
        let config: SectionConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.scroll.extend_by, ExtendBy::ViewportPercent(130.0));
        assert_eq!(config.phases.entrance_end, 0.25);
        assert_eq!(config.phases.exit_start, 0.7);
        assert_eq!(
            config.tracks[0].entrance["x"],
            Ramp::new(Value::vw(-10.0), Value::vw(0.0))
        );
        assert!(config.timeline.is_empty());
    }
}
