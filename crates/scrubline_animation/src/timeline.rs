//! Timeline orchestration for multiple tweens
//!
//! A timeline is a list of steps placed on a shared time axis plus a cursor.
//! The cursor can be driven by the frame clock (`play`/`reverse` + `tick`)
//! or set directly (`seek`) when scroll progress owns the position. Sampling
//! depends only on the cursor, so both ways of reaching a position give the
//! same property values.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use scrubline_core::error::ConfigError;
use scrubline_core::value::{lerp_properties, PropertyMap, Value};
use slotmap::{new_key_type, SlotMap};

use crate::easing::Easing;
use crate::keyframe::{AnchorEdge, Keyframe, Offset, StepRef};
use crate::target::TargetId;

new_key_type! {
    pub struct StepId;
}

/// Lifecycle state of a timeline
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimelineState {
    #[default]
    Idle,
    Running,
    Complete,
}

/// Playback direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayDirection {
    #[default]
    Forward,
    Reverse,
}

/// A step with its start time resolved
#[derive(Clone, Debug)]
struct TimelineStep {
    target: TargetId,
    from: PropertyMap,
    to: PropertyMap,
    start_ms: f32,
    duration_ms: u32,
    easing: Easing,
}

impl TimelineStep {
    fn end_ms(&self) -> f32 {
        self.start_ms + self.duration_ms as f32
    }

    /// Eased local progress at `cursor_ms`, clamped to [0, 1]
    fn local_progress(&self, cursor_ms: f32) -> f32 {
        if self.duration_ms == 0 {
            return if cursor_ms >= self.start_ms { 1.0 } else { 0.0 };
        }
        let local = (cursor_ms - self.start_ms) / self.duration_ms as f32;
        self.easing.apply(local.clamp(0.0, 1.0))
    }
}

/// A timeline that orchestrates multiple tweens
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    steps: SlotMap<StepId, TimelineStep>,
    order: Vec<StepId>,
    tags: FxHashMap<String, StepId>,
    cursor_ms: f32,
    duration_ms: f32,
    state: TimelineState,
    direction: PlayDirection,
    needs_render: bool,
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            needs_render: true,
            ..Default::default()
        }
    }

    /// Append a step.
    ///
    /// Relative offsets may only reference steps that were added earlier.
    /// A start that resolves before zero is clamped to zero.
    pub fn add_step(&mut self, step: Keyframe<TargetId>) -> Result<StepId, ConfigError> {
        if let Some(tag) = &step.tag {
            if self.tags.contains_key(tag) {
                return Err(ConfigError::DuplicateTag(tag.clone()));
            }
        }

        let start_ms = self.resolve_offset(&step.offset)?;
        if start_ms < 0.0 {
            tracing::debug!("step starts {}ms before the timeline; clamping to 0", -start_ms);
        }

        let resolved = TimelineStep {
            target: step.target,
            from: step.from.unwrap_or_default(),
            to: step.to,
            start_ms: start_ms.max(0.0),
            duration_ms: step.duration_ms,
            easing: step.easing,
        };
        self.duration_ms = self.duration_ms.max(resolved.end_ms());

        let id = self.steps.insert(resolved);
        self.order.push(id);
        if let Some(tag) = step.tag {
            self.tags.insert(tag, id);
        }
        self.needs_render = true;
        Ok(id)
    }

    /// Append a sequential-or-offset step without explicit start values
    pub fn add(
        &mut self,
        target: TargetId,
        to: PropertyMap,
        duration_ms: u32,
        easing: Easing,
        offset: Offset,
    ) -> Result<StepId, ConfigError> {
        self.add_step(Keyframe::to(target, to, duration_ms).ease(easing).offset(offset))
    }

    fn resolve_offset(&self, offset: &Offset) -> Result<f32, ConfigError> {
        match offset {
            Offset::Sequential => Ok(self
                .order
                .last()
                .map(|&id| self.steps[id].end_ms())
                .unwrap_or(0.0)),
            Offset::At(ms) => Ok(*ms as f32),
            Offset::Relative {
                anchor,
                edge,
                delta_ms,
            } => {
                let anchor_id = match anchor {
                    StepRef::Previous => self.order.last().copied(),
                    StepRef::Index(i) => self.order.get(*i).copied(),
                    StepRef::Tag(tag) => self.tags.get(tag).copied(),
                }
                .ok_or_else(|| ConfigError::DanglingAnchor(describe_ref(anchor)))?;

                let step = &self.steps[anchor_id];
                let base = match edge {
                    AnchorEdge::Start => step.start_ms,
                    AnchorEdge::End => step.end_ms(),
                };
                Ok(base + *delta_ms as f32)
            }
        }
    }

    /// Resolved start time of a step
    pub fn step_start_ms(&self, id: StepId) -> Option<f32> {
        self.steps.get(id).map(|s| s.start_ms)
    }

    /// Id of the step carrying `tag`
    pub fn tagged(&self, tag: &str) -> Option<StepId> {
        self.tags.get(tag).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total length: the latest step end
    pub fn duration_ms(&self) -> f32 {
        self.duration_ms
    }

    pub fn cursor_ms(&self) -> f32 {
        self.cursor_ms
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    pub fn direction(&self) -> PlayDirection {
        self.direction
    }

    pub fn is_running(&self) -> bool {
        self.state == TimelineState::Running
    }

    /// Cursor position as a fraction of the duration
    pub fn progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            return if self.state == TimelineState::Complete { 1.0 } else { 0.0 };
        }
        (self.cursor_ms / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Start or resume forward playback from the current cursor.
    ///
    /// Has no effect on a completed timeline.
    pub fn play(&mut self) {
        self.direction = PlayDirection::Forward;
        if self.state != TimelineState::Complete {
            self.state = TimelineState::Running;
        }
    }

    /// Play backward from the current cursor
    pub fn reverse(&mut self) {
        self.direction = PlayDirection::Reverse;
        self.state = if self.cursor_ms > 0.0 {
            TimelineState::Running
        } else {
            TimelineState::Idle
        };
    }

    /// Stop where the cursor is, without jumping to either end
    pub fn halt(&mut self) {
        if self.state == TimelineState::Running {
            self.state = TimelineState::Idle;
        }
    }

    /// Rewind to zero and play forward
    pub fn restart(&mut self) {
        self.cursor_ms = 0.0;
        self.needs_render = true;
        self.state = TimelineState::Idle;
        self.play();
    }

    /// Set the cursor to `progress` of the duration.
    ///
    /// A running timeline keeps running from the new position. Otherwise
    /// the state follows the cursor: complete at the end, idle elsewhere.
    pub fn seek(&mut self, progress: f32) {
        let cursor = progress.clamp(0.0, 1.0) * self.duration_ms;
        if cursor != self.cursor_ms {
            self.needs_render = true;
        }
        self.cursor_ms = cursor;

        if self.state != TimelineState::Running {
            self.state = if self.duration_ms > 0.0 && cursor >= self.duration_ms {
                TimelineState::Complete
            } else {
                TimelineState::Idle
            };
        }
    }

    /// Advance the cursor by `dt_ms` in the current direction.
    ///
    /// Returns true if the cursor moved.
    pub fn tick(&mut self, dt_ms: f32) -> bool {
        if self.state != TimelineState::Running || dt_ms <= 0.0 {
            return false;
        }

        let before = self.cursor_ms;
        match self.direction {
            PlayDirection::Forward => {
                self.cursor_ms += dt_ms;
                if self.cursor_ms >= self.duration_ms {
                    self.cursor_ms = self.duration_ms;
                    self.state = TimelineState::Complete;
                }
            }
            PlayDirection::Reverse => {
                self.cursor_ms -= dt_ms;
                if self.cursor_ms <= 0.0 {
                    self.cursor_ms = 0.0;
                    self.state = TimelineState::Idle;
                }
            }
        }

        let moved = self.cursor_ms != before;
        self.needs_render |= moved;
        moved
    }

    /// True when the cursor moved (or steps changed) since the last render
    pub fn needs_render(&self) -> bool {
        self.needs_render
    }

    /// Property values at the current cursor, one map per target in the
    /// order targets first appear.
    ///
    /// Each property takes its value from the latest-starting step that has
    /// started. A property no started step has written yet holds the start
    /// value of the earliest pending step that declares one.
    pub fn sample(&self) -> Vec<(TargetId, PropertyMap)> {
        let mut merged: IndexMap<TargetId, IndexMap<String, (Value, Source)>> = IndexMap::new();

        for &id in &self.order {
            let step = &self.steps[id];
            let slots = merged.entry(step.target).or_default();

            if self.cursor_ms >= step.start_ms {
                let t = step.local_progress(self.cursor_ms);
                let source = Source::Active(step.start_ms);
                for (name, value) in lerp_properties(&step.from, &step.to, t) {
                    let replace = match slots.get(&name) {
                        Some((_, Source::Active(start))) => step.start_ms >= *start,
                        _ => true,
                    };
                    if replace {
                        slots.insert(name, (value, source));
                    }
                }
            } else {
                let source = Source::Pending(step.start_ms);
                for name in step.to.keys() {
                    let Some(&value) = step.from.get(name) else {
                        continue;
                    };
                    let replace = match slots.get(name) {
                        None => true,
                        Some((_, Source::Pending(start))) => step.start_ms < *start,
                        Some((_, Source::Active(_))) => false,
                    };
                    if replace {
                        slots.insert(name.clone(), (value, source));
                    }
                }
            }
        }

        merged
            .into_iter()
            .map(|(target, slots)| {
                let properties = slots.into_iter().map(|(name, (value, _))| (name, value)).collect();
                (target, properties)
            })
            .collect()
    }

    /// Sample and clear the render flag
    pub fn render(&mut self) -> Vec<(TargetId, PropertyMap)> {
        self.needs_render = false;
        self.sample()
    }
}

/// Which step a sampled value came from
#[derive(Clone, Copy, Debug)]
enum Source {
    /// A started step, by start time
    Active(f32),
    /// The start value of a step that has not started, by start time
    Pending(f32),
}

fn describe_ref(anchor: &StepRef) -> String {
    match anchor {
        StepRef::Previous => "previous".to_string(),
        StepRef::Index(i) => format!("#{}", i),
        StepRef::Tag(tag) => tag.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::properties;
    use slotmap::SlotMap;

    fn targets(n: usize) -> Vec<TargetId> {
        let mut map: SlotMap<TargetId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn fade(target: TargetId, duration_ms: u32) -> Keyframe<TargetId> {
        Keyframe::to(target, properties([("opacity", Value::number(1.0))]), duration_ms)
            .from(properties([("opacity", Value::number(0.0))]))
            .ease(Easing::Linear)
    }

    fn opacity_of(timeline: &Timeline, target: TargetId) -> f32 {
        timeline
            .sample()
            .into_iter()
            .find(|(t, _)| *t == target)
            .map(|(_, p)| p["opacity"].value)
            .unwrap()
    }

    #[test]
    fn test_sequential_and_overlapping_offsets() {
        let t = targets(3);
        let mut timeline = Timeline::new();

        let a = timeline.add_step(fade(t[0], 800)).unwrap();
        let b = timeline
            .add_step(fade(t[1], 800).offset(Offset::after_previous(-500)))
            .unwrap();
        let c = timeline.add_step(fade(t[2], 600)).unwrap();

        assert_eq!(timeline.step_start_ms(a), Some(0.0));
        assert_eq!(timeline.step_start_ms(b), Some(300.0));
        assert_eq!(timeline.step_start_ms(c), Some(1100.0));
        assert_eq!(timeline.duration_ms(), 1700.0);
    }

    #[test]
    fn test_tag_anchor_and_dangling_reference() {
        let t = targets(2);
        let mut timeline = Timeline::new();

        timeline.add_step(fade(t[0], 400).tag("intro")).unwrap();
        let b = timeline
            .add_step(fade(t[1], 400).offset(Offset::after_tag("intro", 100)))
            .unwrap();
        assert_eq!(timeline.step_start_ms(b), Some(500.0));

        let err = timeline
            .add_step(fade(t[1], 400).offset(Offset::after_tag("outro", 0)))
            .unwrap_err();
        assert_eq!(err, ConfigError::DanglingAnchor("outro".into()));

        let err = timeline
            .add_step(fade(t[1], 400).tag("intro"))
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateTag("intro".into()));
    }

    #[test]
    fn test_first_step_cannot_anchor_previous() {
        let t = targets(1);
        let mut timeline = Timeline::new();
        let err = timeline
            .add_step(fade(t[0], 400).offset(Offset::after_previous(-100)))
            .unwrap_err();
        assert_eq!(err, ConfigError::DanglingAnchor("previous".into()));
    }

    #[test]
    fn test_forward_index_is_dangling() {
        let t = targets(1);
        let mut timeline = Timeline::new();
        let offset = Offset::Relative {
            anchor: StepRef::Index(3),
            edge: AnchorEdge::End,
            delta_ms: 0,
        };
        assert!(timeline.add_step(fade(t[0], 400).offset(offset)).is_err());
    }

    #[test]
    fn test_play_to_completion() {
        let t = targets(1);
        let mut timeline = Timeline::new();
        timeline.add_step(fade(t[0], 1000)).unwrap();

        assert_eq!(timeline.state(), TimelineState::Idle);
        timeline.play();
        assert_eq!(timeline.state(), TimelineState::Running);

        timeline.tick(400.0);
        assert!((opacity_of(&timeline, t[0]) - 0.4).abs() < 1e-5);

        timeline.tick(700.0);
        assert_eq!(timeline.state(), TimelineState::Complete);
        assert_eq!(timeline.cursor_ms(), 1000.0);
        assert_eq!(opacity_of(&timeline, t[0]), 1.0);
    }

    #[test]
    fn test_reverse_continues_from_cursor() {
        let t = targets(1);
        let mut timeline = Timeline::new();
        timeline.add_step(fade(t[0], 1000)).unwrap();

        timeline.play();
        timeline.tick(600.0);
        timeline.reverse();
        assert_eq!(timeline.cursor_ms(), 600.0);

        timeline.tick(200.0);
        assert_eq!(timeline.cursor_ms(), 400.0);
        assert_eq!(timeline.state(), TimelineState::Running);

        timeline.tick(1000.0);
        assert_eq!(timeline.cursor_ms(), 0.0);
        assert_eq!(timeline.state(), TimelineState::Idle);
    }

    #[test]
    fn test_reverse_from_complete_heads_to_idle() {
        let t = targets(1);
        let mut timeline = Timeline::new();
        timeline.add_step(fade(t[0], 500)).unwrap();
        timeline.play();
        timeline.tick(500.0);
        assert_eq!(timeline.state(), TimelineState::Complete);

        timeline.reverse();
        assert_eq!(timeline.state(), TimelineState::Running);
        timeline.tick(500.0);
        assert_eq!(timeline.state(), TimelineState::Idle);
    }

    #[test]
    fn test_seek_is_order_independent() {
        let t = targets(2);
        let build = || {
            let mut timeline = Timeline::new();
            timeline
                .add_step(fade(t[0], 800).ease(Easing::EaseOutQuart))
                .unwrap();
            timeline
                .add_step(
                    Keyframe::to(t[1], properties([("x", Value::vw(0.0))]), 1000)
                        .from(properties([("x", Value::vw(80.0))]))
                        .ease(Easing::EaseOutCubic)
                        .offset(Offset::after_previous(-800)),
                )
                .unwrap();
            timeline
        };

        let mut direct = build();
        direct.seek(0.5);

        let mut stepped = build();
        stepped.seek(0.2);
        stepped.seek(0.9);
        stepped.seek(0.5);

        assert_eq!(direct.sample(), stepped.sample());
    }

    #[test]
    fn test_seek_matches_wall_clock_playback() {
        let t = targets(1);
        let mut seeked = Timeline::new();
        seeked.add_step(fade(t[0], 1000).ease(Easing::EaseOutCubic)).unwrap();
        let mut played = seeked.clone();

        seeked.seek(0.25);
        played.play();
        played.tick(250.0);

        assert_eq!(seeked.sample(), played.sample());
    }

    #[test]
    fn test_unstarted_steps_report_start_values() {
        let t = targets(2);
        let mut timeline = Timeline::new();
        timeline.add_step(fade(t[0], 500)).unwrap();
        timeline.add_step(fade(t[1], 500)).unwrap();

        timeline.seek(0.25);
        assert_eq!(opacity_of(&timeline, t[1]), 0.0);
    }

    #[test]
    fn test_active_step_owns_shared_property() {
        let t = targets(1);
        let slide = |from: f32, to: f32| {
            Keyframe::to(t[0], properties([("x", Value::px(to))]), 1000)
                .from(properties([("x", Value::px(from))]))
                .ease(Easing::Linear)
        };
        let mut timeline = Timeline::new();
        timeline.add_step(slide(0.0, 100.0)).unwrap();
        timeline.add_step(slide(100.0, 200.0)).unwrap();

        let x_at = |timeline: &mut Timeline, progress: f32| {
            timeline.seek(progress);
            let frame = timeline.sample();
            assert_eq!(frame.len(), 1);
            frame[0].1["x"]
        };

        assert_eq!(x_at(&mut timeline, 0.0), Value::px(0.0));
        assert_eq!(x_at(&mut timeline, 0.25), Value::px(50.0));
        assert_eq!(x_at(&mut timeline, 0.5), Value::px(100.0));
        assert_eq!(x_at(&mut timeline, 0.75), Value::px(150.0));
        assert_eq!(x_at(&mut timeline, 1.0), Value::px(200.0));
    }

    #[test]
    fn test_pending_start_value_fills_unwritten_property() {
        let t = targets(1);
        let mut timeline = Timeline::new();
        timeline.add_step(fade(t[0], 500)).unwrap();
        timeline
            .add_step(
                Keyframe::to(t[0], properties([("y", Value::px(0.0))]), 500)
                    .from(properties([("y", Value::px(30.0))])),
            )
            .unwrap();

        timeline.seek(0.25);
        let frame = timeline.sample();
        assert_eq!(frame[0].1["y"], Value::px(30.0));
        assert!((frame[0].1["opacity"].value - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_halt_keeps_cursor() {
        let t = targets(1);
        let mut timeline = Timeline::new();
        timeline.add_step(fade(t[0], 1000)).unwrap();
        timeline.play();
        timeline.tick(300.0);
        timeline.halt();

        assert_eq!(timeline.state(), TimelineState::Idle);
        assert!(!timeline.tick(300.0));
        assert_eq!(timeline.cursor_ms(), 300.0);
    }

    #[test]
    fn test_render_clears_flag() {
        let t = targets(1);
        let mut timeline = Timeline::new();
        timeline.add_step(fade(t[0], 1000)).unwrap();
        assert!(timeline.needs_render());

        let frame = timeline.render();
        assert_eq!(frame.len(), 1);
        assert!(!timeline.needs_render());

        timeline.seek(0.5);
        assert!(timeline.needs_render());
    }
}
