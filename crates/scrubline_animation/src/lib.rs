//! Scrubline Animation System
//!
//! Named easing, animatable targets, and offset timelines.
//!
//! # Features
//!
//! - **Easing**: GSAP, CSS and long-form curve names, with linear fallback
//! - **Targets**: selector-addressed property snapshots written through the host
//! - **Frame batches**: per-frame staging with last-writer-wins merging
//! - **Timelines**: steps placed with absolute or relative offsets, played by the
//!   clock or seeked by scroll progress
//! - **Presets**: staggered entrance and reveal steps

pub mod easing;
pub mod keyframe;
pub mod presets;
pub mod target;
pub mod timeline;

pub use easing::{ease, Easing};
pub use keyframe::{properties, AnchorEdge, Keyframe, Offset, StepRef};
pub use presets::AnimationPreset;
pub use target::{AnimatableTarget, ApplyReport, FrameBatch, TargetId, TargetRegistry};
pub use timeline::{PlayDirection, StepId, Timeline, TimelineState};
