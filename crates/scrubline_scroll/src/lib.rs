//! Scrubline Scroll Orchestration
//!
//! Maps a continuous scroll offset to per-section progress and drives the
//! animations bound to it.
//!
//! # Features
//!
//! - **Scroll bindings**: trigger regions from element layout, exponential
//!   scrub smoothing, pinning
//! - **Phases**: entrance/steady/exit segmentation with per-target ramps
//! - **Reveals**: intersection-triggered timelines that reverse on the way back
//! - **Orchestrator**: registration-ordered, batched per-frame evaluation
//! - **Scenes**: TOML scene files and a landing page preset
//! - **Headless**: in-memory viewport, store and clock
//!
//! # Example
//!
//! ```
//! use scrubline_core::host::{Rect, Size};
//! use scrubline_core::value::Value;
//! use scrubline_scroll::headless::{HeadlessPage, ManualClock};
//! use scrubline_scroll::{ExtendBy, Orchestrator, PhaseTrack, Ramp, ScrollConfig, SectionConfig};
//!
//! let mut page = HeadlessPage::new(Size::new(1280.0, 800.0));
//! page.add(&[".about"], Rect::new(0.0, 0.0, 1280.0, 800.0));
//! let body = page.add(&[".about-body"], Rect::new(90.0, 600.0, 500.0, 100.0));
//! let (viewport, store) = page.into_parts();
//!
//! let mut orchestrator = Orchestrator::new(viewport, store, ManualClock::new()).unwrap();
//! let section = SectionConfig::new(ScrollConfig::new(".about", ExtendBy::Px(1000.0)))
//!     .track(PhaseTrack::new(".about-body").entering("opacity", Ramp::new(Value::number(0.0), Value::number(1.0))));
//! orchestrator.register_scroll_section(section, None).unwrap();
//!
//! orchestrator.viewport_mut().scroll_to(150.0);
//! orchestrator.tick();
//!
//! assert_eq!(orchestrator.store().property(body, "opacity"), Some(Value::number(0.5)));
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod headless;
pub mod orchestrator;
pub mod phase;
pub mod presets;
pub mod reveal;
pub mod section;

pub use binding::{BindingFrame, ExtendBy, ScrollBinding, ScrollConfig, Scrub, StartAnchor, TriggerRegion};
pub use config::{SceneConfig, SceneError, SceneHandles};
pub use error::OrchestratorError;
pub use orchestrator::{DriverHandle, Orchestrator};
pub use phase::{Phase, PhaseEvaluator, PhaseMotion, PhaseSample, PhaseTrack, Ramp};
pub use presets::LandingPreset;
pub use reveal::{RevealConfig, RevealController, RevealState};
pub use section::{ProgressCallback, ProgressUpdate, SectionConfig};
