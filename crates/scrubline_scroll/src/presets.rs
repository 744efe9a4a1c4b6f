//! Landing page scene
//!
//! A pinned hero that drifts apart as it scrolls away, pinned about and
//! gallery sections that assemble on the way in and disperse on the way
//! out, a staggered hero entrance, and reveals for the flowing sections
//! below.

use scrubline_animation::AnimationPreset;
use scrubline_core::value::Value;

use crate::binding::{ExtendBy, ScrollConfig, Scrub};
use crate::config::SceneConfig;
use crate::phase::{PhaseTrack, Ramp};
use crate::reveal::RevealConfig;
use crate::section::SectionConfig;

/// Pinned sections scroll for 130% of the viewport height
pub const SECTION_LENGTH_PERCENT: f32 = 130.0;

/// Scrub lag of the pinned sections
pub const SECTION_SCRUB_LAG_MS: f32 = 600.0;

fn number(from: f32, to: f32) -> Ramp {
    Ramp::new(Value::number(from), Value::number(to))
}

fn vw(from: f32, to: f32) -> Ramp {
    Ramp::new(Value::vw(from), Value::vw(to))
}

fn vh(from: f32, to: f32) -> Ramp {
    Ramp::new(Value::vh(from), Value::vh(to))
}

fn pinned_section(trigger: &str) -> SectionConfig {
    SectionConfig::new(
        ScrollConfig::new(trigger, ExtendBy::ViewportPercent(SECTION_LENGTH_PERCENT))
            .pinned()
            .scrub(Scrub::from_lag(SECTION_SCRUB_LAG_MS)),
    )
}

/// Pre-built landing page sections
pub struct LandingPreset;

impl LandingPreset {
    /// Hero: exit only; text and image slide apart and fade
    pub fn hero_section() -> SectionConfig {
        pinned_section(".hero")
            .track(
                PhaseTrack::new(".hero-text-block")
                    .exiting("x", vw(0.0, -18.0))
                    .exiting("opacity", number(1.0, 0.25)),
            )
            .track(
                PhaseTrack::new(".hero-image")
                    .exiting("x", vw(0.0, 18.0))
                    .exiting("scale", number(1.0, 1.03))
                    .exiting("opacity", number(1.0, 0.35)),
            )
            .track(PhaseTrack::new(".hero-scroll").exiting("opacity", number(1.0, 0.0)))
    }

    pub fn about_section() -> SectionConfig {
        pinned_section(".about")
            .track(
                PhaseTrack::new(".about-headline")
                    .entering("y", vh(-10.0, 0.0))
                    .entering("opacity", number(0.0, 1.0))
                    .exiting("y", vh(0.0, -8.0))
                    .exiting("opacity", number(1.0, 0.25)),
            )
            .track(
                PhaseTrack::new(".about-image")
                    .entering("y", vh(55.0, 0.0))
                    .entering("scale", number(0.96, 1.0))
                    .entering("opacity", number(0.0, 1.0))
                    .exiting("y", vh(0.0, 18.0))
                    .exiting("scale", number(1.0, 1.02))
                    .exiting("opacity", number(1.0, 0.35)),
            )
            .track(
                PhaseTrack::new(".about-body")
                    .entering("x", vw(-10.0, 0.0))
                    .entering("opacity", number(0.0, 1.0))
                    .exiting("x", vw(0.0, -6.0))
                    .exiting("opacity", number(1.0, 0.0)),
            )
    }

    pub fn gallery_section() -> SectionConfig {
        pinned_section(".gallery")
            .track(
                PhaseTrack::new(".gallery-card-1")
                    .entering("x", vw(-60.0, 0.0))
                    .entering("opacity", number(0.0, 1.0))
                    .exiting("x", vw(0.0, 18.0))
                    .exiting("opacity", number(1.0, 0.25)),
            )
            .track(
                PhaseTrack::new(".gallery-card-2")
                    .entering("y", vh(60.0, 0.0))
                    .entering("opacity", number(0.0, 1.0))
                    .exiting("scale", number(1.0, 0.92))
                    .exiting("opacity", number(1.0, 0.25)),
            )
            .track(
                PhaseTrack::new(".gallery-card-3")
                    .entering("x", vw(60.0, 0.0))
                    .entering("opacity", number(0.0, 1.0))
                    .exiting("x", vw(0.0, -18.0))
                    .exiting("opacity", number(1.0, 0.25)),
            )
    }

    pub fn reveal_sections() -> RevealConfig {
        RevealConfig::new(".reveal-section")
    }

    /// The whole page: entrance first, so pinned sections win shared properties
    pub fn scene() -> SceneConfig {
        SceneConfig {
            entrance: AnimationPreset::hero_entrance(),
            sections: vec![
                Self::hero_section(),
                Self::about_section(),
                Self::gallery_section(),
            ],
            reveals: vec![Self::reveal_sections()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::{Phase, PhaseSample};

    #[test]
    fn test_hero_exit_formulas() {
        let hero = LandingPreset::hero_section();
        let image = &hero.tracks[1];

        let halfway = image.values_at(PhaseSample {
            phase: Phase::Exit,
            sub_progress: 0.5,
        });
        assert_eq!(halfway["x"], Value::vw(9.0));
        assert!((halfway["opacity"].value - 0.675).abs() < 1e-5);
        assert!((halfway["scale"].value - 1.015).abs() < 1e-5);
    }

    #[test]
    fn test_about_settles_fully_visible() {
        let about = LandingPreset::about_section();
        for track in &about.tracks {
            assert_eq!(track.settled()["opacity"], Value::number(1.0));
        }
    }

    #[test]
    fn test_scene_validates() {
        let scene = LandingPreset::scene();
        assert!(scene.validate().is_ok());
        assert_eq!(scene.sections.len(), 3);
        assert!(scene.sections.iter().all(|s| s.scroll.pin));
    }
}
