//! Animation presets for common entrance and reveal patterns

use scrubline_core::host::Selector;
use scrubline_core::value::{PropertyMap, Value};

use crate::easing::Easing;
use crate::keyframe::{properties, Keyframe, Offset};

/// Default reveal length
pub const REVEAL_DURATION_MS: u32 = 800;

/// Default reveal rise distance
pub const REVEAL_DISTANCE_PX: f32 = 30.0;

/// Pre-built step sequences
pub struct AnimationPreset;

impl AnimationPreset {
    // ========================================================================
    // Fade/slide steps
    // ========================================================================

    /// Fade in while sliding horizontally from `dx` to 0
    pub fn fade_slide_x<T>(target: T, dx: Value, duration_ms: u32) -> Keyframe<T> {
        fade_from(target, properties([("x", dx)]), duration_ms)
    }

    /// Fade in while rising from `dy` to 0
    pub fn fade_rise<T>(target: T, dy: Value, duration_ms: u32) -> Keyframe<T> {
        fade_from(target, properties([("y", dy)]), duration_ms)
    }

    // ========================================================================
    // Reveal
    // ========================================================================

    /// Single-step reveal: opacity 0 → 1 while rising `distance_px` → 0
    pub fn reveal<T>(target: T, distance_px: f32, duration_ms: u32) -> Keyframe<T> {
        Self::fade_rise(target, Value::px(distance_px), duration_ms)
    }

    // ========================================================================
    // Staggered entrance
    // ========================================================================

    /// Landing-page hero entrance: eyebrow, headline, subheadline, call to
    /// action, image and scroll hint, each overlapping the one before.
    pub fn hero_entrance() -> Vec<Keyframe<Selector>> {
        vec![
            Self::fade_slide_x(Selector::group(".hero-eyebrow"), Value::px(-40.0), 800),
            Self::fade_rise(Selector::group(".hero-headline"), Value::px(24.0), 800)
                .offset(Offset::after_previous(-500)),
            Self::fade_rise(Selector::group(".hero-subheadline"), Value::px(20.0), 700)
                .offset(Offset::after_previous(-500)),
            Self::fade_rise(Selector::group(".hero-cta"), Value::px(16.0), 600)
                .offset(Offset::after_previous(-400)),
            Keyframe::to(
                Selector::group(".hero-image"),
                properties([
                    ("opacity", Value::number(1.0)),
                    ("x", Value::px(0.0)),
                    ("scale", Value::number(1.0)),
                ]),
                1000,
            )
            .from(properties([
                ("opacity", Value::number(0.0)),
                ("x", Value::px(80.0)),
                ("scale", Value::number(0.98)),
            ]))
            .ease(Easing::EaseOutQuart)
            .offset(Offset::after_previous(-800)),
            Self::fade_rise(Selector::group(".hero-scroll"), Value::px(10.0), 500)
                .offset(Offset::after_previous(-400)),
        ]
    }
}

/// Opacity 0 → 1 plus every `offset` property → 0 in the same unit
fn fade_from<T>(target: T, offset: PropertyMap, duration_ms: u32) -> Keyframe<T> {
    let mut from = properties([("opacity", Value::number(0.0))]);
    let mut to = properties([("opacity", Value::number(1.0))]);
    for (name, value) in offset {
        to.insert(name.clone(), Value::new(0.0, value.unit));
        from.insert(name, value);
    }
    Keyframe::to(target, to, duration_ms)
        .from(from)
        .ease(Easing::EaseOutQuart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::Timeline;
    use crate::target::TargetRegistry;

    #[test]
    fn test_reveal_step_shape() {
        let step = AnimationPreset::reveal((), REVEAL_DISTANCE_PX, REVEAL_DURATION_MS);
        let from = step.from.as_ref().unwrap();

        assert_eq!(from["opacity"], Value::number(0.0));
        assert_eq!(from["y"], Value::px(30.0));
        assert_eq!(step.to["opacity"], Value::number(1.0));
        assert_eq!(step.to["y"], Value::px(0.0));
        assert_eq!(step.duration_ms, 800);
        assert_eq!(step.easing, Easing::EaseOutQuart);
    }

    #[test]
    fn test_hero_entrance_schedule() {
        let mut registry = TargetRegistry::new();
        let mut timeline = Timeline::new();
        let ids: Vec<_> = AnimationPreset::hero_entrance()
            .into_iter()
            .map(|step| {
                let step = step.map_target(|sel| registry.ensure(&sel));
                timeline.add_step(step).unwrap()
            })
            .collect();

        let starts: Vec<f32> = ids
            .iter()
            .map(|&id| timeline.step_start_ms(id).unwrap())
            .collect();
        assert_eq!(starts, vec![0.0, 300.0, 600.0, 900.0, 700.0, 1300.0]);
        assert_eq!(timeline.duration_ms(), 1800.0);
    }
}
