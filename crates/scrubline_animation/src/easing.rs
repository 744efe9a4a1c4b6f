//! Easing functions for animations
//!
//! Curves are addressed by name so scene files can use the spellings people
//! already know: GSAP (`power3.out`), CSS (`ease-out`,
//! `cubic-bezier(.2,.8,.2,1)`) and the long form (`easeOutCubic`).
//!
//! GSAP's `powerN` family is one degree higher than its number:
//! `power1` is quadratic and `power3` is quartic. The CSS `ease-out` keyword
//! maps to the cubic deceleration `1 - (1 - t)^3`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Easing {
    #[default]
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
    CubicBezier(f32, f32, f32, f32),
}

/// Error returned by [`Easing::from_str`] for unregistered names
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownEasing(pub String);

impl fmt::Display for UnknownEasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown easing `{}`", self.0)
    }
}

impl std::error::Error for UnknownEasing {}

/// Ease `t` with the curve registered under `name`.
///
/// Unknown names fall back to linear (with a warning).
pub fn ease(name: &str, t: f32) -> f32 {
    Easing::named(name).apply(t)
}

impl Easing {
    /// Every named curve, for exhaustive checks
    pub const ALL: [Easing; 13] = [
        Easing::Linear,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInQuart,
        Easing::EaseOutQuart,
        Easing::EaseInOutQuart,
        Easing::EaseInQuint,
        Easing::EaseOutQuint,
        Easing::EaseInOutQuint,
    ];

    /// Look up a curve by name, falling back to [`Easing::Linear`].
    pub fn named(name: &str) -> Easing {
        match name.parse() {
            Ok(easing) => easing,
            Err(UnknownEasing(name)) => {
                tracing::warn!("unknown easing `{}`; falling back to linear", name);
                Easing::Linear
            }
        }
    }

    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => ease_in(t, 2),
            Easing::EaseOutQuad => ease_out(t, 2),
            Easing::EaseInOutQuad => ease_in_out(t, 2),
            Easing::EaseInCubic => ease_in(t, 3),
            Easing::EaseOutCubic => ease_out(t, 3),
            Easing::EaseInOutCubic => ease_in_out(t, 3),
            Easing::EaseInQuart => ease_in(t, 4),
            Easing::EaseOutQuart => ease_out(t, 4),
            Easing::EaseInOutQuart => ease_in_out(t, 4),
            Easing::EaseInQuint => ease_in(t, 5),
            Easing::EaseOutQuint => ease_out(t, 5),
            Easing::EaseInOutQuint => ease_in_out(t, 5),
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, *x1, *y1, *x2, *y2),
        }
    }

    /// Canonical name, parseable by [`Easing::from_str`]
    pub fn name(&self) -> String {
        let name = match self {
            Easing::Linear => "linear",
            Easing::EaseInQuad => "easeInQuad",
            Easing::EaseOutQuad => "easeOutQuad",
            Easing::EaseInOutQuad => "easeInOutQuad",
            Easing::EaseInCubic => "easeInCubic",
            Easing::EaseOutCubic => "easeOutCubic",
            Easing::EaseInOutCubic => "easeInOutCubic",
            Easing::EaseInQuart => "easeInQuart",
            Easing::EaseOutQuart => "easeOutQuart",
            Easing::EaseInOutQuart => "easeInOutQuart",
            Easing::EaseInQuint => "easeInQuint",
            Easing::EaseOutQuint => "easeOutQuint",
            Easing::EaseInOutQuint => "easeInOutQuint",
            Easing::CubicBezier(x1, y1, x2, y2) => {
                return format!("cubic-bezier({}, {}, {}, {})", x1, y1, x2, y2)
            }
        };
        name.to_string()
    }
}

impl FromStr for Easing {
    type Err = UnknownEasing;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if let Some(args) = name
            .strip_prefix("cubic-bezier(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_bezier(args).ok_or_else(|| UnknownEasing(s.to_string()));
        }

        let easing = match name {
            "linear" | "none" | "power0" | "power0.out" => Easing::Linear,

            "power1.in" | "quad.in" | "easeInQuad" => Easing::EaseInQuad,
            "power1" | "power1.out" | "quad.out" | "easeOutQuad" => Easing::EaseOutQuad,
            "power1.inOut" | "quad.inOut" | "easeInOutQuad" => Easing::EaseInOutQuad,

            "power2.in" | "cubic.in" | "easeInCubic" | "ease-in" => Easing::EaseInCubic,
            "power2" | "power2.out" | "cubic.out" | "easeOutCubic" | "ease-out" => {
                Easing::EaseOutCubic
            }
            "power2.inOut" | "cubic.inOut" | "easeInOutCubic" | "ease-in-out" => {
                Easing::EaseInOutCubic
            }

            "power3.in" | "quart.in" | "easeInQuart" => Easing::EaseInQuart,
            "power3" | "power3.out" | "quart.out" | "easeOutQuart" => Easing::EaseOutQuart,
            "power3.inOut" | "quart.inOut" | "easeInOutQuart" => Easing::EaseInOutQuart,

            "power4.in" | "quint.in" | "strong.in" | "easeInQuint" => Easing::EaseInQuint,
            "power4" | "power4.out" | "quint.out" | "strong.out" | "easeOutQuint" => {
                Easing::EaseOutQuint
            }
            "power4.inOut" | "quint.inOut" | "strong.inOut" | "easeInOutQuint" => {
                Easing::EaseInOutQuint
            }

            // CSS `ease` keyword
            "ease" => Easing::CubicBezier(0.25, 0.1, 0.25, 1.0),

            _ => return Err(UnknownEasing(s.to_string())),
        };
        Ok(easing)
    }
}

impl From<String> for Easing {
    fn from(name: String) -> Self {
        Easing::named(&name)
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.name()
    }
}

fn parse_bezier(args: &str) -> Option<Easing> {
    let mut parts = args.split(',').map(|p| p.trim().parse::<f32>());
    let x1 = parts.next()?.ok()?;
    let y1 = parts.next()?.ok()?;
    let x2 = parts.next()?.ok()?;
    let y2 = parts.next()?.ok()?;
    if parts.next().is_some() || !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
        return None;
    }
    Some(Easing::CubicBezier(x1, y1, x2, y2))
}

#[inline]
fn ease_in(t: f32, power: i32) -> f32 {
    t.powi(power)
}

#[inline]
fn ease_out(t: f32, power: i32) -> f32 {
    1.0 - (1.0 - t).powi(power)
}

#[inline]
fn ease_in_out(t: f32, power: i32) -> f32 {
    if t < 0.5 {
        2f32.powi(power - 1) * t.powi(power)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(power) / 2.0
    }
}

/// Cubic bezier easing calculation (matches CSS spec / browser implementations).
///
/// Uses Newton-Raphson with binary-search fallback for robustness.
/// Computes in f64 internally to avoid f32 precision jitter.
fn cubic_bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    // Endpoints are always exact
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let x = t as f64;
    let (x1, y1, x2, y2) = (x1 as f64, y1 as f64, x2 as f64, y2 as f64);

    let mut p = x;
    for _ in 0..8 {
        let err = bezier_sample(p, x1, x2) - x;
        if err.abs() < 1e-7 {
            return bezier_sample(p, y1, y2) as f32;
        }
        let slope = bezier_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    // Binary search fallback (always converges)
    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    p = x;
    for _ in 0..20 {
        let val = bezier_sample(p, x1, x2);
        if (val - x).abs() < 1e-7 {
            break;
        }
        if val < x {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    bezier_sample(p, y1, y2) as f32
}

/// B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³, in Horner form
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}
