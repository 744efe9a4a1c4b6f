//! Unit-tagged animation values
//!
//! Property values are plain numbers with an optional unit tag (`18vw`,
//! `-10vh`, `30px`). Interpolation works on the magnitude and carries the
//! unit through, so viewport-relative lengths stay viewport-relative.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Ordered mapping of property name to value.
///
/// Insertion order is the order properties are written to elements.
pub type PropertyMap = IndexMap<String, Value>;

/// Linear interpolation between two numbers
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Interpolate every property of `to`, starting from the matching entry of `from`.
///
/// A property missing from `from` jumps straight to its target value.
pub fn lerp_properties(from: &PropertyMap, to: &PropertyMap, t: f32) -> PropertyMap {
    to.iter()
        .map(|(name, target)| {
            let value = match from.get(name) {
                Some(start) => start.lerp(*target, t),
                None => *target,
            };
            (name.clone(), value)
        })
        .collect()
}

/// Unit tag carried by a [`Value`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Unitless number (opacity, scale)
    #[default]
    None,
    /// CSS pixels
    Px,
    /// Percent of the element's own size
    Percent,
    /// Percent of viewport width
    Vw,
    /// Percent of viewport height
    Vh,
    /// Degrees
    Deg,
}

impl Unit {
    pub fn suffix(&self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::Px => "px",
            Unit::Percent => "%",
            Unit::Vw => "vw",
            Unit::Vh => "vh",
            Unit::Deg => "deg",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Unit> {
        match suffix {
            "" => Some(Unit::None),
            "px" => Some(Unit::Px),
            "%" => Some(Unit::Percent),
            "vw" => Some(Unit::Vw),
            "vh" => Some(Unit::Vh),
            "deg" => Some(Unit::Deg),
            _ => None,
        }
    }
}

/// A numeric property value with a unit tag
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ValueRepr", into = "String")]
pub struct Value {
    pub value: f32,
    pub unit: Unit,
}

impl Value {
    pub const fn new(value: f32, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Unitless number
    pub const fn number(value: f32) -> Self {
        Self::new(value, Unit::None)
    }

    pub const fn px(value: f32) -> Self {
        Self::new(value, Unit::Px)
    }

    pub const fn vw(value: f32) -> Self {
        Self::new(value, Unit::Vw)
    }

    pub const fn vh(value: f32) -> Self {
        Self::new(value, Unit::Vh)
    }

    /// Interpolate toward `to`, keeping the unit tag.
    ///
    /// A unitless endpoint adopts the other endpoint's unit (`0` → `18vw`).
    /// Two different concrete units interpolate in the target's unit.
    pub fn lerp(self, to: Value, t: f32) -> Value {
        let unit = match (self.unit, to.unit) {
            (a, b) if a == b => a,
            (Unit::None, b) => b,
            (a, Unit::None) => a,
            (a, b) => {
                tracing::warn!(
                    "interpolating between mismatched units {:?} and {:?}; using {:?}",
                    a,
                    b,
                    b
                );
                b
            }
        };
        Value::new(lerp(self.value, to.value, t), unit)
    }

    /// Resolve to pixels given a viewport size (`vw`/`vh` only; other units pass through)
    pub fn to_px(&self, viewport_width: f32, viewport_height: f32) -> f32 {
        match self.unit {
            Unit::Vw => self.value * viewport_width / 100.0,
            Unit::Vh => self.value * viewport_height / 100.0,
            _ => self.value,
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::number(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for Value {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_alphabetic() || c == '%')
            .unwrap_or(trimmed.len());
        let (number, suffix) = trimmed.split_at(split);

        let value: f32 = number
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(s.to_string()))?;
        let unit = Unit::from_suffix(suffix.trim().to_ascii_lowercase().as_str())
            .ok_or_else(|| ConfigError::InvalidValue(s.to_string()))?;

        Ok(Value::new(value, unit))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ValueRepr {
    Number(f32),
    Text(String),
}

impl TryFrom<ValueRepr> for Value {
    type Error = ConfigError;

    fn try_from(repr: ValueRepr) -> Result<Self, Self::Error> {
        match repr {
            ValueRepr::Number(n) => Ok(Value::number(n)),
            ValueRepr::Text(s) => s.parse(),
        }
    }
}

impl From<Value> for String {
    fn from(value: Value) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!("18vw".parse::<Value>().unwrap(), Value::vw(18.0));
        assert_eq!("-10vh".parse::<Value>().unwrap(), Value::vh(-10.0));
        assert_eq!("30px".parse::<Value>().unwrap(), Value::px(30.0));
        assert_eq!("0.5".parse::<Value>().unwrap(), Value::number(0.5));
        assert_eq!(
            "130%".parse::<Value>().unwrap(),
            Value::new(130.0, Unit::Percent)
        );
        assert!("12furlongs".parse::<Value>().is_err());
        assert!("vw".parse::<Value>().is_err());
    }

    #[test]
    fn test_lerp_preserves_unit() {
        let a = Value::vw(-60.0);
        let b = Value::vw(0.0);
        assert_eq!(a.lerp(b, 0.25), Value::vw(-45.0));
    }

    #[test]
    fn test_unitless_endpoint_adopts_unit() {
        let a = Value::number(0.0);
        let b = Value::vw(18.0);
        assert_eq!(a.lerp(b, 0.5), Value::vw(9.0));
        assert_eq!(b.lerp(a, 0.5), Value::vw(9.0));
    }

    #[test]
    fn test_lerp_properties_missing_start_jumps() {
        let mut from = PropertyMap::new();
        from.insert("opacity".into(), Value::number(0.0));

        let mut to = PropertyMap::new();
        to.insert("opacity".into(), Value::number(1.0));
        to.insert("y".into(), Value::px(0.0));

        let mid = lerp_properties(&from, &to, 0.5);
        assert_eq!(mid["opacity"], Value::number(0.5));
        assert_eq!(mid["y"], Value::px(0.0));
    }

    #[test]
    fn test_to_px() {
        assert_eq!(Value::vw(10.0).to_px(1200.0, 800.0), 120.0);
        assert_eq!(Value::vh(50.0).to_px(1200.0, 800.0), 400.0);
        assert_eq!(Value::px(7.0).to_px(1200.0, 800.0), 7.0);
    }

    #[test]
    fn test_serde_number_or_string() {
        let values: Vec<Value> = serde_json::from_str(r#"[1, "18vw", "-0.5"]"#).unwrap();
        assert_eq!(
            values,
            vec![Value::number(1.0), Value::vw(18.0), Value::number(-0.5)]
        );
        assert_eq!(serde_json::to_string(&Value::vh(55.0)).unwrap(), r#""55vh""#);
    }
}
