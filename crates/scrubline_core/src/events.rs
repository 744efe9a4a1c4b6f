//! Viewport events
//!
//! Transitions reported by the viewport collaborator and emitted by scroll bindings.

use serde::{Deserialize, Serialize};

use crate::host::{ElementId, ObserverId};

/// Direction the document was scrolling when a transition happened
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScrollDirection {
    /// Element arrived from, or left toward, the top of the viewport
    FromAbove,
    /// Element arrived from, or left toward, the bottom of the viewport
    FromBelow,
}

impl ScrollDirection {
    /// Direction implied by a scroll delta.
    ///
    /// Scrolling down (positive delta) brings content in from below.
    pub fn from_delta(delta: f32) -> Self {
        if delta >= 0.0 {
            ScrollDirection::FromBelow
        } else {
            ScrollDirection::FromAbove
        }
    }
}

/// Whether an observed element crossed into or out of the viewport
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntersectionKind {
    Entered,
    Exited,
}

/// An intersection transition for one subscription
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntersectionEvent {
    pub observer: ObserverId,
    pub kind: IntersectionKind,
    pub direction: ScrollDirection,
}

impl IntersectionEvent {
    pub fn entered(observer: ObserverId, direction: ScrollDirection) -> Self {
        Self {
            observer,
            kind: IntersectionKind::Entered,
            direction,
        }
    }

    pub fn exited(observer: ObserverId, direction: ScrollDirection) -> Self {
        Self {
            observer,
            kind: IntersectionKind::Exited,
            direction,
        }
    }
}

/// Pin state change of a scroll binding's trigger element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinTransition {
    Pinned(ElementId),
    Released(ElementId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_delta() {
        assert_eq!(ScrollDirection::from_delta(12.0), ScrollDirection::FromBelow);
        assert_eq!(ScrollDirection::from_delta(-3.0), ScrollDirection::FromAbove);
        assert_eq!(ScrollDirection::from_delta(0.0), ScrollDirection::FromBelow);
    }
}
