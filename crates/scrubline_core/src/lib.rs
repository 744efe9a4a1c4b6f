//! Scrubline Core
//!
//! Foundational primitives shared by the animation and scroll crates:
//!
//! - **Values**: numbers with an optional CSS-style unit tag and linear interpolation
//! - **Host collaborators**: traits for element lookup/writes, the viewport, and the frame clock
//! - **Events**: intersection and pin transitions reported by the viewport
//! - **State Machines**: small typed transition tables used by reveal playback
//! - **Errors**: the configuration/runtime error taxonomy
//!
//! # Example
//!
//! ```rust
//! use scrubline_core::value::{Unit, Value};
//!
//! let from: Value = "-18vw".parse().unwrap();
//! let to = Value::new(0.0, Unit::Vw);
//!
//! assert_eq!(from.lerp(to, 0.5), Value::new(-9.0, Unit::Vw));
//! ```

pub mod error;
pub mod events;
pub mod fsm;
pub mod host;
pub mod value;

pub use error::{ClockError, ConfigError, WriteError};
pub use events::{IntersectionEvent, IntersectionKind, PinTransition, ScrollDirection};
pub use fsm::{StateMachine, Transition};
pub use host::{ElementId, ElementList, ElementStore, FrameClock, ObserverId, Rect, Selector, Size, Viewport};
pub use value::{lerp, lerp_properties, PropertyMap, Unit, Value};
