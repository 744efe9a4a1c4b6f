//! Error types

use thiserror::Error;

/// Registration-time configuration errors.
///
/// These fail fast before any tick runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Trigger region is empty or inverted
    #[error("invalid trigger region: start {start} must be less than end {end}")]
    InvalidRegion { start: f32, end: f32 },

    /// Relative offset names a step that does not exist (yet)
    #[error("timeline offset references unknown step `{0}`")]
    DanglingAnchor(String),

    /// Two steps share the same tag
    #[error("duplicate timeline step tag `{0}`")]
    DuplicateTag(String),

    /// Phase bounds out of order or outside (0, 1)
    #[error("invalid phase bounds: entrance end {entrance_end} and exit start {exit_start} must satisfy 0 < entrance_end < exit_start < 1")]
    InvalidPhaseBounds { entrance_end: f32, exit_start: f32 },

    /// Scrub smoothing factor outside (0, 1]
    #[error("invalid scrub factor {0}: must be in (0, 1]")]
    InvalidScrub(f32),

    /// `scrub = false`: section progress always follows the scroll offset
    #[error("scrub cannot be disabled on a scroll section")]
    ScrubDisabled,

    /// Step or reveal duration is not a positive finite number
    #[error("invalid duration {0}ms")]
    InvalidDuration(f32),

    /// Trigger selector resolved to no element at registration
    #[error("trigger `{0}` did not resolve to any element")]
    TriggerNotFound(String),

    /// Trigger element has no layout box
    #[error("trigger `{0}` has no bounds")]
    TriggerHasNoBounds(String),

    /// Malformed value string
    #[error("invalid value `{0}`")]
    InvalidValue(String),

    /// Malformed start/end anchor string
    #[error("invalid anchor `{0}`")]
    InvalidAnchor(String),
}

/// Failure writing a property to a host element
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WriteError {
    /// Element no longer exists
    #[error("element {0} is gone")]
    Detached(String),

    /// Host rejected the property
    #[error("property `{property}` rejected: {reason}")]
    Rejected { property: String, reason: String },
}

/// Frame clock acquisition failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClockError {
    /// No frame source is available
    #[error("frame clock unavailable: {0}")]
    Unavailable(String),

    /// Clock is already owned by another orchestrator
    #[error("frame clock already acquired")]
    AlreadyAcquired,
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
