/// Shared formatting helpers (user labels, warning progress, button labels).
pub mod formatting;
/// Bio link detection.
pub mod link;
/// Single source of truth for the command prefix.
pub const COMMAND_PREFIX: char = '/';
/// Per-group sliding-window throttle for bio checks.
pub mod throttle;

pub use link::{LinkDetector, contains_link};
pub use throttle::SlidingWindowThrottle;
