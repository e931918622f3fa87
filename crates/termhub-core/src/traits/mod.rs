//! Core traits defined in `termhub-core` and implemented by other crates.

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};
