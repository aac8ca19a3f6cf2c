/// Countdown module
///
/// This module handles everything time related:
/// - Reading the current instant (clock.rs)
/// - Projecting instants into a zone's wall clock (timezone.rs)
/// - Computing the remaining time until the new year (calculator.rs)
/// - Recomputing on a fixed, cancelable tick (ticker.rs)

pub mod calculator;
pub mod clock;
pub mod ticker;
pub mod timezone;

pub use calculator::{compute_countdown, next_target_year, world_countdowns, CountdownResult};
pub use clock::SystemClock;
pub use ticker::{CountdownTarget, CountdownTicker};
pub use timezone::SystemProjector;
