//! Acceptance tests for the TrendWatch executor.
//!
//! These tests run the full sample → analyze → render → actuate pipeline:
//! - Period keeping and deadline compensation on the real monotonic clock
//! - Trend classification end to end through the simulated peripherals
//! - Configuration files as the daemon loads them
//!
//! Timing tests are tolerant by default. The strict jitter test is ignored
//! because it needs an otherwise idle machine (ideally with RT priority).

mod acceptance;
