#![doc = "Deterministic cyclic executor for TrendWatch."]

pub mod context;
pub mod executor;
pub mod realtime;
pub mod slots;

pub use context::*;
pub use executor::*;
pub use realtime::*;
pub use slots::*;
