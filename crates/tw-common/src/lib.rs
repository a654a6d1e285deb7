#![doc = "Common types shared across the TrendWatch workspace."]

pub mod config;
pub mod error;
pub mod metrics;
pub mod time;
pub mod trend;

pub use config::*;
pub use error::*;
pub use metrics::*;
pub use time::*;
pub use trend::*;
