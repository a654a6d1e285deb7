//! Trend detection over a stream of scalar samples.
//!
//! Samples are collected into fixed-size blocks. When a block fills, its
//! average is compared with the previous block's average:
//!
//! - delta above `+threshold` is [`Trend::Rising`]
//! - delta below `-threshold` is [`Trend::Falling`]
//! - anything else, including the very first block, is [`Trend::Stable`]
//!
//! # Example
//!
//! ```
//! use tw_trend::TrendClassifier;
//! use tw_common::Trend;
//!
//! let mut classifier = TrendClassifier::new(2, 0.05);
//!
//! // First block: no reference, stays stable
//! classifier.ingest(25.0);
//! let first = classifier.ingest(25.0).unwrap();
//! assert_eq!(first.trend, Trend::Stable);
//!
//! // Second block rose by 0.1
//! classifier.ingest(25.1);
//! let second = classifier.ingest(25.1).unwrap();
//! assert_eq!(second.trend, Trend::Rising);
//! assert_eq!(classifier.trend(), Trend::Rising);
//! ```

pub mod classifier;

pub use classifier::{BlockSummary, TrendClassifier};
pub use tw_common::Trend;
