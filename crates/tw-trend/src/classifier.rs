//! Block-average trend classifier.

use serde::Serialize;
use tracing::{info, trace, warn};
use tw_common::config::{TrendConfig, MAX_BLOCK_SIZE};
use tw_common::Trend;

/// Outcome of one completed block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlockSummary {
    /// Zero-based index of the completed block.
    pub index: u64,
    /// Arithmetic mean of the block's samples.
    pub average: f32,
    /// Average of the block before this one, if any.
    pub previous: Option<f32>,
    /// `average - previous`, absent for the first block.
    pub delta: Option<f32>,
    /// Classification of this block.
    pub trend: Trend,
}

/// Collects samples into fixed-size blocks and classifies the change between
/// consecutive block averages.
///
/// The buffer is allocated once with capacity `block_size`; ingesting never
/// allocates.
#[derive(Debug, Clone)]
pub struct TrendClassifier {
    buffer: Vec<f32>,
    block_size: usize,
    threshold: f32,
    previous_average: Option<f32>,
    trend: Trend,
    blocks_completed: u64,
    discarded: u64,
}

impl TrendClassifier {
    /// Create a classifier. A `block_size` of zero is treated as one.
    #[must_use]
    pub fn new(block_size: usize, threshold: f32) -> Self {
        let block_size = block_size.max(1);
        Self {
            buffer: Vec::with_capacity(block_size.min(MAX_BLOCK_SIZE)),
            block_size,
            threshold,
            previous_average: None,
            trend: Trend::Stable,
            blocks_completed: 0,
            discarded: 0,
        }
    }

    /// Create a classifier from the `[trend]` configuration table.
    #[must_use]
    pub fn from_config(config: &TrendConfig) -> Self {
        Self::new(config.block_size, config.threshold)
    }

    /// Append one sample.
    ///
    /// Returns the block summary when this sample completes a block; the
    /// buffer is empty again when this returns `Some`. Non-finite samples
    /// are discarded and do not count towards the block.
    pub fn ingest(&mut self, sample: f32) -> Option<BlockSummary> {
        if !sample.is_finite() {
            self.discarded += 1;
            warn!(sample, discarded = self.discarded, "Discarding non-finite sample");
            return None;
        }

        self.buffer.push(sample);
        trace!(fill = self.buffer.len(), block_size = self.block_size, "Block progress");

        if self.buffer.len() < self.block_size {
            return None;
        }

        let average = self.block_average();
        self.buffer.clear();

        let previous = self.previous_average.replace(average);
        let delta = previous.map(|prev| average - prev);
        self.trend = delta.map_or(Trend::Stable, |d| Trend::from_delta(d, self.threshold));

        let summary = BlockSummary {
            index: self.blocks_completed,
            average,
            previous,
            delta,
            trend: self.trend,
        };
        self.blocks_completed += 1;

        match previous {
            Some(prev) => info!(
                block = summary.index,
                previous = prev,
                current = average,
                trend = %self.trend,
                "Block complete"
            ),
            None => info!(
                block = summary.index,
                current = average,
                "First block complete, no reference yet"
            ),
        }

        Some(summary)
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn block_average(&self) -> f32 {
        let sum: f64 = self.buffer.iter().copied().map(f64::from).sum();
        (sum / self.buffer.len() as f64) as f32
    }

    /// Current trend; persists until the next block completes.
    #[must_use]
    pub fn trend(&self) -> Trend {
        self.trend
    }

    /// Samples collected in the current, incomplete block.
    #[must_use]
    pub fn fill(&self) -> usize {
        self.buffer.len()
    }

    /// Samples per block.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Classification threshold.
    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Average of the most recently completed block.
    #[must_use]
    pub fn previous_average(&self) -> Option<f32> {
        self.previous_average
    }

    /// Number of blocks completed so far.
    #[must_use]
    pub fn blocks_completed(&self) -> u64 {
        self.blocks_completed
    }

    /// Number of non-finite samples rejected.
    #[must_use]
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_block(classifier: &mut TrendClassifier, value: f32) -> BlockSummary {
        let mut summary = None;
        for _ in 0..classifier.block_size() {
            summary = classifier.ingest(value);
        }
        summary.expect("block should complete")
    }

    #[test]
    fn test_first_block_is_stable() {
        let mut classifier = TrendClassifier::new(50, 0.05);
        let summary = feed_block(&mut classifier, 30.0);

        assert_eq!(summary.index, 0);
        assert_eq!(summary.trend, Trend::Stable);
        assert!(summary.previous.is_none());
        assert!(summary.delta.is_none());
        assert_eq!(classifier.previous_average(), Some(30.0));
    }

    #[test]
    fn test_rising_block() {
        let mut classifier = TrendClassifier::new(50, 0.05);
        feed_block(&mut classifier, 25.00);
        let summary = feed_block(&mut classifier, 25.10);

        assert_eq!(summary.trend, Trend::Rising);
        assert!(summary.delta.unwrap() > 0.05);
        assert_eq!(classifier.trend(), Trend::Rising);
    }

    #[test]
    fn test_small_drop_is_stable() {
        let mut classifier = TrendClassifier::new(50, 0.05);
        feed_block(&mut classifier, 25.00);
        let summary = feed_block(&mut classifier, 24.97);

        let delta = summary.delta.unwrap();
        assert!((delta + 0.03).abs() < 1e-4);
        assert_eq!(summary.trend, Trend::Stable);
    }

    #[test]
    fn test_falling_block() {
        let mut classifier = TrendClassifier::new(10, 0.05);
        feed_block(&mut classifier, 25.0);
        let summary = feed_block(&mut classifier, 24.8);
        assert_eq!(summary.trend, Trend::Falling);
    }

    #[test]
    fn test_identical_averages_are_stable() {
        let mut classifier = TrendClassifier::new(5, 0.05);
        feed_block(&mut classifier, 25.0);
        feed_block(&mut classifier, 26.0);
        assert_eq!(classifier.trend(), Trend::Rising);

        let summary = feed_block(&mut classifier, 26.0);
        assert_eq!(summary.delta, Some(0.0));
        assert_eq!(summary.trend, Trend::Stable);
    }

    #[test]
    fn test_average_is_mean_and_buffer_resets() {
        let mut classifier = TrendClassifier::new(4, 0.05);
        assert!(classifier.ingest(20.0).is_none());
        assert!(classifier.ingest(21.0).is_none());
        assert!(classifier.ingest(22.5).is_none());
        assert_eq!(classifier.fill(), 3);

        let summary = classifier.ingest(24.5).unwrap();
        assert!((summary.average - 22.0).abs() < 1e-6);
        assert_eq!(classifier.fill(), 0);
    }

    #[test]
    fn test_exactly_two_classifications_for_two_blocks() {
        let mut classifier = TrendClassifier::new(50, 0.05);
        let completed = (0..100)
            .map(|i| 25.0 + i as f32 * 0.001)
            .filter_map(|s| classifier.ingest(s))
            .count();

        assert_eq!(completed, 2);
        assert_eq!(classifier.blocks_completed(), 2);
        assert_eq!(classifier.fill(), 0);
    }

    #[test]
    fn test_trend_persists_between_blocks() {
        let mut classifier = TrendClassifier::new(3, 0.05);
        feed_block(&mut classifier, 20.0);
        feed_block(&mut classifier, 21.0);

        // Partial block of lower values does not change the trend yet
        classifier.ingest(10.0);
        classifier.ingest(10.0);
        assert_eq!(classifier.trend(), Trend::Rising);
    }

    #[test]
    fn test_non_finite_samples_are_discarded() {
        let mut classifier = TrendClassifier::new(2, 0.05);
        assert!(classifier.ingest(f32::NAN).is_none());
        assert!(classifier.ingest(f32::INFINITY).is_none());
        assert_eq!(classifier.fill(), 0);
        assert_eq!(classifier.discarded(), 2);

        classifier.ingest(25.0);
        let summary = classifier.ingest(25.0).unwrap();
        assert_eq!(summary.average, 25.0);
    }

    #[test]
    fn test_huge_block_size_does_not_preallocate() {
        let mut classifier = TrendClassifier::new(usize::MAX / 2, 0.05);
        assert_eq!(classifier.block_size(), usize::MAX / 2);
        assert!(classifier.ingest(25.0).is_none());
        assert_eq!(classifier.fill(), 1);
    }

    #[test]
    fn test_zero_block_size_clamped() {
        let mut classifier = TrendClassifier::new(0, 0.05);
        assert_eq!(classifier.block_size(), 1);
        assert!(classifier.ingest(1.0).is_some());
    }
}
