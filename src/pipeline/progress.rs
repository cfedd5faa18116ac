// file: src/pipeline/progress.rs
// description: progress bars and run statistics for cognify
// reference: uses indicatif for progress bars and tracks processing metrics

use crate::pipeline::processor::ProcessedDocument;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub documents_processed: usize,
    pub documents_failed: usize,
    pub chunks_created: usize,
    pub entities_extracted: usize,
    pub total_bytes_processed: u64,
    pub duration_secs: f64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents_per_second(&self) -> f64 {
        rate(self.documents_processed as f64, self.duration_secs)
    }

    pub fn bytes_per_second(&self) -> f64 {
        rate(self.total_bytes_processed as f64, self.duration_secs)
    }

    /// Percentage of attempted documents that made it into the graph.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.documents_processed + self.documents_failed;
        if attempted == 0 {
            return 0.0;
        }
        self.documents_processed as f64 * 100.0 / attempted as f64
    }
}

fn rate(amount: f64, secs: f64) -> f64 {
    if secs > 0.0 { amount / secs } else { 0.0 }
}

#[derive(Default)]
struct Counters {
    processed: AtomicUsize,
    failed: AtomicUsize,
    chunks: AtomicUsize,
    entities: AtomicUsize,
    bytes: AtomicU64,
}

/// Shared between concurrent cognify tasks; every method takes `&self`.
pub struct ProgressTracker {
    documents_bar: ProgressBar,
    status_bar: ProgressBar,
    counters: Counters,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(total_documents: usize) -> Self {
        Self::with_color(total_documents, true)
    }

    pub fn with_color(total_documents: usize, colored: bool) -> Self {
        let bars = MultiProgress::new();
        let documents_bar = bars.add(ProgressBar::new(total_documents as u64));
        documents_bar.set_style(documents_style(colored));

        let status_bar = bars.add(ProgressBar::new(0));
        status_bar.set_style(status_style());

        Self::from_bars(documents_bar, status_bar)
    }

    /// Counts without drawing anything.
    pub fn hidden(total_documents: usize) -> Self {
        let documents_bar = ProgressBar::hidden();
        documents_bar.set_length(total_documents as u64);
        Self::from_bars(documents_bar, ProgressBar::hidden())
    }

    fn from_bars(documents_bar: ProgressBar, status_bar: ProgressBar) -> Self {
        Self {
            documents_bar,
            status_bar,
            counters: Counters::default(),
            started: Instant::now(),
        }
    }

    pub fn set_message(&self, message: String) {
        self.status_bar.set_message(message);
    }

    pub fn record_success(&self, processed: &ProcessedDocument) {
        let c = &self.counters;
        c.chunks.fetch_add(processed.chunks_created, Ordering::Relaxed);
        c.entities.fetch_add(processed.entities_extracted, Ordering::Relaxed);
        c.bytes.fetch_add(processed.bytes, Ordering::Relaxed);
        c.processed.fetch_add(1, Ordering::Relaxed);
        self.advance();
    }

    pub fn record_failure(&self) {
        self.counters.failed.fetch_add(1, Ordering::Relaxed);
        self.advance();
    }

    fn advance(&self) {
        self.documents_bar.inc(1);
        self.status_bar.set_message(format!(
            "Chunks: {} | Entities: {} | Failed: {}",
            self.counters.chunks.load(Ordering::Relaxed),
            self.counters.entities.load(Ordering::Relaxed),
            self.counters.failed.load(Ordering::Relaxed)
        ));
    }

    pub fn finish(&self) {
        self.documents_bar.finish_with_message("Cognify complete");
        self.status_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> PipelineStats {
        let c = &self.counters;
        PipelineStats {
            documents_processed: c.processed.load(Ordering::Relaxed),
            documents_failed: c.failed.load(Ordering::Relaxed),
            chunks_created: c.chunks.load(Ordering::Relaxed),
            entities_extracted: c.entities.load(Ordering::Relaxed),
            total_bytes_processed: c.bytes.load(Ordering::Relaxed),
            duration_secs: self.started.elapsed().as_secs_f64(),
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        if !self.documents_bar.is_finished() {
            self.finish();
        }
    }
}

fn documents_style(colored: bool) -> ProgressStyle {
    let (template, chars) = if colored {
        (
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents ({eta}) {msg}",
            "█▓▒░",
        )
    } else {
        (
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} documents ({eta}) {msg}",
            "=>-",
        )
    };

    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(chars)
}

fn status_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn processed(chunks: usize, entities: usize, bytes: u64) -> ProcessedDocument {
        ProcessedDocument {
            data_id: Uuid::new_v4(),
            nodes: Vec::new(),
            edges: Vec::new(),
            chunks_created: chunks,
            entities_extracted: entities,
            bytes,
        }
    }

    #[test]
    fn test_pipeline_stats_rates() {
        let stats = PipelineStats {
            documents_processed: 9,
            documents_failed: 1,
            total_bytes_processed: 1000,
            duration_secs: 2.0,
            ..PipelineStats::new()
        };

        assert_eq!(stats.documents_per_second(), 4.5);
        assert_eq!(stats.bytes_per_second(), 500.0);
        assert_eq!(stats.success_rate(), 90.0);
    }

    #[test]
    fn test_pipeline_stats_empty_run() {
        let stats = PipelineStats::new();
        assert_eq!(stats.documents_per_second(), 0.0);
        assert_eq!(stats.bytes_per_second(), 0.0);
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn test_tracker_accumulates_documents() {
        let tracker = ProgressTracker::hidden(3);

        tracker.record_success(&processed(2, 5, 1024));
        tracker.record_success(&processed(1, 3, 100));
        tracker.record_failure();

        let stats = tracker.get_stats();
        assert_eq!(stats.documents_processed, 2);
        assert_eq!(stats.documents_failed, 1);
        assert_eq!(stats.chunks_created, 3);
        assert_eq!(stats.entities_extracted, 8);
        assert_eq!(stats.total_bytes_processed, 1124);
    }

    #[test]
    fn test_uncoloured_tracker_finishes_once() {
        let tracker = ProgressTracker::with_color(2, false);
        tracker.record_failure();
        tracker.finish();
        assert_eq!(tracker.get_stats().documents_failed, 1);
    }
}
