// file: src/utils/telemetry.rs
// description: health checks and operation timing for the memory stores
// reference: component health reporting

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Ordered from best to worst so a report can take the maximum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Healthy => "✓",
            Self::Degraded => "⚠",
            Self::Unhealthy => "✗",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub component: String,
    pub status: HealthStatus,
    pub message: Option<String>,
    pub response_time_ms: u64,
}

impl HealthCheck {
    fn with_status(
        component: &str,
        status: HealthStatus,
        message: Option<String>,
        response_time: Duration,
    ) -> Self {
        Self {
            component: component.to_string(),
            status,
            message,
            response_time_ms: response_time.as_millis() as u64,
        }
    }

    pub fn degraded(component: &str, message: String, response_time: Duration) -> Self {
        Self::with_status(component, HealthStatus::Degraded, Some(message), response_time)
    }

    pub fn unhealthy(component: &str, message: String, response_time: Duration) -> Self {
        Self::with_status(component, HealthStatus::Unhealthy, Some(message), response_time)
    }

    /// Healthy with the probe's summary, or unhealthy with its error.
    pub fn from_probe(component: &str, probe: Result<String>, response_time: Duration) -> Self {
        match probe {
            Ok(summary) => {
                Self::with_status(component, HealthStatus::Healthy, Some(summary), response_time)
            }
            Err(e) => Self::unhealthy(component, e.to_string(), response_time),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub checks: Vec<HealthCheck>,
    pub checked_at: DateTime<Utc>,
    pub version: String,
}

impl HealthReport {
    pub fn new(checks: Vec<HealthCheck>, version: String) -> Self {
        let overall_status = checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(HealthStatus::Healthy);

        Self {
            overall_status,
            checks,
            checked_at: Utc::now(),
            version,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.overall_status == HealthStatus::Healthy
    }

    pub fn format(&self) -> String {
        let mut output = format!(
            "{} Memory health: {:?}\nVersion: {}\nChecked: {}\n\n",
            self.overall_status.icon(),
            self.overall_status,
            self.version,
            self.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        for check in &self.checks {
            output.push_str(&format!(
                "{} {} - {}ms",
                check.status.icon(),
                check.component,
                check.response_time_ms
            ));
            if let Some(ref msg) = check.message {
                output.push_str(&format!(": {}", msg));
            }
            output.push('\n');
        }

        output
    }
}

/// Times one operation and logs its throughput on completion.
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        info!("Starting operation: {}", operation);
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish_with_count(self, count: usize) -> OperationMetrics {
        let metrics = OperationMetrics::new(&self.operation, count, self.elapsed());
        info!("Completed operation: {}", metrics.format());
        metrics
    }

    pub fn warn_if_slow(&self, threshold: Duration, message: &str) {
        let elapsed = self.elapsed();
        if elapsed > threshold {
            warn!(
                "Slow operation [{}]: {} took {:.2}s (threshold: {:.2}s)",
                self.operation,
                message,
                elapsed.as_secs_f64(),
                threshold.as_secs_f64()
            );
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationMetrics {
    pub operation: String,
    pub items: usize,
    pub duration_ms: u64,
    pub items_per_second: f64,
}

impl OperationMetrics {
    pub fn new(operation: &str, items: usize, duration: Duration) -> Self {
        let secs = duration.as_secs_f64();
        Self {
            operation: operation.to_string(),
            items,
            duration_ms: duration.as_millis() as u64,
            items_per_second: if secs > 0.0 { items as f64 / secs } else { 0.0 },
        }
    }

    pub fn format(&self) -> String {
        format!(
            "{} - {} item(s) in {}ms ({:.2} items/sec)",
            self.operation, self.items, self.duration_ms, self.items_per_second
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MemoryError;

    #[test]
    fn test_overall_status_is_worst_check() {
        let checks = vec![
            HealthCheck::from_probe("graph", Ok("3 nodes".to_string()), Duration::ZERO),
            HealthCheck::degraded("vector", "nothing indexed".to_string(), Duration::ZERO),
        ];
        let report = HealthReport::new(checks, "0.1.0".to_string());
        assert_eq!(report.overall_status, HealthStatus::Degraded);
        assert!(!report.is_healthy());

        let empty = HealthReport::new(Vec::new(), "0.1.0".to_string());
        assert!(empty.is_healthy());
    }

    #[test]
    fn test_health_check_from_probe() {
        let ok = HealthCheck::from_probe("graph", Ok("3 nodes".to_string()), Duration::ZERO);
        assert_eq!(ok.status, HealthStatus::Healthy);
        assert_eq!(ok.message.as_deref(), Some("3 nodes"));

        let failed = HealthCheck::from_probe(
            "vector",
            Err(MemoryError::Database("offline".to_string())),
            Duration::from_millis(7),
        );
        assert_eq!(failed.status, HealthStatus::Unhealthy);
        assert_eq!(failed.response_time_ms, 7);
        assert!(failed.message.as_deref().unwrap_or_default().contains("offline"));

        let report = HealthReport::new(vec![ok, failed], "0.1.0".to_string());
        assert_eq!(report.overall_status, HealthStatus::Unhealthy);
        assert!(report.format().contains("✗ vector"));
    }

    #[test]
    fn test_operation_metrics() {
        let metrics = OperationMetrics::new("cognify", 100, Duration::from_secs(10));
        assert_eq!(metrics.items, 100);
        assert_eq!(metrics.duration_ms, 10_000);
        assert_eq!(metrics.items_per_second, 10.0);

        let instant = OperationMetrics::new("search", 3, Duration::ZERO);
        assert_eq!(instant.items_per_second, 0.0);
    }

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::new("test");
        std::thread::sleep(Duration::from_millis(10));
        let metrics = timer.finish_with_count(1);
        assert!(metrics.duration_ms >= 10);
    }
}
