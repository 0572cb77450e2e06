//! Per-tool invocation health.
//!
//! Sliding-window success rate and latency for every registered tool, with a
//! circuit-breaker indicator once too many failures land inside a time
//! window. The indicator is reported through `health_check`; it does not
//! block invocations.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::types::FailureKind;

// =============================================================================
// Configuration
// =============================================================================

/// Health assessment thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Minimum success rate for `healthy` (default: 0.95).
    pub success_rate_healthy: f64,
    /// Minimum success rate for `degraded` (default: 0.80).
    pub success_rate_degraded: f64,
    /// Maximum average latency (ms) for `healthy` (default: 2000).
    pub latency_healthy_ms: u64,
    /// Maximum average latency (ms) for `degraded` (default: 5000).
    pub latency_degraded_ms: u64,
    /// Invocations needed before a tool is assessed (default: 5).
    pub min_calls_for_assessment: usize,
    /// Failures inside `circuit_break_window` that open the breaker (default: 5).
    pub circuit_break_error_threshold: usize,
    /// Breaker window (default: 60s, matching the upstream recovery timeout).
    #[serde(with = "humantime_serde")]
    pub circuit_break_window: Duration,
    /// Invocations kept per tool (default: 100).
    pub window_size: usize,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            success_rate_healthy: 0.95,
            success_rate_degraded: 0.80,
            latency_healthy_ms: 2000,
            latency_degraded_ms: 5000,
            min_calls_for_assessment: 5,
            circuit_break_error_threshold: 5,
            circuit_break_window: Duration::from_secs(60),
            window_size: 100,
        }
    }
}

/// Health classification for a tool or the whole server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

impl HealthStatus {
    fn rank(self) -> u8 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 2,
            HealthStatus::Unknown => 3,
        }
    }

    fn worse(self, other: HealthStatus) -> HealthStatus {
        if self.rank() >= other.rank() {
            self
        } else {
            other
        }
    }
}

// =============================================================================
// Invocation records
// =============================================================================

#[derive(Debug, Clone)]
struct InvocationRecord {
    failure: Option<FailureKind>,
    status: Option<u16>,
    latency_ms: u64,
    at: Instant,
}

impl InvocationRecord {
    fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug)]
struct ToolWindow {
    records: VecDeque<InvocationRecord>,
    capacity: usize,
}

impl ToolWindow {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, record: InvocationRecord) {
        if self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn success_rate(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let ok = self.records.iter().filter(|r| r.succeeded()).count();
        ok as f64 / self.records.len() as f64
    }

    fn avg_latency_ms(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.records.iter().map(|r| r.latency_ms).sum();
        sum as f64 / self.records.len() as f64
    }

    fn failures_since(&self, window: Duration) -> usize {
        let now = Instant::now();
        self.records
            .iter()
            .filter(|r| !r.succeeded() && now.duration_since(r.at) <= window)
            .count()
    }

    fn failure_patterns(&self) -> Vec<(FailureKind, usize)> {
        let mut counts: HashMap<FailureKind, usize> = HashMap::new();
        for kind in self.records.iter().filter_map(|r| r.failure) {
            *counts.entry(kind).or_default() += 1;
        }
        let mut patterns: Vec<_> = counts.into_iter().collect();
        patterns.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
        patterns
    }

    fn last_status(&self) -> Option<u16> {
        self.records.iter().rev().find_map(|r| r.status)
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Health of one tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolHealthReport {
    pub tool: String,
    pub status: HealthStatus,
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub total_calls: usize,
    pub recent_failures: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_upstream_status: Option<u16>,
    pub failure_patterns: Vec<(FailureKind, usize)>,
    pub issues: Vec<String>,
    pub circuit_open: bool,
}

/// Health of every tool plus an overall status.
#[derive(Debug, Clone, Serialize)]
pub struct SystemHealthReport {
    pub status: HealthStatus,
    pub tools: Vec<ToolHealthReport>,
    pub summary: HealthSummary,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthSummary {
    pub healthy: usize,
    pub degraded: usize,
    pub unhealthy: usize,
    pub unknown: usize,
}

// =============================================================================
// Tracker
// =============================================================================

/// In-memory health tracker. The bridge wraps it in a mutex.
#[derive(Debug)]
pub struct ToolHealthTracker {
    config: HealthConfig,
    windows: HashMap<String, ToolWindow>,
    registered: Vec<String>,
}

impl ToolHealthTracker {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            windows: HashMap::new(),
            registered: Vec::new(),
        }
    }

    /// Tools reported even before their first invocation.
    pub fn set_registered_tools(&mut self, tools: Vec<String>) {
        self.registered = tools;
    }

    /// Record one finished invocation. `failure` is `None` on success.
    pub fn record(
        &mut self,
        tool: &str,
        failure: Option<FailureKind>,
        status: Option<u16>,
        latency: Duration,
    ) {
        let capacity = self.config.window_size;
        self.windows
            .entry(tool.to_string())
            .or_insert_with(|| ToolWindow::new(capacity))
            .push(InvocationRecord {
                failure,
                status,
                latency_ms: latency.as_millis() as u64,
                at: Instant::now(),
            });
    }

    pub fn check_tool(&self, tool: &str) -> ToolHealthReport {
        let Some(window) = self.windows.get(tool) else {
            return ToolHealthReport {
                tool: tool.to_string(),
                status: HealthStatus::Unknown,
                success_rate: 0.0,
                avg_latency_ms: 0.0,
                total_calls: 0,
                recent_failures: 0,
                last_upstream_status: None,
                failure_patterns: Vec::new(),
                issues: vec!["No invocations yet".to_string()],
                circuit_open: false,
            };
        };

        let total = window.len();
        let success_rate = window.success_rate();
        let avg_latency = window.avg_latency_ms();
        let recent_failures = window.failures_since(self.config.circuit_break_window);
        let circuit_open = recent_failures >= self.config.circuit_break_error_threshold;

        let mut issues = Vec::new();
        let status = if total < self.config.min_calls_for_assessment {
            issues.push(format!(
                "Insufficient data ({}/{})",
                total, self.config.min_calls_for_assessment
            ));
            HealthStatus::Unknown
        } else {
            let by_rate = if success_rate >= self.config.success_rate_healthy {
                HealthStatus::Healthy
            } else if success_rate >= self.config.success_rate_degraded {
                HealthStatus::Degraded
            } else {
                HealthStatus::Unhealthy
            };
            let by_latency = if avg_latency <= self.config.latency_healthy_ms as f64 {
                HealthStatus::Healthy
            } else if avg_latency <= self.config.latency_degraded_ms as f64 {
                HealthStatus::Degraded
            } else {
                HealthStatus::Unhealthy
            };

            if success_rate < self.config.success_rate_healthy {
                issues.push(format!(
                    "Success rate {:.1}% below {:.0}%",
                    success_rate * 100.0,
                    self.config.success_rate_healthy * 100.0
                ));
            }
            if avg_latency > self.config.latency_healthy_ms as f64 {
                issues.push(format!(
                    "Average latency {:.0}ms above {}ms",
                    avg_latency, self.config.latency_healthy_ms
                ));
            }
            by_rate.worse(by_latency)
        };

        if circuit_open {
            issues.push(format!(
                "Circuit open: {} failures in the last {}s",
                recent_failures,
                self.config.circuit_break_window.as_secs()
            ));
        }

        ToolHealthReport {
            tool: tool.to_string(),
            status,
            success_rate,
            avg_latency_ms: avg_latency,
            total_calls: total,
            recent_failures,
            last_upstream_status: window.last_status(),
            failure_patterns: window.failure_patterns(),
            issues,
            circuit_open,
        }
    }

    pub fn is_circuit_open(&self, tool: &str) -> bool {
        self.windows
            .get(tool)
            .map(|w| {
                w.failures_since(self.config.circuit_break_window)
                    >= self.config.circuit_break_error_threshold
            })
            .unwrap_or(false)
    }

    /// Report for registered tools (declaration order) then any others seen.
    pub fn check_system(&self) -> SystemHealthReport {
        let mut names = self.registered.clone();
        let mut extra: Vec<&String> = self
            .windows
            .keys()
            .filter(|name| !self.registered.contains(name))
            .collect();
        extra.sort();
        names.extend(extra.into_iter().cloned());

        let tools: Vec<ToolHealthReport> = names.iter().map(|n| self.check_tool(n)).collect();

        let mut summary = HealthSummary::default();
        for report in &tools {
            match report.status {
                HealthStatus::Healthy => summary.healthy += 1,
                HealthStatus::Degraded => summary.degraded += 1,
                HealthStatus::Unhealthy => summary.unhealthy += 1,
                HealthStatus::Unknown => summary.unknown += 1,
            }
        }

        let status = if summary.unhealthy > 0 {
            HealthStatus::Unhealthy
        } else if summary.degraded > 0 {
            HealthStatus::Degraded
        } else if summary.healthy > 0 {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unknown
        };

        SystemHealthReport {
            status,
            tools,
            summary,
        }
    }
}

impl Default for ToolHealthTracker {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}

// =============================================================================
// Tests
// =============================================================================
