//! Order flow metrics
//!
//! Recorded through the `metrics` facade; exported by the Prometheus
//! recorder when one is installed, dropped otherwise.

use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Primary order placement to terminal status
    PrimaryFill,
    /// Quote subscription to first usable price
    QuoteFetch,
    /// Whole plan execution
    PlanExecution,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Plans handed to the coordinator
    PlansExecuted,
    /// Plans aborted before protection (connectivity, primary not filled, timeout)
    PlansAborted,
    /// Orders accepted by the gateway
    LegsPlaced,
    /// Orders the gateway refused
    LegsRejected,
    /// Submissions refused because one was already in flight
    SubmissionsRefused,
}

fn latency_name(metric: LatencyMetric) -> &'static str {
    match metric {
        LatencyMetric::PrimaryFill => "bracketdesk_primary_fill_latency_ms",
        LatencyMetric::QuoteFetch => "bracketdesk_quote_fetch_latency_ms",
        LatencyMetric::PlanExecution => "bracketdesk_plan_execution_latency_ms",
    }
}

fn counter_name(metric: CounterMetric) -> &'static str {
    match metric {
        CounterMetric::PlansExecuted => "bracketdesk_plans_executed_total",
        CounterMetric::PlansAborted => "bracketdesk_plans_aborted_total",
        CounterMetric::LegsPlaced => "bracketdesk_legs_placed_total",
        CounterMetric::LegsRejected => "bracketdesk_legs_rejected_total",
        CounterMetric::SubmissionsRefused => "bracketdesk_submissions_refused_total",
    }
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let name = latency_name(metric);
    let value_ms = duration.as_secs_f64() * 1000.0;
    metrics::histogram!(name).record(value_ms);
    tracing::trace!(metric = name, value_ms, "Recording latency");
}

/// Increment a counter by one
pub fn increment(metric: CounterMetric) {
    metrics::counter!(counter_name(metric)).increment(1);
}
