//! Prometheus metrics collection for commandeer.
//!
//! Metrics are no-ops until [`init`] has been called, so library users that
//! don't care about them pay nothing.
//!
//! - `commandeer_command_total{command}` - Commands executed by path
//! - `commandeer_command_duration_seconds{command}` - Handler latency
//! - `commandeer_command_errors_total{command, error}` - Dispatch failures
//! - `commandeer_registered_commands` - Commands in the tree
//! - `commandeer_marshal_queue_depth{marshal}` - Actions waiting on the owner thread
//! - `commandeer_owner_reentry_total{marshal}` - Submissions made from the owner thread
//! - `commandeer_chat_messages_total{kind}` - Inbound chat by routing outcome

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Command metrics
// ========================================================================

/// Commands executed by path.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Handler latency by path.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Dispatch failures by path and error kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Commands currently registered.
pub static REGISTERED_COMMANDS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Owner-thread metrics
// ========================================================================

pub static MARSHAL_QUEUE_DEPTH: OnceLock<IntGaugeVec> = OnceLock::new();

pub static OWNER_REENTRY: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Transport metrics
// ========================================================================

pub static CHAT_MESSAGES: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup before any metrics are recorded. Later calls are
/// harmless.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                let m = $init.expect(concat!(stringify!($metric), " creation failed"));
                if let Err(e) = r.register(Box::new(m.clone())) {
                    tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                }
                let _ = $metric.set(m);
            }
        };
    }

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("commandeer_command_total", "Commands executed by path"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("commandeer_command_duration_seconds", "Command handler latency by path")
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("commandeer_command_errors_total", "Dispatch failures by path and kind"), &["command", "error"]));
    register!(REGISTERED_COMMANDS, IntGauge::new("commandeer_registered_commands", "Commands in the command tree"));
    register!(MARSHAL_QUEUE_DEPTH, IntGaugeVec::new(Opts::new("commandeer_marshal_queue_depth", "Actions waiting on the owner thread"), &["marshal"]));
    register!(OWNER_REENTRY, IntCounterVec::new(Opts::new("commandeer_owner_reentry_total", "Submissions made from the owner thread"), &["marshal"]));
    register!(CHAT_MESSAGES, IntCounterVec::new(Opts::new("commandeer_chat_messages_total", "Inbound chat messages by routing outcome"), &["kind"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[command]).inc();
    }
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

/// Record a dispatch failure.
#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, error]).inc();
    }
}

#[inline]
pub fn set_registered_commands(count: usize) {
    if let Some(g) = REGISTERED_COMMANDS.get() {
        g.set(count as i64);
    }
}

#[inline]
pub fn set_marshal_depth(marshal: &str, depth: usize) {
    if let Some(g) = MARSHAL_QUEUE_DEPTH.get() {
        g.with_label_values(&[marshal]).set(depth as i64);
    }
}

#[inline]
pub fn record_owner_reentry(marshal: &str) {
    if let Some(c) = OWNER_REENTRY.get() {
        c.with_label_values(&[marshal]).inc();
    }
}

/// Record how an inbound chat message was routed (`command`, `chat`, `dropped`).
#[inline]
pub fn record_chat_message(kind: &str) {
    if let Some(c) = CHAT_MESSAGES.get() {
        c.with_label_values(&[kind]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();
        init();

        record_command("save", 0.001);
        record_command_error("stop", "unauthorized");

        let output = gather_metrics();
        assert!(output.contains("commandeer_command_total"));
        assert!(output.contains("commandeer_command_errors_total"));
    }
}
