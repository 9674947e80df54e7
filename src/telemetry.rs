//! Telemetry utilities for command timing and tracing spans.

use std::time::Instant;

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(&self.command, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use crate::server::CallerId;
    use tracing::{Span, debug_span};

    /// Span covering one dispatch, from resolution to submission.
    pub fn dispatch(caller: Option<CallerId>) -> Span {
        match caller {
            Some(id) => debug_span!("command.dispatch", caller = %id),
            None => debug_span!("command.dispatch", caller = "server"),
        }
    }

    /// Span covering handler execution on the owner thread.
    pub fn invoke(command: &str, caller: &str) -> Span {
        debug_span!("command.invoke", command = %command, caller = %caller)
    }
}
