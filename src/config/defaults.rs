//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_server_name() -> String {
    "commandeer".to_string()
}

pub fn default_server_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// =============================================================================
// Command Defaults
// =============================================================================

pub fn default_prefix() -> char {
    '!'
}

/// Deadline for server-originated commands such as save, stop and restart.
pub fn default_blocking_timeout() -> u64 {
    60
}

/// Deadline for quick status queries (help, ver, plugins).
pub fn default_quick_timeout() -> u64 {
    5
}

// =============================================================================
// Marshal Defaults
// =============================================================================

pub fn default_thread_name() -> String {
    "owner".to_string()
}
