//! Static identity table configuration.

use crate::commands::PermissionLevel;
use serde::Deserialize;

/// One `[[identity]]` block: a known caller and their rank.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEntry {
    /// Caller id as delivered by the transport.
    pub id: u64,
    /// Display name used in logs.
    pub name: String,
    /// Permission rank (e.g. "none", "moderator", "admin").
    #[serde(default)]
    pub level: PermissionLevel,
}
