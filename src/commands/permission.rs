//! Permission ranks.

use serde::Deserialize;
use std::fmt;

/// A caller's position in the authorization scale.
///
/// Variants are declared lowest first so the derived ordering is the rank
/// ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    #[default]
    None,
    Scripter,
    Moderator,
    SpaceMaster,
    Admin,
    Owner,
}

impl PermissionLevel {
    /// True if this rank satisfies `required`.
    #[inline]
    pub fn satisfies(self, required: PermissionLevel) -> bool {
        self >= required
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Scripter => "Scripter",
            Self::Moderator => "Moderator",
            Self::SpaceMaster => "SpaceMaster",
            Self::Admin => "Admin",
            Self::Owner => "Owner",
        };
        f.write_str(name)
    }
}
