//! Server context and the collaborators commands depend on.
//!
//! The [`ServerContext`] is built once at startup and passed to every
//! component that needs it. Identity resolution, lifecycle hooks and plugin
//! attribution live behind traits; this crate only consumes them.

use crate::commands::PermissionLevel;
use crate::config::IdentityEntry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Opaque caller identity as delivered by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallerId(pub u64);

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: CallerId,
    pub name: String,
    pub level: PermissionLevel,
}

/// Resolves caller identities to display names and ranks.
pub trait IdentityService: Send + Sync {
    /// Returns `None` if the caller is not a known participant.
    fn resolve(&self, id: CallerId) -> Option<Caller>;
}

/// Outcome of a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Success,
    GameNotReady,
    SaveInProgress,
    TimedOut,
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "saved",
            Self::GameNotReady => "game not ready",
            Self::SaveInProgress => "save already in progress",
            Self::TimedOut => "save timed out",
        })
    }
}

/// Server lifecycle hooks invoked by the built-in commands.
///
/// Called on the owner thread.
pub trait ServerControl: Send + Sync {
    /// Save the world. `caller` is `None` for server-initiated saves.
    fn save(&self, caller: Option<CallerId>) -> SaveStatus;

    fn stop(&self);

    fn restart(&self);

    fn version(&self) -> String;

    /// Names of loaded plugins.
    fn plugins(&self) -> Vec<String>;
}

/// A loaded plugin. Commands keep only a weak reference for attribution.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Command modules this plugin contributes.
    fn command_modules(&self) -> Vec<Box<dyn crate::commands::CommandModule>> {
        Vec::new()
    }
}

/// Shared server context threaded through dispatch.
#[derive(Clone)]
pub struct ServerContext {
    pub name: String,
    pub control: Arc<dyn ServerControl>,
    pub identities: Arc<dyn IdentityService>,
}

impl ServerContext {
    pub fn new(
        name: impl Into<String>,
        control: Arc<dyn ServerControl>,
        identities: Arc<dyn IdentityService>,
    ) -> Self {
        Self {
            name: name.into(),
            control,
            identities,
        }
    }
}

impl fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerContext")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Identity table loaded from `[[identity]]` config blocks.
#[derive(Debug, Default)]
pub struct StaticIdentities {
    callers: HashMap<CallerId, Caller>,
}

impl StaticIdentities {
    pub fn new(entries: &[IdentityEntry]) -> Self {
        let callers = entries
            .iter()
            .map(|e| {
                let id = CallerId(e.id);
                (
                    id,
                    Caller {
                        id,
                        name: e.name.clone(),
                        level: e.level,
                    },
                )
            })
            .collect();
        Self { callers }
    }

    pub fn insert(&mut self, caller: Caller) {
        self.callers.insert(caller.id, caller);
    }
}

impl IdentityService for StaticIdentities {
    fn resolve(&self, id: CallerId) -> Option<Caller> {
        self.callers.get(&id).cloned()
    }
}
