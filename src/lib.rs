//! commandeer - command routing for live multiplayer game servers.
//!
//! Chat and console lines are resolved against a tree of registered
//! commands, checked against the caller's permission rank and executed on a
//! single owner thread through the [`Marshal`].

pub mod commands;
pub mod config;
pub mod error;
pub mod marshal;
pub mod metrics;
pub mod server;
pub mod telemetry;
pub mod transport;

pub use commands::{
    Args, Command, CommandContext, CommandDecl, CommandManager, CommandModule, CoreCommands,
    Dispatched, Param, ParamKind, PermissionLevel,
};
pub use config::Config;
pub use error::{CommandError, CommandResult, DispatchError, MarshalError, RegistrationError};
pub use marshal::{Marshal, OwnerLoop};
pub use server::{Caller, CallerId, IdentityService, Plugin, SaveStatus, ServerContext, ServerControl};
pub use transport::{ChatMessage, Reply, ReplySink, spawn_chat_router};
