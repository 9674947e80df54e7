//! Command system.
//!
//! Commands are declared by [`CommandModule`]s, stored in a [`CommandTree`]
//! keyed by lowercase path segments and dispatched by the
//! [`CommandManager`], which runs every handler on the owner thread.

mod args;
mod builtin;
mod command;
mod context;
mod manager;
mod permission;
mod tree;

use parking_lot::RwLock;
use std::sync::Arc;

pub use args::{Args, Param, ParamKind, Value, tokenize};
pub use builtin::{CoreCommands, help_text, long_help_text};
pub use command::{Command, CommandDecl, CommandModule, DEFAULT_LEVEL, Handler, split_path};
pub use context::CommandContext;
pub use manager::{CommandManager, Dispatched, RegistrationReport};
pub use permission::PermissionLevel;
pub use tree::{CommandNode, CommandTree, Walk};

/// The command tree shared between the dispatcher and handlers.
pub type SharedTree = Arc<RwLock<CommandTree>>;
