//! Command descriptors and declarations.
//!
//! A [`CommandModule`] exposes a list of [`CommandDecl`]s. The manager turns
//! each declaration into an immutable [`Command`] when it is registered.

use super::args::{Args, Param};
use super::context::CommandContext;
use super::permission::PermissionLevel;
use crate::error::CommandResult;
use crate::server::Plugin;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Callable bound to a command at declaration time.
pub type Handler = Arc<dyn Fn(&mut CommandContext, &Args) -> CommandResult + Send + Sync>;

/// Minimum rank for commands that don't declare one.
pub const DEFAULT_LEVEL: PermissionLevel = PermissionLevel::Admin;

/// Something that exposes commands.
pub trait CommandModule: Send + Sync {
    /// Module name, used in logs.
    fn name(&self) -> &str;

    fn commands(&self) -> Vec<CommandDecl>;
}

/// Split a declared path on dots and whitespace into lowercase segments.
pub fn split_path(path: &str) -> Vec<String> {
    path.split(|c: char| c == '.' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Builder for a command declaration.
///
/// ```ignore
/// CommandDecl::new("stop", "Stops the server.")
///     .param(Param::optional("save", ParamKind::Bool, true))
///     .handler(|ctx, args| { ... })
/// ```
#[derive(Clone)]
pub struct CommandDecl {
    path: Vec<String>,
    description: String,
    minimum_level: PermissionLevel,
    params: Vec<Param>,
    syntax: Option<String>,
    timeout: Option<Duration>,
    handler: Option<Handler>,
}

impl CommandDecl {
    /// `path` may use dots or spaces between segments ("save.backup" or
    /// "save backup").
    pub fn new(path: &str, description: impl Into<String>) -> Self {
        Self {
            path: split_path(path),
            description: description.into(),
            minimum_level: DEFAULT_LEVEL,
            params: Vec::new(),
            syntax: None,
            timeout: None,
            handler: None,
        }
    }

    pub fn permission(mut self, level: PermissionLevel) -> Self {
        self.minimum_level = level;
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Override the generated syntax help.
    pub fn syntax(mut self, syntax: impl Into<String>) -> Self {
        self.syntax = Some(syntax.into());
        self
    }

    /// Deadline for server-originated invocations of this command,
    /// overriding the dispatcher default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut CommandContext, &Args) -> CommandResult + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(f));
        self
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Finish the declaration, attributing it to `plugin`.
    pub fn build(self, plugin: Option<Weak<dyn Plugin>>) -> Command {
        let syntax_help = self.syntax.unwrap_or_else(|| {
            let mut parts = self.path.clone();
            parts.extend(self.params.iter().map(Param::syntax));
            parts.join(" ")
        });

        Command {
            path: self.path,
            description: self.description,
            minimum_level: self.minimum_level,
            params: self.params,
            syntax_help,
            timeout: self.timeout,
            handler: self.handler,
            plugin,
        }
    }
}

/// A registered command. Immutable once built.
pub struct Command {
    path: Vec<String>,
    description: String,
    minimum_level: PermissionLevel,
    params: Vec<Param>,
    syntax_help: String,
    timeout: Option<Duration>,
    handler: Option<Handler>,
    plugin: Option<Weak<dyn Plugin>>,
}

impl Command {
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Dotted path, e.g. `save.backup`.
    pub fn name(&self) -> String {
        self.path.join(".")
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn minimum_level(&self) -> PermissionLevel {
        self.minimum_level
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn syntax_help(&self) -> &str {
        &self.syntax_help
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    /// Name of the owning plugin, if it is still loaded.
    pub fn plugin_name(&self) -> Option<String> {
        self.plugin
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|p| p.name().to_string())
    }

    pub(crate) fn plugin(&self) -> Option<Weak<dyn Plugin>> {
        self.plugin.clone()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("path", &self.path)
            .field("minimum_level", &self.minimum_level)
            .field("syntax_help", &self.syntax_help)
            .finish_non_exhaustive()
    }
}
