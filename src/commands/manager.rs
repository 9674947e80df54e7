//! Command registration and dispatch.
//!
//! The `CommandManager` owns the command tree and is the single entry point
//! for the chat/console transport. Dispatch resolves text against the tree,
//! authorizes the caller, tokenizes arguments and hands the invocation to
//! the owner thread through the [`Marshal`].

use super::args::{Args, tokenize};
use super::builtin;
use super::command::{Command, CommandDecl, CommandModule};
use super::context::CommandContext;
use super::permission::PermissionLevel;
use super::tree::CommandTree;
use super::SharedTree;
use crate::config::CommandsConfig;
use crate::error::{CommandError, DispatchError, RegistrationError};
use crate::marshal::Marshal;
use crate::server::{CallerId, Plugin, ServerContext};
use crate::telemetry::{CommandTimer, spans};
use crate::transport::{Reply, ReplySink};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Successful dispatch outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Not a command; the transport should treat it as chat.
    NotCommand,
    /// Caller-originated; the response is delivered through the reply sink.
    Queued,
    /// Server-originated; the handler's response, if any.
    Completed(Option<String>),
}

impl Dispatched {
    /// Command attempts are never echoed to other participants.
    pub fn suppresses_echo(&self) -> bool {
        !matches!(self, Self::NotCommand)
    }
}

/// Outcome of registering a module.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistrationReport {
    pub registered: Vec<String>,
    pub rejected: Vec<RegistrationError>,
}

impl RegistrationReport {
    fn merge(&mut self, other: RegistrationReport) {
        self.registered.extend(other.registered);
        self.rejected.extend(other.rejected);
    }
}

/// Registration surface, authorization gate and dispatcher.
pub struct CommandManager {
    prefix: char,
    blocking_timeout: Duration,
    tree: SharedTree,
    server: Arc<ServerContext>,
    marshal: Marshal,
    replies: Arc<dyn ReplySink>,
}

impl CommandManager {
    pub fn new(
        config: &CommandsConfig,
        server: Arc<ServerContext>,
        marshal: Marshal,
        replies: Arc<dyn ReplySink>,
    ) -> Self {
        Self {
            prefix: config.prefix,
            blocking_timeout: config.blocking_timeout(),
            tree: Arc::new(RwLock::new(CommandTree::new())),
            server,
            marshal,
            replies,
        }
    }

    /// Create a manager with the built-in commands registered.
    pub fn with_builtins(
        config: &CommandsConfig,
        server: Arc<ServerContext>,
        marshal: Marshal,
        replies: Arc<dyn ReplySink>,
    ) -> Self {
        let manager = Self::new(config, server, marshal, replies);
        manager.register_module(&builtin::CoreCommands::new(config.quick_timeout()), None);
        manager
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    pub fn commands(&self) -> &SharedTree {
        &self.tree
    }

    pub fn marshal(&self) -> &Marshal {
        &self.marshal
    }

    pub fn replies(&self) -> &Arc<dyn ReplySink> {
        &self.replies
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register one declaration.
    ///
    /// A path that is already taken keeps its first command; the error is
    /// logged and returned.
    pub fn register(
        &self,
        decl: CommandDecl,
        plugin: Option<&Arc<dyn Plugin>>,
    ) -> Result<String, RegistrationError> {
        let command = Arc::new(decl.build(plugin.map(Arc::downgrade)));
        let name = command.name();
        info!(command = %name, "Registering command");

        let result = {
            let mut tree = self.tree.write();
            let result = tree.add_command(command);
            crate::metrics::set_registered_commands(tree.len());
            result
        };

        match result {
            Ok(()) => Ok(name),
            Err(e) => {
                error!(command = %name, error = %e, "Command registration rejected");
                Err(e)
            }
        }
    }

    /// Register every command a module declares, continuing past conflicts.
    pub fn register_module(
        &self,
        module: &dyn CommandModule,
        plugin: Option<&Arc<dyn Plugin>>,
    ) -> RegistrationReport {
        let mut report = RegistrationReport::default();
        for decl in module.commands() {
            match self.register(decl, plugin) {
                Ok(name) => report.registered.push(name),
                Err(e) => report.rejected.push(e),
            }
        }
        debug!(
            module = module.name(),
            registered = report.registered.len(),
            rejected = report.rejected.len(),
            "Registered command module"
        );
        report
    }

    /// Register every module a plugin contributes, attributed to it.
    pub fn register_plugin_commands(&self, plugin: &Arc<dyn Plugin>) -> RegistrationReport {
        let mut report = RegistrationReport::default();
        for module in plugin.command_modules() {
            report.merge(self.register_module(module.as_ref(), Some(plugin)));
        }
        info!(
            plugin = plugin.name(),
            commands = report.registered.len(),
            "Registered plugin commands"
        );
        report
    }

    // ========================================================================
    // Resolution & authorization
    // ========================================================================

    /// True if `text` is a prefix character followed by anything.
    pub fn is_command(&self, text: &str) -> bool {
        let mut chars = text.chars();
        chars.next() == Some(self.prefix) && chars.next().is_some()
    }

    /// True if `text` starts with the prefix. A bare prefix counts: it is
    /// dispatched (and fails as unknown) rather than echoed as chat.
    pub fn is_command_attempt(&self, text: &str) -> bool {
        text.starts_with(self.prefix)
    }

    /// Whether a caller of `level` may run `command`.
    ///
    /// `None` means server or console origin, which may run everything.
    pub fn authorize(level: Option<PermissionLevel>, command: &Command) -> bool {
        level.is_none_or(|level| level.satisfies(command.minimum_level()))
    }

    /// Help text for `path`, as shown by the `help` command.
    pub fn help<S: AsRef<str>>(&self, path: &[S]) -> String {
        builtin::help_text(&self.tree.read(), path)
    }

    /// Every command at or below `path` with its description.
    pub fn long_help<S: AsRef<str>>(&self, path: &[S]) -> String {
        builtin::long_help_text(&self.tree.read(), path)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Run the full pipeline for one inbound message.
    ///
    /// Caller-originated commands are queued on the owner thread and answered
    /// through the reply sink. Server-originated commands block until the
    /// handler finishes or the command's deadline passes.
    pub fn dispatch(
        &self,
        message: &str,
        caller: Option<CallerId>,
    ) -> Result<Dispatched, DispatchError> {
        let Some(text) = message.strip_prefix(self.prefix) else {
            return Ok(Dispatched::NotCommand);
        };
        self.dispatch_text(message, text, caller)
    }

    /// Console entry point. The prefix is optional.
    pub fn dispatch_server(&self, line: &str) -> Result<Option<String>, DispatchError> {
        let text = line.strip_prefix(self.prefix).unwrap_or(line);
        match self.dispatch_text(line, text, None)? {
            Dispatched::Completed(response) => Ok(response),
            Dispatched::NotCommand | Dispatched::Queued => Ok(None),
        }
    }

    fn dispatch_text(
        &self,
        message: &str,
        text: &str,
        caller: Option<CallerId>,
    ) -> Result<Dispatched, DispatchError> {
        let span = spans::dispatch(caller);
        let _enter = span.enter();

        let caller = match caller {
            Some(id) => match self.server.identities.resolve(id) {
                Some(resolved) => Some(resolved),
                None => {
                    error!(caller = %id, message, "Command invoked by nonexistent caller");
                    return Err(self.fail("-", DispatchError::UnknownCaller(id)));
                }
            },
            None => None,
        };

        let Some((command, arg_text)) = self.tree.read().get_command(text) else {
            debug!(text, "Unknown command");
            return Err(self.fail("-", DispatchError::UnknownCommand(text.trim().to_string())));
        };
        let name = command.name();

        if let Some(caller) = &caller {
            if !Self::authorize(Some(caller.level), &command) {
                info!(
                    caller = %caller.name,
                    command = %name,
                    required = %command.minimum_level(),
                    "Caller tried to use command without permission"
                );
                return Err(self.fail(
                    &name,
                    DispatchError::Unauthorized {
                        path: name.clone(),
                        required: command.minimum_level(),
                    },
                ));
            }
        }

        let args = tokenize(arg_text);
        let ctx = CommandContext::new(
            Arc::clone(&self.server),
            Arc::clone(&self.tree),
            caller.clone(),
            arg_text,
            args,
        )
        .with_plugin(command.plugin());
        let message = message.to_string();

        match caller {
            Some(caller) => {
                debug!(command = %name, caller = %caller.name, "Queueing command");
                let replies = Arc::clone(&self.replies);
                self.marshal
                    .submit(move || {
                        if let Some(text) = invoke(&command, ctx, &message) {
                            replies.deliver(Reply::to_caller(caller.id, text));
                        }
                    })
                    .map_err(|e| self.fail(&name, e.into()))?;
                Ok(Dispatched::Queued)
            }
            None => {
                debug!(command = %name, "Invoking command for server");
                let timeout = command.timeout().unwrap_or(self.blocking_timeout);
                let response = self
                    .marshal
                    .submit_blocking(move || invoke(&command, ctx, &message), timeout)
                    .map_err(|e| self.fail(&name, e.into()))?;
                Ok(Dispatched::Completed(response))
            }
        }
    }

    fn fail(&self, command: &str, err: DispatchError) -> DispatchError {
        crate::metrics::record_command_error(command, err.error_code());
        err
    }
}

/// Bind arguments and run the handler. Called on the owner thread.
fn invoke(command: &Command, mut ctx: CommandContext, message: &str) -> Option<String> {
    let name = command.name();
    let who = ctx
        .caller()
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "server".to_string());
    let _span = spans::invoke(&name, &who).entered();
    let _timer = CommandTimer::new(&name);

    let outcome = Args::bind(command.params(), ctx.args()).and_then(|args| match command.handler() {
        Some(handler) => handler(&mut ctx, &args),
        None => Err(CommandError::Failed(format!("{name} has no handler"))),
    });

    match outcome {
        Ok(()) => info!(caller = %who, message, "Command ran"),
        Err(CommandError::InvalidSyntax(reason)) => {
            debug!(command = %name, reason = %reason, "Invalid syntax");
            crate::metrics::record_command_error(&name, "invalid_syntax");
            ctx.clear_response();
            ctx.respond(format!("Invalid Syntax: {}", command.syntax_help()));
        }
        Err(CommandError::Failed(reason)) => {
            error!(command = %name, caller = %who, reason = %reason, "Command failed");
            crate::metrics::record_command_error(&name, "failed");
            ctx.respond(format!("Command failed: {reason}"));
        }
    }

    ctx.into_response()
}
