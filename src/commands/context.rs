//! Per-invocation command context.

use super::SharedTree;
use crate::server::{Caller, CallerId, Plugin, ServerContext};
use std::sync::{Arc, Weak};

/// State for a single command invocation.
///
/// Created by the dispatcher, moved onto the owner thread with the handler
/// and dropped once the response has been delivered.
pub struct CommandContext {
    caller: Option<Caller>,
    raw_args: String,
    args: Vec<String>,
    response: String,
    server: Arc<ServerContext>,
    commands: SharedTree,
    plugin: Option<Weak<dyn Plugin>>,
}

impl CommandContext {
    pub fn new(
        server: Arc<ServerContext>,
        commands: SharedTree,
        caller: Option<Caller>,
        raw_args: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            caller,
            raw_args: raw_args.into(),
            args,
            response: String::new(),
            server,
            commands,
            plugin: None,
        }
    }

    pub(crate) fn with_plugin(mut self, plugin: Option<Weak<dyn Plugin>>) -> Self {
        self.plugin = plugin;
        self
    }

    /// The invoking caller. `None` for server or console origin.
    pub fn caller(&self) -> Option<&Caller> {
        self.caller.as_ref()
    }

    pub fn caller_id(&self) -> Option<CallerId> {
        self.caller.as_ref().map(|c| c.id)
    }

    pub fn is_server(&self) -> bool {
        self.caller.is_none()
    }

    /// Argument text exactly as typed after the command path.
    pub fn raw_args(&self) -> &str {
        &self.raw_args
    }

    /// Tokenized arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn server(&self) -> &ServerContext {
        &self.server
    }

    /// Read access to the command tree, for introspection commands.
    pub fn commands(&self) -> &SharedTree {
        &self.commands
    }

    pub fn plugin(&self) -> Option<Arc<dyn Plugin>> {
        self.plugin.as_ref().and_then(Weak::upgrade)
    }

    /// Append a line to the response.
    pub fn respond(&mut self, text: impl AsRef<str>) {
        if !self.response.is_empty() {
            self.response.push('\n');
        }
        self.response.push_str(text.as_ref());
    }

    /// Discard anything written so far.
    pub fn clear_response(&mut self) {
        self.response.clear();
    }

    /// The response so far, `None` if nothing was written.
    pub fn response(&self) -> Option<&str> {
        (!self.response.is_empty()).then_some(self.response.as_str())
    }

    pub fn into_response(self) -> Option<String> {
        (!self.response.is_empty()).then_some(self.response)
    }
}
