//! Built-in commands: help, longhelp, ver, plugins, stop, restart, save.

use super::args::{Param, ParamKind};
use super::command::{CommandDecl, CommandModule};
use super::context::CommandContext;
use super::permission::PermissionLevel;
use super::tree::{CommandNode, CommandTree};
use crate::server::SaveStatus;
use std::time::Duration;

/// The core command module registered by every host.
#[derive(Debug, Clone)]
pub struct CoreCommands {
    quick_timeout: Duration,
}

impl CoreCommands {
    /// `quick_timeout` bounds the read-only queries when run from the console.
    pub fn new(quick_timeout: Duration) -> Self {
        Self { quick_timeout }
    }
}

impl CommandModule for CoreCommands {
    fn name(&self) -> &str {
        "core"
    }

    fn commands(&self) -> Vec<CommandDecl> {
        vec![
            CommandDecl::new("help", "Displays help for a command")
                .permission(PermissionLevel::None)
                .param(Param::rest("path"))
                .timeout(self.quick_timeout)
                .handler(|ctx, args| {
                    let text = help_text(&ctx.commands().read(), args.rest("path"));
                    ctx.respond(text);
                    Ok(())
                }),
            CommandDecl::new("longhelp", "Get verbose help. Will send a long message.")
                .param(Param::rest("path"))
                .timeout(self.quick_timeout)
                .handler(|ctx, args| {
                    let text = long_help_text(&ctx.commands().read(), args.rest("path"));
                    ctx.respond(text);
                    Ok(())
                }),
            CommandDecl::new("ver", "Shows the running server version.")
                .permission(PermissionLevel::None)
                .timeout(self.quick_timeout)
                .handler(|ctx, _| {
                    let version = ctx.server().control.version();
                    ctx.respond(format!("Server version: {version}"));
                    Ok(())
                }),
            CommandDecl::new("plugins", "Lists the currently loaded plugins.")
                .permission(PermissionLevel::None)
                .timeout(self.quick_timeout)
                .handler(|ctx, _| {
                    let plugins = ctx.server().control.plugins();
                    ctx.respond(format!("Loaded plugins: {}", plugins.join(", ")));
                    Ok(())
                }),
            CommandDecl::new("stop", "Stops the server.")
                .param(Param::optional("save", ParamKind::Bool, true))
                .handler(|ctx, args| {
                    ctx.respond("Stopping server.");
                    if args.bool("save").unwrap_or(true) {
                        save(ctx);
                    }
                    ctx.server().control.stop();
                    Ok(())
                }),
            CommandDecl::new("restart", "Restarts the server.")
                .param(Param::optional("save", ParamKind::Bool, true))
                .handler(|ctx, args| {
                    ctx.respond("Restarting server.");
                    if args.bool("save").unwrap_or(true) {
                        save(ctx);
                    }
                    ctx.server().control.restart();
                    Ok(())
                }),
            CommandDecl::new("save", "Saves the game.").handler(|ctx, _| {
                ctx.respond("Saving game.");
                save(ctx);
                Ok(())
            }),
        ]
    }
}

fn save(ctx: &mut CommandContext) {
    let status = ctx.server().control.save(ctx.caller_id());
    if status != SaveStatus::Success {
        tracing::warn!(status = %status, "Save did not complete");
        ctx.respond(format!("Save failed: {status}"));
    }
}

/// Syntax, description and subcommands of `path`, or the top-level
/// listing when `path` names no node.
pub fn help_text<S: AsRef<str>>(tree: &CommandTree, path: &[S]) -> String {
    match tree.get_node(path) {
        Some(node) => describe(node),
        None => format!("Top level commands: {}", join(tree.top_level())),
    }
}

/// Like [`help_text`], but with no path lists every command and its
/// description.
pub fn long_help_text<S: AsRef<str>>(tree: &CommandTree, path: &[S]) -> String {
    if let Some(node) = tree.get_node(path) {
        return describe(node);
    }

    let mut lines = vec!["Available commands:".to_string()];
    for command in tree.walk().filter_map(CommandNode::command) {
        lines.push(format!(
            "{}\n    {}",
            command.syntax_help(),
            command.description()
        ));
    }
    lines.join("\n")
}

fn describe(node: &CommandNode) -> String {
    let mut lines = Vec::new();
    if let Some(command) = node.command() {
        lines.push(format!("Syntax: {}", command.syntax_help()));
        lines.push(command.description().to_string());
    }
    if node.has_subcommands() {
        lines.push(format!("Subcommands: {}", join(node.subcommands())));
    }
    lines.join("\n")
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn core_tree() -> CommandTree {
        let mut tree = CommandTree::new();
        for decl in CoreCommands::new(Duration::from_secs(5)).commands() {
            tree.add_command(Arc::new(decl.build(None))).unwrap();
        }
        tree.add_command(Arc::new(
            CommandDecl::new("save.backup", "Writes a backup copy.").build(None),
        ))
        .unwrap();
        tree
    }

    #[test]
    fn test_help_for_leaf() {
        let tree = core_tree();
        let text = help_text(&tree, &["stop"]);
        assert_eq!(text, "Syntax: stop [save=true]\nStops the server.");
    }

    #[test]
    fn test_help_lists_subcommands() {
        let tree = core_tree();
        let text = help_text(&tree, &["SAVE"]);
        assert_eq!(text, "Syntax: save\nSaves the game.\nSubcommands: backup");
    }

    #[test]
    fn test_help_falls_back_to_top_level() {
        let tree = core_tree();
        let expected = "Top level commands: help, longhelp, plugins, restart, save, stop, ver";
        assert_eq!(help_text::<&str>(&tree, &[]), expected);
        assert_eq!(help_text(&tree, &["nope"]), expected);
    }

    #[test]
    fn test_long_help_lists_everything() {
        let tree = core_tree();
        let text = long_help_text::<&str>(&tree, &[]);
        assert!(text.starts_with("Available commands:\n"));
        assert!(text.contains("save backup\n    Writes a backup copy."));
        assert!(text.contains("restart [save=true]\n    Restarts the server."));
        assert_eq!(text.matches("\n    ").count(), tree.len());
    }

    #[test]
    fn test_permissions() {
        let tree = core_tree();
        let level = |path: &str| {
            tree.get_command(path)
                .map(|(c, _)| c.minimum_level())
                .unwrap()
        };
        assert_eq!(level("help"), PermissionLevel::None);
        assert_eq!(level("ver"), PermissionLevel::None);
        assert_eq!(level("stop"), PermissionLevel::Admin);
        assert_eq!(level("longhelp"), PermissionLevel::Admin);
    }
}
