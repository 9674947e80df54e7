//! Command resolution tree.
//!
//! Commands live at the leaves (and inner nodes) of a trie keyed by
//! lowercase path segments. A node may hold a command and children at the
//! same time, e.g. `save` and `save.backup`.

use super::command::Command;
use crate::error::RegistrationError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A node in the command tree.
#[derive(Debug, Default)]
pub struct CommandNode {
    segment: String,
    command: Option<Arc<Command>>,
    children: BTreeMap<String, CommandNode>,
}

impl CommandNode {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            ..Self::default()
        }
    }

    /// Path segment of this node. Empty for the root.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn command(&self) -> Option<&Arc<Command>> {
        self.command.as_ref()
    }

    pub fn is_command(&self) -> bool {
        self.command.is_some()
    }

    pub fn child(&self, segment: &str) -> Option<&CommandNode> {
        self.children.get(&segment.to_lowercase())
    }

    /// Immediate child segments, sorted.
    pub fn subcommands(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn has_subcommands(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Trie of registered commands.
#[derive(Debug, Default)]
pub struct CommandTree {
    root: CommandNode,
    count: usize,
}

impl CommandTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a command at its path, creating intermediate nodes.
    ///
    /// An existing command at the same path is kept and the new one is
    /// rejected.
    pub fn add_command(&mut self, command: Arc<Command>) -> Result<(), RegistrationError> {
        if command.path().is_empty() {
            return Err(RegistrationError::EmptyPath);
        }

        let mut node = &mut self.root;
        for segment in command.path() {
            node = node
                .children
                .entry(segment.clone())
                .or_insert_with(|| CommandNode::new(segment));
        }

        if node.command.is_some() {
            return Err(RegistrationError::Duplicate(command.name()));
        }

        node.command = Some(command);
        self.count += 1;
        Ok(())
    }

    /// Longest-prefix resolution of `text`.
    ///
    /// Tokens are consumed as path segments while a matching child exists.
    /// The deepest visited node holding a command wins; everything after
    /// that command's last token is returned verbatim as argument text.
    pub fn get_command<'t>(&self, text: &'t str) -> Option<(Arc<Command>, &'t str)> {
        let mut node = &self.root;
        let mut best: Option<(&Arc<Command>, usize)> = None;

        for (offset, token) in token_spans(text) {
            let Some(child) = node.children.get(&token.to_lowercase()) else {
                break;
            };
            node = child;
            if let Some(command) = &child.command {
                best = Some((command, offset + token.len()));
            }
        }

        best.map(|(command, end)| (Arc::clone(command), text[end..].trim_start()))
    }

    /// Exact path lookup. The empty path matches nothing.
    pub fn get_node<S: AsRef<str>>(&self, path: &[S]) -> Option<&CommandNode> {
        if path.is_empty() {
            return None;
        }
        path.iter()
            .try_fold(&self.root, |node, segment| node.child(segment.as_ref()))
    }

    /// Lazy pre-order traversal of every node below the root.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.root.children.values().rev().collect(),
        }
    }

    /// Top-level segments, sorted.
    pub fn top_level(&self) -> impl Iterator<Item = &str> {
        self.root.subcommands()
    }

    pub fn root(&self) -> &CommandNode {
        &self.root
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Iterator returned by [`CommandTree::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a CommandNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a CommandNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.values().rev());
        Some(node)
    }
}

/// Whitespace-separated tokens with their byte offsets in `text`.
fn token_spans(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let base = text.as_ptr() as usize;
    text.split_whitespace()
        .map(move |token| (token.as_ptr() as usize - base, token))
}
