//! Chat transport glue.
//!
//! Inbound chat arrives as [`ChatMessage`]s on a tokio channel. The router
//! task feeds each one through [`CommandManager::dispatch`], forwards
//! ordinary chat for broadcast and answers failed command attempts through
//! the [`ReplySink`]. Handler responses for queued commands are delivered
//! to the same sink from the owner thread.

use crate::commands::{CommandManager, Dispatched};
use crate::server::CallerId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One inbound chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub text: String,
    /// `None` when the line comes from the server itself.
    pub caller: Option<CallerId>,
}

impl ChatMessage {
    pub fn from_caller(caller: CallerId, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            caller: Some(caller),
        }
    }
}

/// Text addressed to a single caller, or to the server console when
/// `caller` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub caller: Option<CallerId>,
    pub text: String,
}

impl Reply {
    pub fn to_caller(caller: CallerId, text: impl Into<String>) -> Self {
        Self {
            caller: Some(caller),
            text: text.into(),
        }
    }

    pub fn to_console(text: impl Into<String>) -> Self {
        Self {
            caller: None,
            text: text.into(),
        }
    }
}

/// Delivers replies to callers.
///
/// Called from the owner thread as well as the router task, so
/// implementations must not block for long.
pub trait ReplySink: Send + Sync {
    fn deliver(&self, reply: Reply);
}

impl ReplySink for mpsc::UnboundedSender<Reply> {
    fn deliver(&self, reply: Reply) {
        if self.send(reply).is_err() {
            debug!("Reply receiver dropped; discarding reply");
        }
    }
}

/// Spawn the chat router.
///
/// Messages are handled one at a time in arrival order. Non-command chat is
/// forwarded to `chat_tx`; command attempts never are, whether or not they
/// resolved. Responses to server-originated commands and error text for
/// failed attempts go to the manager's reply sink. The task ends when
/// `inbound` closes.
pub fn spawn_chat_router(
    manager: Arc<CommandManager>,
    mut inbound: mpsc::Receiver<ChatMessage>,
    chat_tx: mpsc::UnboundedSender<ChatMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = inbound.recv().await {
            route(&manager, message, &chat_tx).await;
        }
        debug!("Chat router stopped");
    })
}

async fn route(
    manager: &Arc<CommandManager>,
    message: ChatMessage,
    chat_tx: &mpsc::UnboundedSender<ChatMessage>,
) {
    if !manager.is_command_attempt(&message.text) {
        crate::metrics::record_chat_message("chat");
        if chat_tx.send(message).is_err() {
            debug!("Chat receiver dropped; discarding message");
        }
        return;
    }

    // Server-originated commands block on the owner thread.
    let caller = message.caller;
    let dispatcher = Arc::clone(manager);
    let outcome = tokio::task::spawn_blocking(move || dispatcher.dispatch(&message.text, caller)).await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Dispatch task failed");
            crate::metrics::record_chat_message("dropped");
            return;
        }
    };

    crate::metrics::record_chat_message("command");
    let text = match result {
        Ok(Dispatched::Completed(response)) => response,
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, caller = ?caller, "Command attempt failed");
            e.user_message()
        }
    };
    if let Some(text) = text {
        manager.replies().deliver(Reply { caller, text });
    }
}
