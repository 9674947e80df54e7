#![allow(dead_code)]

//! In-process test server: a spawned owner thread, a command manager with
//! the built-in commands and a recording `ServerControl`.

use commandeer::config::CommandsConfig;
use commandeer::server::StaticIdentities;
use commandeer::{
    Caller, CallerId, CommandManager, Marshal, PermissionLevel, Reply, SaveStatus, ServerContext,
    ServerControl,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Admin-ranked caller.
pub const ALICE: CallerId = CallerId(1);
/// Caller with no rank.
pub const BOB: CallerId = CallerId(2);
/// Moderator-ranked caller.
pub const CAROL: CallerId = CallerId(3);

/// Everything the built-in commands asked the server to do.
#[derive(Debug, Default)]
pub struct Recorded {
    pub saves: Vec<Option<CallerId>>,
    pub stops: usize,
    pub restarts: usize,
}

pub struct FakeControl {
    pub recorded: Mutex<Recorded>,
    pub save_status: Mutex<SaveStatus>,
}

impl FakeControl {
    fn new() -> Self {
        Self {
            recorded: Mutex::new(Recorded::default()),
            save_status: Mutex::new(SaveStatus::Success),
        }
    }
}

impl ServerControl for FakeControl {
    fn save(&self, caller: Option<CallerId>) -> SaveStatus {
        self.recorded.lock().saves.push(caller);
        *self.save_status.lock()
    }

    fn stop(&self) {
        self.recorded.lock().stops += 1;
    }

    fn restart(&self) {
        self.recorded.lock().restarts += 1;
    }

    fn version(&self) -> String {
        "1.2.3".to_string()
    }

    fn plugins(&self) -> Vec<String> {
        vec!["Essentials".to_string(), "Concealment".to_string()]
    }
}

pub struct TestServer {
    pub manager: Arc<CommandManager>,
    pub control: Arc<FakeControl>,
    pub replies: mpsc::UnboundedReceiver<Reply>,
}

impl TestServer {
    pub fn spawn() -> Self {
        Self::with_config(CommandsConfig::default())
    }

    pub fn with_config(config: CommandsConfig) -> Self {
        let (marshal, _owner) = Marshal::spawn("test-owner").expect("spawn owner thread");

        let mut identities = StaticIdentities::default();
        for (id, name, level) in [
            (ALICE, "alice", PermissionLevel::Admin),
            (BOB, "bob", PermissionLevel::None),
            (CAROL, "carol", PermissionLevel::Moderator),
        ] {
            identities.insert(Caller {
                id,
                name: name.to_string(),
                level,
            });
        }

        let control = Arc::new(FakeControl::new());
        let server = Arc::new(ServerContext::new(
            "test",
            Arc::clone(&control) as Arc<dyn ServerControl>,
            Arc::new(identities),
        ));

        let (reply_tx, replies) = mpsc::unbounded_channel();
        let manager = Arc::new(CommandManager::with_builtins(
            &config,
            server,
            marshal,
            Arc::new(reply_tx),
        ));

        Self {
            manager,
            control,
            replies,
        }
    }

    /// Wait until every action queued so far has run.
    pub fn sync(&self) {
        self.manager
            .marshal()
            .submit_blocking(|| (), Duration::from_secs(5))
            .expect("owner thread is running");
    }

    /// Next reply, waiting up to `timeout`. For synchronous tests.
    pub fn recv_reply_timeout(&mut self, timeout: Duration) -> Option<Reply> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(reply) = self.replies.try_recv() {
                return Some(reply);
            }
            if Instant::now() >= deadline {
                return None;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    /// Run `text` as `caller` and return the reply text, if any.
    pub fn run_as(&mut self, caller: CallerId, text: &str) -> Option<String> {
        self.manager
            .dispatch(text, Some(caller))
            .expect("dispatch succeeded");
        self.sync();
        self.replies.try_recv().ok().map(|reply| {
            assert_eq!(reply.caller, Some(caller));
            reply.text
        })
    }
}
