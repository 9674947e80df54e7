//! commandeer console host.
//!
//! Runs the owner thread and reads server commands from stdin, one per
//! line. Useful for exercising command modules without a game attached.

use commandeer::config::Config;
use commandeer::server::StaticIdentities;
use commandeer::{
    CallerId, CommandManager, Marshal, Reply, SaveStatus, ServerContext, ServerControl, metrics,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Lifecycle hooks for the console host. There is no world to save, so
/// every request is logged and reported as done.
struct ConsoleControl {
    version: String,
    running: AtomicBool,
}

impl ServerControl for ConsoleControl {
    fn save(&self, caller: Option<CallerId>) -> SaveStatus {
        info!(caller = ?caller, "Save requested");
        SaveStatus::Success
    }

    fn stop(&self) {
        info!("Stop requested");
        self.running.store(false, Ordering::Release);
    }

    fn restart(&self) {
        warn!("Restart requested; the console host can only stop");
        self.running.store(false, Ordering::Release);
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn plugins(&self) -> Vec<String> {
        Vec::new()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("COMMANDEER_LOG_FORMAT").is_ok_and(|f| f == "json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "commandeer.toml".to_string());

    let config = if std::path::Path::new(&config_path).exists() {
        Config::load_validated(&config_path).map_err(|e| {
            error!(path = %config_path, error = %e, "Failed to load config");
            e
        })?
    } else {
        warn!(path = %config_path, "Config file not found, using defaults");
        Config::default()
    };

    info!(server = %config.server.name, version = %config.server.version, "Starting commandeer");
    metrics::init();

    let (marshal, owner) = Marshal::spawn(config.marshal.thread_name.clone())?;

    let control = Arc::new(ConsoleControl {
        version: config.server.version.clone(),
        running: AtomicBool::new(true),
    });
    let identities = Arc::new(StaticIdentities::new(&config.identity));
    let server = Arc::new(ServerContext::new(
        config.server.name.clone(),
        Arc::clone(&control) as Arc<dyn ServerControl>,
        identities,
    ));

    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<Reply>();
    let manager = Arc::new(CommandManager::with_builtins(
        &config.commands,
        server,
        marshal,
        Arc::new(reply_tx),
    ));
    info!(commands = manager.commands().read().len(), "Commands registered");

    tokio::spawn(async move {
        while let Some(reply) = reply_rx.recv().await {
            match reply.caller {
                Some(caller) => info!(caller = %caller, "{}", reply.text),
                None => println!("{}", reply.text),
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while control.running.load(Ordering::Acquire) {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let dispatcher = Arc::clone(&manager);
        match tokio::task::spawn_blocking(move || dispatcher.dispatch_server(&line)).await? {
            Ok(Some(response)) => println!("{response}"),
            Ok(None) => {}
            Err(e) => match e.user_message() {
                Some(text) => println!("{text}"),
                None => warn!(error = %e, "Command dropped"),
            },
        }
    }

    info!("Shutting down");
    // The owner thread exits once the last Marshal handle is gone.
    drop(manager);
    tokio::task::spawn_blocking(move || {
        if owner.join().is_err() {
            error!("Owner thread panicked");
        }
    })
    .await?;

    tracing::debug!(metrics = %metrics::gather_metrics(), "Final metrics");
    Ok(())
}
