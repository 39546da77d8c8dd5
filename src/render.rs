// src/render.rs

//! Minimal console consumer for the orchestrator's channels.
//!
//! Stands in for the interactive UI: drains updates, log lines and facts and
//! prints them to stdout until every sender has gone away.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::progress::UpdateMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Text,
    Json,
}

/// Render a single update as one line of text.
pub fn format_update(update: &UpdateMessage) -> String {
    let pct = (update.progress * 100.0).round() as u32;
    let mut line = format!(
        "[{}] {:<10} {:>3}% {}",
        update.target, update.status, pct, update.description
    );
    if let Some(err) = &update.error {
        line.push_str(&format!(" (error: {err})"));
    }
    line
}

/// Spawn a task that prints everything the orchestrator emits.
pub fn spawn_console_renderer(
    mut updates: mpsc::Receiver<UpdateMessage>,
    mut logs: Option<mpsc::Receiver<String>>,
    mut facts: Option<mpsc::Receiver<String>>,
    mode: RenderMode,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                update = updates.recv() => match update {
                    Some(update) => print_update(&update, mode),
                    None => break,
                },
                Some(line) = recv_opt(&mut logs) => {
                    if mode == RenderMode::Text {
                        println!("  | {line}");
                    }
                }
                Some(fact) = recv_opt(&mut facts) => {
                    if mode == RenderMode::Text {
                        println!("  * {fact}");
                    }
                }
            }
        }

        if let Some(rx) = logs.as_mut() {
            while let Ok(line) = rx.try_recv() {
                if mode == RenderMode::Text {
                    println!("  | {line}");
                }
            }
        }
    })
}

async fn recv_opt(rx: &mut Option<mpsc::Receiver<String>>) -> Option<String> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn print_update(update: &UpdateMessage, mode: RenderMode) {
    match mode {
        RenderMode::Text => println!("{}", format_update(update)),
        RenderMode::Json => match serde_json::to_string(update) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!(error = %e, "failed to serialize update"),
        },
    }
}
