// src/sink.rs

//! Best-effort line forwarders for the consumer's optional channels.
//!
//! Both sinks share one contract: a send never blocks and never fails the
//! caller. Without a configured channel, or with a full or closed one, the
//! line is discarded. Lines are mirrored to `tracing` at debug level so they
//! still show up in `CLUSTERBOOT_LOG=debug` output.

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// Forwards free-text log lines to the consumer.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    tx: Option<mpsc::Sender<String>>,
}

impl LogSink {
    pub fn new(tx: Option<mpsc::Sender<String>>) -> Self {
        Self { tx }
    }

    /// A sink that discards everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_configured(&self) -> bool {
        self.tx.is_some()
    }

    pub fn send_log(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(target: "clusterboot::log", "{message}");
        forward(self.tx.as_ref(), message, "log");
    }
}

/// Forwards rotating informational facts to the consumer.
#[derive(Debug, Clone, Default)]
pub struct FactSink {
    tx: Option<mpsc::Sender<String>>,
}

impl FactSink {
    pub fn new(tx: Option<mpsc::Sender<String>>) -> Self {
        Self { tx }
    }

    pub fn is_configured(&self) -> bool {
        self.tx.is_some()
    }

    pub fn send_fact(&self, fact: impl Into<String>) {
        forward(self.tx.as_ref(), fact.into(), "fact");
    }
}

fn forward(tx: Option<&mpsc::Sender<String>>, line: String, kind: &'static str) {
    let Some(tx) = tx else {
        return;
    };
    match tx.try_send(line) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            debug!(kind, "consumer channel full; dropping line");
        }
        Err(TrySendError::Closed(_)) => {
            debug!(kind, "consumer channel closed; dropping line");
        }
    }
}
