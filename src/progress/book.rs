// src/progress/book.rs

//! Pure, synchronous store of every target's progress state.
//!
//! `ProgressBook` has no channels and no Tokio types. The async hub owns one
//! and feeds it commands; the book decides what the new state is and which
//! snapshot should be published.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::progress::state::{ProgressState, ProgressUpdate, TargetState, UpdateMessage};

#[derive(Debug, Default)]
pub struct ProgressBook {
    states: HashMap<String, ProgressState>,
    last_updates: HashMap<String, UpdateMessage>,
}

impl ProgressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create default state for `target` if it does not exist yet.
    ///
    /// Returns `true` when a new record was created.
    pub fn ensure_initialized(&mut self, target: &str) -> bool {
        if self.states.contains_key(target) {
            return false;
        }
        debug!(target_name = %target, "initialising progress state");
        self.states.insert(target.to_string(), ProgressState::default());
        true
    }

    /// Apply `update` to `target` and return the snapshot to publish.
    pub fn log_progress(
        &mut self,
        target: &str,
        update: ProgressUpdate,
        now: DateTime<Utc>,
    ) -> UpdateMessage {
        let state = self.states.entry(target.to_string()).or_default();
        state.apply(update, now);

        let snapshot = UpdateMessage::snapshot(target, state);
        self.last_updates.insert(target.to_string(), snapshot.clone());
        snapshot
    }

    pub fn state(&self, target: &str) -> Option<TargetState> {
        self.states.get(target).map(TargetState::from)
    }

    pub fn last_update(&self, target: &str) -> Option<UpdateMessage> {
        self.last_updates.get(target).cloned()
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InstallStatus;

    #[test]
    fn ensure_is_idempotent() {
        let mut book = ProgressBook::new();
        assert!(book.ensure_initialized("k3s"));
        assert!(!book.ensure_initialized("k3s"));
        let state = book.state("k3s").unwrap();
        assert_eq!(state.status, InstallStatus::Pending);
        assert!(book.last_update("k3s").is_none());
    }

    #[test]
    fn log_progress_creates_lazily_and_tracks_last_update() {
        let mut book = ProgressBook::new();
        let update = ProgressUpdate::step(0.4, "Step 1/2: cni");
        let snap = book.log_progress("cilium", update, Utc::now());
        assert_eq!(snap.target, "cilium");
        assert_eq!(book.last_update("cilium"), Some(snap));
        assert_eq!(book.targets().count(), 1);
    }

    #[test]
    fn log_progress_on_unseen_target_creates_one_record() {
        let mut book = ProgressBook::new();
        let now = Utc::now();
        let snap = book.log_progress("k3s", ProgressUpdate::step(0.2, "Step 1/3: k3s"), now);
        assert_eq!(snap.sequence, 1);
        assert_eq!(snap.step_history, vec!["Step 1/3: k3s".to_string()]);
        assert!(!book.ensure_initialized("k3s"));
        assert_eq!(book.targets().collect::<Vec<_>>(), vec!["k3s"]);

        // A record made by ensure_initialized is reused, not replaced.
        assert!(book.ensure_initialized("cilium"));
        book.log_progress("cilium", ProgressUpdate::step(0.5, "Step 1/1: cni"), now);
        assert_eq!(book.state("cilium").unwrap().status, InstallStatus::Installing);
        assert_eq!(book.targets().count(), 2);
    }

    #[test]
    fn targets_are_independent() {
        let mut book = ProgressBook::new();
        let now = Utc::now();
        book.log_progress("a", ProgressUpdate::step(0.5, "Step 1/1: a"), now);
        book.log_progress("b", ProgressUpdate::failed(0.1, "nope", "err"), now);

        assert_eq!(book.state("a").unwrap().status, InstallStatus::Installing);
        assert_eq!(book.state("b").unwrap().status, InstallStatus::Failed);
        assert!(book.state("a").unwrap().step_history.len() == 1);
        assert!(book.state("b").unwrap().step_history.is_empty());
    }
}
