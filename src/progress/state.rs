// src/progress/state.rs

//! Per-target progress record and the values that flow in and out of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::InstallStatus;

/// A single mutation request for a target's state.
///
/// Every writer (the sequencer, interpolators, output classifiers) describes
/// its change with one of these and hands it to the progress hub.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub progress: f64,
    pub description: String,
    pub error: Option<String>,
    pub status: InstallStatus,
    /// Whether `description` is eligible for the target's step history.
    pub record_history: bool,
}

impl ProgressUpdate {
    /// Intermediate progress; not recorded in history.
    pub fn installing(progress: f64, description: impl Into<String>) -> Self {
        Self {
            progress,
            description: description.into(),
            error: None,
            status: InstallStatus::Installing,
            record_history: false,
        }
    }

    /// A step starting. This is the only kind that lands in history.
    pub fn step(progress: f64, description: impl Into<String>) -> Self {
        Self {
            record_history: true,
            ..Self::installing(progress, description)
        }
    }

    pub fn failed(progress: f64, description: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            progress,
            description: description.into(),
            error: Some(error.into()),
            status: InstallStatus::Failed,
            record_history: false,
        }
    }

    pub fn completed(description: impl Into<String>) -> Self {
        Self {
            progress: 1.0,
            description: description.into(),
            error: None,
            status: InstallStatus::Completed,
            record_history: false,
        }
    }
}

/// Mutable record for one install target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressState {
    pub status: InstallStatus,
    pub progress: f64,
    pub description: String,
    pub error: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub step_history: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Number of updates applied so far.
    pub sequence: u64,
}

impl ProgressState {
    /// Apply one update. Last write wins for progress, description and
    /// error; timestamps are write-once.
    pub fn apply(&mut self, update: ProgressUpdate, now: DateTime<Utc>) {
        if update.status == InstallStatus::Installing && self.start_time.is_none() {
            self.start_time = Some(now);
        }
        if update.status.is_terminal() && self.end_time.is_none() {
            self.end_time = Some(now);
        }

        self.status = update.status;
        if update.progress.is_finite() {
            self.progress = update.progress.clamp(0.0, 1.0);
        }
        self.error = update.error;

        if update.record_history
            && !update.description.is_empty()
            && self.step_history.last() != Some(&update.description)
        {
            self.step_history.push(update.description.clone());
        }
        self.description = update.description;

        self.updated_at = Some(now);
        self.sequence += 1;
    }
}

/// Immutable snapshot of a target's state, as delivered to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateMessage {
    pub target: String,
    pub status: InstallStatus,
    pub progress: f64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub step_history: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub sequence: u64,
}

impl UpdateMessage {
    pub fn snapshot(target: &str, state: &ProgressState) -> Self {
        Self {
            target: target.to_string(),
            status: state.status,
            progress: state.progress,
            description: state.description.clone(),
            error: state.error.clone(),
            start_time: state.start_time,
            end_time: state.end_time,
            step_history: state.step_history.clone(),
            updated_at: state.updated_at,
            sequence: state.sequence,
        }
    }
}

/// Read-only view returned by `Orchestrator::state`.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetState {
    pub status: InstallStatus,
    pub progress: f64,
    pub description: String,
    pub error: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub step_history: Vec<String>,
}

impl From<&ProgressState> for TargetState {
    fn from(state: &ProgressState) -> Self {
        Self {
            status: state.status,
            progress: state.progress,
            description: state.description.clone(),
            error: state.error.clone(),
            start_time: state.start_time,
            end_time: state.end_time,
            step_history: state.step_history.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn start_and_end_are_write_once() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::seconds(10);
        let t2 = t0 + Duration::seconds(20);
        let mut state = ProgressState::default();

        state.apply(ProgressUpdate::installing(0.0, "starting"), t0);
        state.apply(ProgressUpdate::installing(0.5, "halfway"), t1);
        assert_eq!(state.start_time, Some(t0));

        state.apply(ProgressUpdate::failed(0.5, "boom", "exit 1"), t1);
        state.apply(ProgressUpdate::completed("done"), t2);
        assert_eq!(state.end_time, Some(t1));
        assert_eq!(state.status, InstallStatus::Completed);
    }

    #[test]
    fn history_suppresses_only_immediate_repeats() {
        let now = Utc::now();
        let mut state = ProgressState::default();
        for d in ["Step 1/2: a", "Step 1/2: a", "Step 2/2: b", "Step 1/2: a", ""] {
            state.apply(ProgressUpdate::step(0.1, d), now);
        }
        assert_eq!(
            state.step_history,
            vec!["Step 1/2: a", "Step 2/2: b", "Step 1/2: a"]
        );
    }

    #[test]
    fn unrecorded_updates_do_not_touch_history() {
        let now = Utc::now();
        let mut state = ProgressState::default();
        state.apply(ProgressUpdate::step(0.2, "Step 1/1: x"), now);
        state.apply(ProgressUpdate::installing(0.25, "Step 1/1: x (10s elapsed)"), now);
        state.apply(ProgressUpdate::failed(0.2, "Step 1/1 failed: x - nope", "nope"), now);
        assert_eq!(state.step_history, vec!["Step 1/1: x"]);
        assert_eq!(state.description, "Step 1/1 failed: x - nope");
        assert_eq!(state.error.as_deref(), Some("nope"));
        assert_eq!(state.sequence, 3);
    }

    #[test]
    fn last_write_wins_even_backwards() {
        let now = Utc::now();
        let mut state = ProgressState::default();
        state.apply(ProgressUpdate::installing(0.8, "tick"), now);
        state.apply(ProgressUpdate::installing(0.4, "step"), now);
        assert_eq!(state.progress, 0.4);
    }

    #[test]
    fn snapshot_is_detached_from_live_state() {
        let now = Utc::now();
        let mut state = ProgressState::default();
        state.apply(ProgressUpdate::step(0.3, "Step 1/2: a"), now);
        let snap = UpdateMessage::snapshot("k3s", &state);
        state.apply(ProgressUpdate::step(0.6, "Step 2/2: b"), now);

        assert_eq!(snap.progress, 0.3);
        assert_eq!(snap.step_history, vec!["Step 1/2: a"]);
        assert_eq!(state.step_history.len(), 2);
    }
}
