// src/types.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a single install target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallStatus {
    #[default]
    Pending,
    Installing,
    Completed,
    Failed,
}

impl InstallStatus {
    /// Completed and Failed are terminal; nothing follows them within a run.
    pub fn is_terminal(self) -> bool {
        matches!(self, InstallStatus::Completed | InstallStatus::Failed)
    }
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstallStatus::Pending => "pending",
            InstallStatus::Installing => "installing",
            InstallStatus::Completed => "completed",
            InstallStatus::Failed => "failed",
        };
        f.pad(s)
    }
}

/// Render a duration as `1h02m03s`, `4m05s` or `7s` for progress text.
pub fn format_elapsed(elapsed: std::time::Duration) -> String {
    let secs = elapsed.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h{m:02}m{s:02}s")
    } else if m > 0 {
        format!("{m}m{s:02}s")
    } else {
        format!("{s}s")
    }
}
