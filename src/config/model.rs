// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::progress::PatternClassifier;

/// Install plan exactly as read from TOML, before validation.
///
/// ```toml
/// [orchestrator]
/// update_buffer = 32
/// terminal_send_timeout = "2s"
///
/// [facts]
/// interval = "8s"
/// items = ["k3s ships as a single binary"]
///
/// [[target]]
/// name = "k3s"
///
/// [[target.step]]
/// description = "Install k3s"
/// progress = 0.3
/// cmd = "sh install-k3s.sh"
/// interpolate = "5s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawPlanFile {
    #[serde(default)]
    pub orchestrator: OrchestratorSection,

    #[serde(default)]
    pub facts: FactsSection,

    /// Targets run in file order.
    #[serde(default)]
    pub target: Vec<TargetConfig>,
}

/// `[orchestrator]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestratorSection {
    /// Capacity of the update channel handed to the consumer.
    #[serde(default = "default_update_buffer")]
    pub update_buffer: usize,

    #[serde(default = "default_log_buffer")]
    pub log_buffer: usize,

    /// How long a final Completed/Failed update may wait for the consumer.
    #[serde(default = "default_terminal_send_timeout")]
    pub terminal_send_timeout: String,

    /// Overall deadline for the whole plan.
    #[serde(default)]
    pub timeout: Option<String>,
}

fn default_update_buffer() -> usize {
    32
}

fn default_log_buffer() -> usize {
    64
}

fn default_terminal_send_timeout() -> String {
    "2s".to_string()
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            update_buffer: default_update_buffer(),
            log_buffer: default_log_buffer(),
            terminal_send_timeout: default_terminal_send_timeout(),
            timeout: None,
        }
    }
}

/// `[facts]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactsSection {
    #[serde(default = "default_fact_interval")]
    pub interval: String,

    #[serde(default)]
    pub items: Vec<String>,
}

fn default_fact_interval() -> String {
    "8s".to_string()
}

impl Default for FactsSection {
    fn default() -> Self {
        Self {
            interval: default_fact_interval(),
            items: Vec::new(),
        }
    }
}

/// `[[target]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    pub name: String,

    #[serde(default)]
    pub step: Vec<StepConfig>,
}

/// `[[target.step]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    pub description: String,

    /// Progress published when the step starts, in `[0, 1]`.
    pub progress: f64,

    /// Shell command run as the step's action.
    pub cmd: String,

    /// Interval for time-based interpolation (e.g. `"5s"`).
    ///
    /// Ignored when `pattern` rules are present.
    #[serde(default)]
    pub interpolate: Option<String>,

    /// Per-step deadline.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Output rules mapping matching lines to progress values.
    #[serde(default)]
    pub pattern: Vec<PatternConfig>,
}

/// `[[target.step.pattern]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternConfig {
    pub regex: String,
    pub progress: f64,
}

/// A validated plan with every duration and regex already parsed.
#[derive(Debug, Clone)]
pub struct PlanFile {
    pub orchestrator: OrchestratorSettings,
    pub facts: FactSettings,
    pub targets: Vec<TargetPlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub update_buffer: usize,
    pub log_buffer: usize,
    pub terminal_send_timeout: Duration,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactSettings {
    pub interval: Duration,
    pub items: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TargetPlan {
    pub name: String,
    pub steps: Vec<StepPlan>,
}

#[derive(Debug, Clone)]
pub struct StepPlan {
    pub description: String,
    pub progress: f64,
    pub cmd: String,
    pub interpolate: Option<Duration>,
    pub timeout: Option<Duration>,
    pub classifier: Option<PatternClassifier>,
}

impl PlanFile {
    pub fn target(&self, name: &str) -> Option<&TargetPlan> {
        self.targets.iter().find(|t| t.name == name)
    }
}
