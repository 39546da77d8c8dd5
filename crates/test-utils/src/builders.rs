#![allow(dead_code)]

use clusterboot::config::{
    FactsSection, OrchestratorSection, PatternConfig, PlanFile, RawPlanFile, StepConfig,
    TargetConfig,
};

/// Builder for `PlanFile` to simplify test setup.
pub struct PlanFileBuilder {
    plan: RawPlanFile,
}

impl PlanFileBuilder {
    pub fn new() -> Self {
        Self {
            plan: RawPlanFile {
                orchestrator: OrchestratorSection::default(),
                facts: FactsSection::default(),
                target: vec![],
            },
        }
    }

    pub fn with_target(mut self, name: &str, steps: Vec<StepConfig>) -> Self {
        self.plan.target.push(TargetConfig {
            name: name.to_string(),
            step: steps,
        });
        self
    }

    pub fn with_fact(mut self, fact: &str) -> Self {
        self.plan.facts.items.push(fact.to_string());
        self
    }

    pub fn update_buffer(mut self, capacity: usize) -> Self {
        self.plan.orchestrator.update_buffer = capacity;
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.plan.orchestrator.timeout = Some(timeout.to_string());
        self
    }

    pub fn raw(self) -> RawPlanFile {
        self.plan
    }

    pub fn build(self) -> PlanFile {
        PlanFile::try_from(self.plan).expect("Failed to build valid plan from builder")
    }
}

impl Default for PlanFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `StepConfig`.
pub struct StepConfigBuilder {
    step: StepConfig,
}

impl StepConfigBuilder {
    pub fn new(description: &str, progress: f64, cmd: &str) -> Self {
        Self {
            step: StepConfig {
                description: description.to_string(),
                progress,
                cmd: cmd.to_string(),
                interpolate: None,
                timeout: None,
                pattern: vec![],
            },
        }
    }

    pub fn interpolate(mut self, interval: &str) -> Self {
        self.step.interpolate = Some(interval.to_string());
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.step.timeout = Some(timeout.to_string());
        self
    }

    pub fn pattern(mut self, regex: &str, progress: f64) -> Self {
        self.step.pattern.push(PatternConfig {
            regex: regex.to_string(),
            progress,
        });
        self
    }

    pub fn build(self) -> StepConfig {
        self.step
    }
}
