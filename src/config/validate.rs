// src/config/validate.rs

use tracing::warn;

use crate::config::duration::parse_duration;
use crate::config::model::{
    FactSettings, OrchestratorSettings, PlanFile, RawPlanFile, StepConfig, StepPlan, TargetConfig,
    TargetPlan,
};
use crate::errors::{BootError, Result};
use crate::progress::PatternClassifier;

impl TryFrom<RawPlanFile> for PlanFile {
    type Error = BootError;

    fn try_from(raw: RawPlanFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_targets(&raw)?;
        let orchestrator = validate_orchestrator(&raw)?;
        let facts = FactSettings {
            interval: duration_field("[facts].interval", &raw.facts.interval)?,
            items: raw.facts.items,
        };
        let targets = raw
            .target
            .iter()
            .map(validate_target)
            .collect::<Result<Vec<_>>>()?;

        Ok(PlanFile {
            orchestrator,
            facts,
            targets,
        })
    }
}

fn ensure_has_targets(raw: &RawPlanFile) -> Result<()> {
    if raw.target.is_empty() {
        return Err(BootError::Config(
            "plan must contain at least one [[target]] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_orchestrator(raw: &RawPlanFile) -> Result<OrchestratorSettings> {
    let section = &raw.orchestrator;

    if section.update_buffer == 0 {
        return Err(BootError::Config(
            "[orchestrator].update_buffer must be >= 1 (got 0)".to_string(),
        ));
    }
    if section.log_buffer == 0 {
        return Err(BootError::Config(
            "[orchestrator].log_buffer must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(OrchestratorSettings {
        update_buffer: section.update_buffer,
        log_buffer: section.log_buffer,
        terminal_send_timeout: duration_field(
            "[orchestrator].terminal_send_timeout",
            &section.terminal_send_timeout,
        )?,
        timeout: section
            .timeout
            .as_deref()
            .map(|s| duration_field("[orchestrator].timeout", s))
            .transpose()?,
    })
}

fn validate_target(target: &TargetConfig) -> Result<TargetPlan> {
    if target.name.trim().is_empty() {
        return Err(BootError::Config(
            "every [[target]] needs a non-empty `name`".to_string(),
        ));
    }

    let steps = target
        .step
        .iter()
        .enumerate()
        .map(|(idx, step)| validate_step(&target.name, idx + 1, step))
        .collect::<Result<Vec<_>>>()?;

    // The sequencer tolerates decreasing progress; only flag it.
    for pair in steps.windows(2) {
        if pair[1].progress < pair[0].progress {
            warn!(
                target_name = %target.name,
                from = %pair[0].description,
                to = %pair[1].description,
                "step progress decreases; the progress bar will move backwards"
            );
        }
    }

    Ok(TargetPlan {
        name: target.name.clone(),
        steps,
    })
}

fn validate_step(target: &str, index: usize, step: &StepConfig) -> Result<StepPlan> {
    let at = format!("target '{target}' step {index}");

    if step.description.trim().is_empty() {
        return Err(BootError::Config(format!("{at}: `description` must not be empty")));
    }
    if step.cmd.trim().is_empty() {
        return Err(BootError::Config(format!("{at}: `cmd` must not be empty")));
    }
    check_progress(&at, "progress", step.progress)?;

    let classifier = if step.pattern.is_empty() {
        None
    } else {
        for rule in &step.pattern {
            check_progress(&at, "pattern progress", rule.progress)?;
        }
        let classifier = PatternClassifier::from_patterns(
            step.pattern.iter().map(|p| (p.regex.as_str(), p.progress)),
        )
        .map_err(|e| BootError::Config(format!("{at}: invalid pattern regex: {e}")))?;
        Some(classifier)
    };

    let interpolate = step
        .interpolate
        .as_deref()
        .map(|s| duration_field(&format!("{at} interpolate"), s))
        .transpose()?;
    if interpolate.is_some_and(|d| d.is_zero()) {
        return Err(BootError::Config(format!("{at}: `interpolate` must be > 0")));
    }

    Ok(StepPlan {
        description: step.description.clone(),
        progress: step.progress,
        cmd: step.cmd.clone(),
        interpolate,
        timeout: step
            .timeout
            .as_deref()
            .map(|s| duration_field(&format!("{at} timeout"), s))
            .transpose()?,
        classifier,
    })
}

fn check_progress(at: &str, field: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(BootError::Config(format!(
            "{at}: {field} must be within [0, 1] (got {value})"
        )));
    }
    Ok(())
}

fn duration_field(field: &str, value: &str) -> Result<std::time::Duration> {
    parse_duration(value).map_err(|e| BootError::Config(format!("{field}: {e}")))
}
