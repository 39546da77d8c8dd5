// src/exec/plan.rs

//! Turn a validated plan target into sequencer steps.

use std::sync::Arc;

use crate::config::TargetPlan;
use crate::engine::{Orchestrator, Step};
use crate::exec::CommandAction;
use crate::progress::InterpolationSpec;

/// Build one [`Step`] per planned step, each running a [`CommandAction`].
///
/// Step `i` moves from its own progress value towards step `i+1`'s (or 1.0
/// for the last step). Steps with pattern rules report classified output;
/// steps with `interpolate` fall back to time-based progress.
pub fn steps_for_target(target: &TargetPlan, orchestrator: &Orchestrator) -> Vec<Step> {
    let total = target.steps.len();

    target
        .steps
        .iter()
        .enumerate()
        .map(|(idx, planned)| {
            let floor = planned.progress;
            let ceiling = target
                .steps
                .get(idx + 1)
                .map(|next| next.progress)
                .unwrap_or(1.0);
            let description = format!("Step {}/{}: {}", idx + 1, total, planned.description);

            let mut action = CommandAction::new(planned.cmd.as_str())
                .with_logs(orchestrator.log_sink());
            if let Some(timeout) = planned.timeout {
                action = action.with_timeout(timeout);
            }

            let reporter = orchestrator.reporter(&target.name);
            if let Some(classifier) = &planned.classifier {
                action = action.with_classifier(
                    reporter,
                    Arc::new(classifier.clone()),
                    floor,
                    ceiling,
                    description,
                );
            } else if let Some(interval) = planned.interpolate {
                action = action.with_interpolation(
                    reporter,
                    InterpolationSpec::new(floor, ceiling, description).interval(interval),
                );
            }

            Step::new(planned.description.as_str(), planned.progress, action)
        })
        .collect()
}
