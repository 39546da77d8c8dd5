// src/progress/interpolator.rs

//! Time-based synthetic progress for steps with no real progress signal.
//!
//! While an action blocks on one coarse external call, the interpolator
//! nudges the target's progress from the step's floor towards (never to) the
//! next step's floor, so the consumer sees motion instead of a frozen bar.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::context::Context;
use crate::progress::hub::ProgressReporter;
use crate::progress::state::ProgressUpdate;
use crate::ticker::TickerGuard;
use crate::types::format_elapsed;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_STEPS: f64 = 20.0;

/// Parameters of one interpolation run.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationSpec {
    /// Last genuinely published progress.
    pub floor: f64,
    /// Exclusive upper bound; never published.
    pub ceiling: f64,
    pub interval: Duration,
    /// Added per tick while the result stays below `ceiling`.
    pub increment: f64,
    pub description: String,
    /// Append `" (<elapsed> elapsed)"` to the description on each tick.
    pub annotate_elapsed: bool,
}

impl InterpolationSpec {
    pub fn new(floor: f64, ceiling: f64, description: impl Into<String>) -> Self {
        Self {
            floor,
            ceiling,
            interval: DEFAULT_INTERVAL,
            increment: (ceiling - floor) / DEFAULT_STEPS,
            description: description.into(),
            annotate_elapsed: true,
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn increment(mut self, increment: f64) -> Self {
        self.increment = increment;
        self
    }

    pub fn annotate_elapsed(mut self, annotate: bool) -> Self {
        self.annotate_elapsed = annotate;
        self
    }

    fn is_valid(&self) -> bool {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        in_range(self.floor)
            && in_range(self.ceiling)
            && self.floor < self.ceiling
            && self.increment.is_finite()
            && self.increment > 0.0
            && !self.interval.is_zero()
    }

    /// Next value after `current`: advanced by `increment`, or held if that
    /// would reach the ceiling.
    pub fn advance(&self, current: f64) -> f64 {
        let candidate = current + self.increment;
        if candidate < self.ceiling {
            candidate
        } else {
            current
        }
    }
}

pub type InterpolatorGuard = TickerGuard;

pub struct Interpolator;

impl Interpolator {
    /// Start interpolating for the current step.
    ///
    /// The returned guard must live for exactly as long as the wrapped call;
    /// dropping it (or calling `stop().await`) ends the task. An invalid range
    /// yields an inert guard and a warning.
    pub fn start(
        reporter: ProgressReporter,
        spec: InterpolationSpec,
        ctx: &Context,
    ) -> InterpolatorGuard {
        if !spec.is_valid() {
            warn!(
                target_name = %reporter.target(),
                floor = spec.floor,
                ceiling = spec.ceiling,
                increment = spec.increment,
                "invalid interpolation range; not interpolating"
            );
            return TickerGuard::inert();
        }

        let task_ctx = ctx.clone();
        TickerGuard::spawn(ctx, move |done| interpolate(reporter, spec, task_ctx, done))
    }
}

async fn interpolate(
    reporter: ProgressReporter,
    spec: InterpolationSpec,
    ctx: Context,
    done: CancellationToken,
) {
    let started = Instant::now();
    let mut ticker = tokio::time::interval_at(started + spec.interval, spec.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut current = spec.floor;

    loop {
        tokio::select! {
            biased;
            _ = done.cancelled() => break,
            reason = ctx.done() => {
                debug!(
                    target_name = %reporter.target(),
                    %reason,
                    "context ended; stopping interpolation"
                );
                break;
            }
            _ = ticker.tick() => {
                current = spec.advance(current);
                let description = if spec.annotate_elapsed {
                    format!("{} ({} elapsed)", spec.description, format_elapsed(started.elapsed()))
                } else {
                    spec.description.clone()
                };
                reporter.report(ProgressUpdate::installing(current, description));
            }
        }
    }

    debug!(target_name = %reporter.target(), progress = current, "interpolation stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_never_reaches_ceiling() {
        let spec = InterpolationSpec::new(0.3, 0.5, "x").increment(0.08);
        let mut v = spec.floor;
        for _ in 0..100 {
            v = spec.advance(v);
            assert!(v < spec.ceiling);
        }
        assert!((v - 0.46).abs() < 1e-9);
    }

    #[test]
    fn empty_or_inverted_ranges_are_invalid() {
        assert!(!InterpolationSpec::new(0.5, 0.5, "x").is_valid());
        assert!(!InterpolationSpec::new(0.7, 0.5, "x").is_valid());
        assert!(!InterpolationSpec::new(0.1, 1.5, "x").is_valid());
        assert!(!InterpolationSpec::new(0.1, 0.5, "x").interval(Duration::ZERO).is_valid());
        assert!(InterpolationSpec::new(0.1, 0.5, "x").is_valid());
    }
}
