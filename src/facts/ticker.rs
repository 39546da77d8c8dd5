// src/facts/ticker.rs

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::context::Context;
use crate::facts::FactRotator;
use crate::sink::FactSink;
use crate::ticker::TickerGuard;

pub type FactTickerGuard = TickerGuard;

/// Push one fact into `sink` now and then every `interval` until the guard
/// is dropped or `ctx` ends.
///
/// The ticker takes ownership of `rotator`; nothing else can touch it.
pub fn spawn_fact_ticker(
    mut rotator: FactRotator,
    interval: Duration,
    sink: FactSink,
    ctx: &Context,
) -> FactTickerGuard {
    if rotator.is_empty() || interval.is_zero() || !sink.is_configured() {
        return TickerGuard::inert();
    }

    let task_ctx = ctx.clone();
    TickerGuard::spawn(ctx, move |done| async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = done.cancelled() => break,
                _ = task_ctx.done() => break,
                _ = ticker.tick() => {
                    if let Some(fact) = rotator.next_fact() {
                        sink.send_fact(fact);
                    }
                }
            }
        }

        debug!("fact ticker stopped");
    })
}
