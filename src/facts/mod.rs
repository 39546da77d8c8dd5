// src/facts/mod.rs

//! Rotating informational messages shown during long waits.

pub mod rotator;
pub mod ticker;

pub use rotator::FactRotator;
pub use ticker::{FactTickerGuard, spawn_fact_ticker};
