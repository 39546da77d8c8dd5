#![allow(dead_code, unused_imports)]

use std::error::Error;

pub use clusterboot_test_utils::builders::{PlanFileBuilder, StepConfigBuilder};
pub use clusterboot_test_utils::fake_action::{
    BlockingAction, CancelContextAction, ErrX, FailingAction, SpyAction,
};
pub use clusterboot_test_utils::{
    drain, init_tracing, orchestrator, orchestrator_with_logs, with_timeout,
};

pub type TestResult = Result<(), Box<dyn Error>>;
