mod common;

use std::collections::BTreeSet;
use std::time::Duration;

use proptest::prelude::*;
use tokio::sync::mpsc;

use clusterboot::context::Context;
use clusterboot::engine::{Orchestrator, OrchestratorChannels, OrchestratorOptions, Step};
use clusterboot::facts::FactRotator;
use common::{BlockingAction, TestResult, drain};

fn fact_set() -> impl Strategy<Value = BTreeSet<String>> {
    proptest::collection::btree_set("[a-z]{1,12}", 1..12)
}

proptest! {
    #[test]
    fn each_cycle_is_a_permutation(facts in fact_set(), seed in any::<u64>()) {
        let mut rotator = FactRotator::with_seed(facts.iter().cloned(), seed);
        for _cycle in 0..3 {
            let cycle: BTreeSet<String> = (0..facts.len())
                .map(|_| rotator.next_fact().unwrap())
                .collect();
            prop_assert_eq!(&cycle, &facts);
        }
    }

    #[test]
    fn call_after_a_full_cycle_is_still_a_member(facts in fact_set(), seed in any::<u64>()) {
        let mut rotator = FactRotator::with_seed(facts.iter().cloned(), seed);
        for _ in 0..facts.len() {
            rotator.next_fact();
        }
        let next = rotator.next_fact().unwrap();
        prop_assert!(facts.contains(&next));
    }
}

#[test]
fn empty_set_yields_nothing() {
    let mut rotator = FactRotator::new(Vec::<String>::new());
    assert!(rotator.is_empty());
    assert_eq!(rotator.next_fact(), None);
}

#[tokio::test(start_paused = true)]
async fn facts_rotate_while_a_run_is_in_progress() -> TestResult {
    let (tx, _updates) = mpsc::channel(64);
    let (fact_tx, mut facts) = mpsc::channel(64);
    let orch = Orchestrator::new(
        OrchestratorChannels::new(tx).with_facts(fact_tx),
        OrchestratorOptions {
            facts: vec!["one".into(), "two".into(), "three".into()],
            fact_interval: Duration::from_secs(8),
            ..OrchestratorOptions::default()
        },
    );

    assert!(orch.fact_sink().is_configured());

    let steps = vec![Step::new("wait", 0.5, BlockingAction::new())];
    let ctx = Context::new().with_timeout(Duration::from_secs(20));
    assert!(orch.run(&ctx, "k3s", &steps).await.is_err());

    // Emitted at 0s, 8s and 16s; the run ends at 20s.
    let received = drain(&mut facts);
    assert_eq!(received.len(), 3);
    let unique: BTreeSet<_> = received.iter().cloned().collect();
    assert_eq!(unique.len(), 3);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(drain(&mut facts).is_empty());
    Ok(())
}
