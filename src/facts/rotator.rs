// src/facts/rotator.rs

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Non-repeating randomized cycler over a fixed set of facts.
///
/// Each cycle is a fresh shuffle of the base set, so every fact is returned
/// exactly once per cycle. The first fact of a new cycle may equal the last
/// fact of the previous one.
///
/// Single caller: there is no internal locking.
#[derive(Debug, Clone)]
pub struct FactRotator {
    facts: Vec<String>,
    queue: Vec<String>,
    cursor: usize,
    rng: StdRng,
}

impl FactRotator {
    pub fn new<I, S>(facts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_rng(facts, StdRng::from_entropy())
    }

    /// Deterministic shuffle order, for tests and reproducible demos.
    pub fn with_seed<I, S>(facts: I, seed: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_rng(facts, StdRng::seed_from_u64(seed))
    }

    fn with_rng<I, S>(facts: I, rng: StdRng) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let facts: Vec<String> = facts.into_iter().map(Into::into).collect();
        let mut rotator = Self {
            queue: Vec::with_capacity(facts.len()),
            facts,
            cursor: 0,
            rng,
        };
        rotator.reshuffle();
        rotator
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Next fact, or `None` if the base set is empty.
    pub fn next_fact(&mut self) -> Option<String> {
        if self.facts.is_empty() {
            return None;
        }
        if self.cursor >= self.queue.len() {
            self.reshuffle();
        }
        let fact = self.queue[self.cursor].clone();
        self.cursor += 1;
        Some(fact)
    }

    fn reshuffle(&mut self) {
        self.queue.clone_from(&self.facts);
        self.queue.shuffle(&mut self.rng);
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn one_cycle_is_a_permutation() {
        let facts = ["a", "b", "c", "d", "e"];
        let mut rotator = FactRotator::with_seed(facts, 7);
        let seen: HashSet<String> = (0..facts.len())
            .map(|_| rotator.next_fact().unwrap())
            .collect();
        assert_eq!(seen.len(), facts.len());
    }

    #[test]
    fn keeps_going_after_a_cycle() {
        let mut rotator = FactRotator::with_seed(["x", "y"], 1);
        for _ in 0..2 {
            rotator.next_fact();
        }
        let again = rotator.next_fact().unwrap();
        assert!(again == "x" || again == "y");
    }

    #[test]
    fn empty_set_yields_nothing() {
        let mut rotator = FactRotator::new(Vec::<String>::new());
        assert!(rotator.is_empty());
        assert_eq!(rotator.next_fact(), None);
    }

    #[test]
    fn single_fact_repeats() {
        let mut rotator = FactRotator::new(["only"]);
        assert_eq!(rotator.next_fact().as_deref(), Some("only"));
        assert_eq!(rotator.next_fact().as_deref(), Some("only"));
    }
}
