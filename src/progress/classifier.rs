// src/progress/classifier.rs

//! Real progress signals parsed from a wrapped tool's output.
//!
//! Some tools print recognisable lines while they work ("Pulling image",
//! "Waiting for deployment"). A classifier maps such a line to a progress
//! value; [`SignalTracker`] keeps those values forward-only and below the
//! next step's floor.

use std::fmt;

use regex::Regex;

/// Maps one line of tool output to a progress value, if it recognises it.
pub trait OutputClassifier: Send + Sync + fmt::Debug {
    fn classify(&self, line: &str) -> Option<f64>;
}

#[derive(Debug, Clone)]
pub struct PatternRule {
    pub regex: Regex,
    pub progress: f64,
}

/// Ordered `regex -> progress` rules; the first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct PatternClassifier {
    rules: Vec<PatternRule>,
}

impl PatternClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, regex: Regex, progress: f64) -> Self {
        self.rules.push(PatternRule { regex, progress });
        self
    }

    /// Compile `(pattern, progress)` pairs in order.
    pub fn from_patterns<'a, I>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut classifier = Self::new();
        for (pattern, progress) in patterns {
            classifier = classifier.with_rule(Regex::new(pattern)?, progress);
        }
        Ok(classifier)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

impl OutputClassifier for PatternClassifier {
    fn classify(&self, line: &str) -> Option<f64> {
        self.rules
            .iter()
            .find(|rule| rule.regex.is_match(line))
            .map(|rule| rule.progress)
    }
}

/// Forward-only progress within one step's `[floor, ceiling)` window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalTracker {
    ceiling: f64,
    current: f64,
}

impl SignalTracker {
    pub fn new(floor: f64, ceiling: f64) -> Self {
        Self {
            ceiling,
            current: floor,
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Accept `value` if it moves progress forward without reaching the
    /// ceiling. Returns the new value when accepted.
    pub fn advance(&mut self, value: f64) -> Option<f64> {
        if value > self.current && value < self.ceiling {
            self.current = value;
            Some(value)
        } else {
            None
        }
    }
}
