//! Progress reporting for backup runs
//!
//! Events are advisory: the sink cannot pause or cancel the pipeline, and a
//! caller that wants no reporting passes a no-op sink.

use std::fmt;

/// Pipeline stages, in the order they occur
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Preparing,
    Encrypting,
    Compressing,
    Finalizing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Preparing => "preparing",
            Self::Encrypting => "encrypting",
            Self::Compressing => "compressing",
            Self::Finalizing => "finalizing",
        };
        write!(f, "{}", label)
    }
}

/// A single progress report
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Current pipeline stage
    pub stage: Stage,
    /// Overall completion estimate, 0..=100
    pub percent: u8,
    /// Human-readable description of the current step
    pub label: String,
    /// Entities processed so far in this stage
    pub processed: usize,
    /// Total entities in this stage, when known
    pub total: usize,
}

impl ProgressEvent {
    pub fn new(stage: Stage, percent: u8, label: impl Into<String>) -> Self {
        Self {
            stage,
            percent,
            label: label.into(),
            processed: 0,
            total: 0,
        }
    }

    pub fn with_counts(mut self, processed: usize, total: usize) -> Self {
        self.processed = processed;
        self.total = total;
        self
    }
}

/// Caller-supplied progress sink
pub type ProgressSink<'a> = dyn FnMut(ProgressEvent) + 'a;
