//! Cooperative scheduling.
//!
//! All scanning and splicing happens on one logical thread, interleaved with
//! the host's own loop. Work is queued and pumped in slices bounded by an
//! [`IdleDeadline`]; a slice that runs out of budget yields and the next one
//! resumes where it left off. There are no cancel tokens: idempotence and
//! the processed marker make dropped or replayed work harmless.

use std::time::{Duration, Instant};

use crate::dom::NodeId;

/// The host's "time remaining" signal for the current idle slice.
pub trait IdleDeadline {
    /// Remaining budget in the current slice.
    fn time_remaining(&self) -> Duration;

    fn should_yield(&self) -> bool {
        self.time_remaining().is_zero()
    }
}

/// Never yields; drives the queue to completion in one call.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDeadline;

impl IdleDeadline for NoDeadline {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// Fixed wall-clock budget measured from construction. Hosts without a real
/// idle callback build one of these per slice.
#[derive(Debug)]
pub struct SliceBudget {
    started: Instant,
    budget: Duration,
}

impl SliceBudget {
    pub fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }
}

impl IdleDeadline for SliceBudget {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.started.elapsed())
    }
}

/// One queued unit of work. Subtrees expand into their candidate leaves when
/// popped; leaves reconcile one run each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkItem {
    Subtree(NodeId),
    Leaf(NodeId),
}

/// Outcome of one pump slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpStatus {
    /// The queue drained; `reconciled` runs were spliced this slice.
    Done { reconciled: usize },
    /// The deadline hit with work left. Pump again on the next idle slice.
    Yielded { reconciled: usize },
}

impl PumpStatus {
    pub fn reconciled(self) -> usize {
        match self {
            PumpStatus::Done { reconciled } | PumpStatus::Yielded { reconciled } => reconciled,
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, PumpStatus::Done { .. })
    }
}
