//! Change watching: turns mutation-journal batches into scheduled work.
//!
//! Never reconciles synchronously inside the notification path; every batch
//! is an enqueue, and the scheduler does the traversal later. The processed
//! marker check here is a first filter — the reconciler re-checks before
//! touching anything.

use std::collections::{HashSet, VecDeque};

use crate::config::EngineConfig;
use crate::dom::Tree;
use crate::reconcile::is_excluded;
use crate::schedule::WorkItem;

pub(crate) fn drain_into_queue(
    tree: &mut Tree,
    config: &EngineConfig,
    queue: &mut VecDeque<WorkItem>,
) {
    let batch = tree.take_mutations();
    if batch.is_empty() {
        return;
    }
    let mut seen = HashSet::new();
    for record in batch {
        let target = record.target();
        if !tree.is_alive(target) || !seen.insert(target) {
            continue;
        }
        // Already-rendered output never re-enters the queue.
        if is_excluded(tree, target, config) {
            continue;
        }
        queue.push_back(WorkItem::Subtree(target));
    }
    tracing::trace!(queued = queue.len(), "drained mutation batch");
}
