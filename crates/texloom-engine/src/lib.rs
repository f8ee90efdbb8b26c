//! texloom engine
//!
//! Finds math notation embedded as delimited substrings inside the free-form
//! text of a live, mutable document tree and replaces each span with rendered
//! markup, leaving surrounding text and structure intact. Already-rendered
//! output is marked and never rescanned, so the engine can sit behind a
//! stream of tree mutations without ever reprocessing its own work.
//!
//! The rendering backend is a collaborator behind [`MathRenderer`];
//! `texloom-render` provides the MathML implementation.

use std::collections::VecDeque;
use std::sync::Arc;

pub mod classify;
pub mod config;
pub mod dom;
pub mod error;
pub mod reclassify;
mod reconcile;
pub mod renderer;
pub mod run;
pub mod scan;
pub mod schedule;
mod watch;

pub use classify::{Classifier, PatternClassifier};
pub use config::EngineConfig;
pub use dom::{Mutation, NodeId, NodeKind, Tree};
pub use error::{EngineError, RenderError};
pub use renderer::MathRenderer;
pub use scan::{DelimiterSpec, Segment};
pub use schedule::{IdleDeadline, NoDeadline, PumpStatus, SliceBudget};

use schedule::WorkItem;

/// The engine: owns the document tree, watches its mutation journal, and
/// pumps reconciliation work in cooperative slices.
pub struct Engine {
    tree: Tree,
    queue: VecDeque<WorkItem>,
    classifier: Box<dyn Classifier>,
    renderer: Arc<dyn MathRenderer>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig, renderer: Arc<dyn MathRenderer>) -> Self {
        Self {
            tree: Tree::new(),
            queue: VecDeque::new(),
            classifier: Box::new(PatternClassifier),
            renderer,
            config,
        }
    }

    /// Swap in a different classification strategy.
    pub fn with_classifier(mut self, classifier: Box<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Mutable host access. Edits made here land in the mutation journal and
    /// get picked up by the next [`Engine::pump`].
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// Whether the rendering backend is ready.
    pub fn renderer_loaded(&self) -> bool {
        self.renderer.is_loaded()
    }

    /// Manual full reprocess: discard pending notifications and queue the
    /// whole document. Already-processed containers are still skipped.
    pub fn process_document(&mut self) {
        self.tree.take_mutations();
        self.queue.clear();
        let root = self.tree.root();
        self.queue.push_back(WorkItem::Subtree(root));
    }

    /// Queue one subtree on demand.
    pub fn process_subtree(&mut self, id: NodeId) {
        self.queue.push_back(WorkItem::Subtree(id));
    }

    /// Run queued work until the queue drains or the deadline hits. Pending
    /// mutation notifications are folded into the queue first, so hosts that
    /// only ever call `pump` from their idle callback get incremental
    /// behavior for free.
    #[tracing::instrument(skip_all)]
    pub fn pump(&mut self, deadline: &dyn IdleDeadline) -> PumpStatus {
        watch::drain_into_queue(&mut self.tree, &self.config, &mut self.queue);
        let mut reconciled = 0;
        while let Some(item) = self.queue.pop_front() {
            match item {
                WorkItem::Subtree(id) => {
                    if self.tree.is_alive(id) {
                        // Front-loaded so leaves run in document order before
                        // any later-queued subtree.
                        let leaves = self.candidate_leaves(id);
                        for &leaf in leaves.iter().rev() {
                            self.queue.push_front(WorkItem::Leaf(leaf));
                        }
                    }
                }
                WorkItem::Leaf(id) => {
                    if reconcile::reconcile_leaf(
                        &mut self.tree,
                        id,
                        self.classifier.as_ref(),
                        self.renderer.as_ref(),
                        &self.config,
                    ) {
                        reconciled += 1;
                    }
                }
            }
            if !self.queue.is_empty() && deadline.should_yield() {
                return PumpStatus::Yielded { reconciled };
            }
        }
        PumpStatus::Done { reconciled }
    }

    /// Pump with no deadline. Returns the number of runs spliced.
    pub fn process_to_completion(&mut self) -> usize {
        self.pump(&NoDeadline).reconciled()
    }

    /// Restore every processed container under `root` to its original text,
    /// undoing rendering. Returns how many containers were restored.
    pub fn recover_originals(&mut self, root: NodeId) -> usize {
        reconcile::recover_originals(&mut self.tree, root, &self.config)
    }

    fn candidate_leaves(&self, id: NodeId) -> Vec<NodeId> {
        if reconcile::is_excluded(&self.tree, id, &self.config) {
            return Vec::new();
        }
        let config = &self.config;
        self.tree.text_leaves_where(id, &mut |el| {
            el.has_class(&config.processed_class) || config.skips_tag(&el.name)
        })
    }
}
