//! Reconciliation: replaces a run's leaves with rendered output.
//!
//! Idempotent by construction: everything the reconciler produces sits under
//! the processed marker class, and marked subtrees are excluded from every
//! future scan. Runs that need no rendering are left completely untouched so
//! the splice never generates mutation noise for unchanged content.

use crate::classify::Classifier;
use crate::config::EngineConfig;
use crate::dom::{NodeId, NodeKind, Tree};
use crate::error::RenderError;
use crate::reclassify::reclassify;
use crate::renderer::MathRenderer;
use crate::run::merge_run;
use crate::scan::{self, DELIMITERS, Segment, active_delimiters, contains_delimiter};

/// True if `id` sits under (or is) a processed container or a verbatim
/// region. Such nodes never join a run.
pub(crate) fn is_excluded(tree: &Tree, id: NodeId, config: &EngineConfig) -> bool {
    tree.ancestor_or_self_matches(id, |el| {
        el.has_class(&config.processed_class) || config.skips_tag(&el.name)
    })
}

/// Reconcile the run containing `leaf`. Returns true if the tree changed.
pub(crate) fn reconcile_leaf(
    tree: &mut Tree,
    leaf: NodeId,
    classifier: &dyn Classifier,
    renderer: &dyn MathRenderer,
    config: &EngineConfig,
) -> bool {
    if !tree.is_alive(leaf) || !tree.is_text(leaf) || is_excluded(tree, leaf, config) {
        return false;
    }
    // A detached leaf has no position to splice back into.
    if tree.parent(leaf).is_none() {
        return false;
    }

    let run = merge_run(tree, leaf);
    let delims = active_delimiters(config.single_dollar);
    let reclassified = if config.reclassify_brackets {
        reclassify(&run.text, classifier)
    } else {
        run.text.clone()
    };
    // Nothing promoted and nothing that could open a span: leave the leaves
    // alone. Touching them would itself show up as a mutation.
    if reclassified == run.text && !contains_delimiter(&run.text, delims) {
        return false;
    }

    let segments = scan::scan(&reclassified, delims, classifier);
    if !segments
        .iter()
        .any(|segment| matches!(segment, Segment::Math { .. }))
    {
        return false;
    }

    tree.with_journal_paused(|tree| {
        let first = run.parts[0];
        let parent = tree.parent(first);
        let index = tree.child_index(first);
        let wrapper = build_wrapper(tree, &segments, renderer, config);
        for &part in &run.parts {
            tree.remove(part);
        }
        if let (Some(parent), Some(index)) = (parent, index) {
            tree.insert_child(parent, index, wrapper);
        }
    });
    tracing::debug!(segments = segments.len(), "spliced rendered run");
    true
}

fn build_wrapper(
    tree: &mut Tree,
    segments: &[Segment],
    renderer: &dyn MathRenderer,
    config: &EngineConfig,
) -> NodeId {
    let wrapper = tree.create_element("span");
    if let Some(el) = tree.element_mut(wrapper) {
        el.add_class(&config.processed_class);
    }
    for segment in segments {
        let child = match segment {
            Segment::Literal(text) => tree.create_text(text.clone()),
            Segment::Math { raw, display } => math_node(tree, raw, *display, renderer, config),
        };
        tree.append_child(wrapper, child);
    }
    wrapper
}

/// Render one math segment into a marked container. On renderer failure or
/// empty notation the container holds the original delimited text verbatim;
/// rendering failure never deletes content.
fn math_node(
    tree: &mut Tree,
    raw: &str,
    display: bool,
    renderer: &dyn MathRenderer,
    config: &EngineConfig,
) -> NodeId {
    let rendered = match strip_delimiters(raw) {
        Some(notation) if !notation.trim().is_empty() => renderer.render(notation, display),
        _ => Err(RenderError::new("empty notation")),
    };
    let failed = rendered.is_err();

    let node = tree.create_element("span");
    if let Some(el) = tree.element_mut(node) {
        el.add_class("math");
        el.add_class(if display { "math-display" } else { "math-inline" });
        if failed {
            el.add_class("math-error");
        }
        el.add_class(&config.processed_class);
        el.set_attr(config.display_attr.clone(), display.to_string());
        el.set_attr(config.source_attr.clone(), raw);
    }
    let child = match rendered {
        Ok(markup) => tree.create_fragment(markup),
        Err(err) => {
            tracing::warn!(error = %err, source = raw, "render failed, keeping literal text");
            tree.create_text(raw)
        }
    };
    tree.append_child(node, child);
    node
}

/// Strip the known delimiter pair off a raw math span.
fn strip_delimiters(raw: &str) -> Option<&str> {
    DELIMITERS.iter().find_map(|spec| {
        raw.strip_prefix(spec.start)
            .and_then(|rest| rest.strip_suffix(spec.end))
    })
}

/// Replace every processed container under `root` with a text node holding
/// its original source text. Returns how many containers were restored.
pub(crate) fn recover_originals(tree: &mut Tree, root: NodeId, config: &EngineConfig) -> usize {
    let mut wrappers = Vec::new();
    collect_processed(tree, root, config, &mut wrappers);
    let count = wrappers.len();
    // Paused for the same reason the splice is: the watcher must not
    // immediately re-render what recovery just restored.
    tree.with_journal_paused(|tree| {
        for wrapper in wrappers {
            let mut original = String::new();
            reconstruct_text(tree, wrapper, config, &mut original);
            let parent = tree.parent(wrapper);
            let index = tree.child_index(wrapper);
            tree.remove(wrapper);
            if let (Some(parent), Some(index)) = (parent, index) {
                let text = tree.create_text(original);
                tree.insert_child(parent, index, text);
            }
        }
    });
    count
}

/// Outermost processed containers under `root`, in document order.
fn collect_processed(tree: &Tree, id: NodeId, config: &EngineConfig, out: &mut Vec<NodeId>) {
    if let Some(el) = tree.element(id)
        && el.has_class(&config.processed_class)
    {
        out.push(id);
        return;
    }
    for &child in tree.children(id) {
        collect_processed(tree, child, config, out);
    }
}

fn reconstruct_text(tree: &Tree, id: NodeId, config: &EngineConfig, out: &mut String) {
    if let Some(el) = tree.element(id)
        && let Some(source) = el.attr(&config.source_attr)
    {
        out.push_str(source);
        return;
    }
    match tree.kind(id) {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Fragment(_) => {}
        NodeKind::Element(_) => {
            for &child in tree.children(id) {
                reconstruct_text(tree, child, config, out);
            }
        }
    }
}
