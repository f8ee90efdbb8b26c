//! Heuristic detection of math-looking content.
//!
//! The classifier gates two decisions: whether a plain bracket group gets
//! promoted to a math delimiter pair, and whether a matched delimiter span is
//! actually worth rendering (stray dollar signs in prose pair up too). It is
//! a pure predicate; false answers in either direction are tolerable as long
//! as they are deterministic, and ambiguity resolves toward plain text.

use std::sync::LazyLock;

use regex::Regex;

/// Replaceable classification strategy. The default battery lives in
/// [`PatternClassifier`]; hosts with unusual corpora can swap in their own
/// without touching scanning or reconciliation.
pub trait Classifier {
    fn looks_like_math(&self, content: &str) -> bool;
}

static COMMAND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\[a-zA-Z]+").unwrap());

static BRACE_GROUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^{}]*\}").unwrap());

static SYMBOL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)\b(
            alpha|beta|gamma|delta|epsilon|zeta|eta|theta|iota|kappa|lambda
            |mu|nu|xi|pi|rho|sigma|tau|upsilon|phi|chi|psi|omega
            |infty|frac|sqrt|sum|prod|int|cdot|times|pm|leq|geq|neq|approx
            |partial|nabla
        )\b",
    )
    .unwrap()
});

static SYMBOL_GLYPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[α-ωΑ-Ω∞∑∏∫√±×÷≤≥≠≈⋅∂∇]").unwrap());

// Boundary-strict on purpose: the span must hug non-space content on both
// sides, so `$5 and $` from prose never counts as evidence while `$c$` does.
static DOLLAR_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[^$\s](?:[^$\n]*[^$\s])?\$").unwrap());

// Backslash-delimited spans are explicit markup; nobody types `\(` and `\)`
// around prose by accident.
static MARKED_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\[.+\\\]|\\\(.+\\\)").unwrap());

/// The default pattern battery: backslash commands, brace groups,
/// sub/superscript markers, Greek letters and common symbols by name or
/// glyph, and nested dollar-delimited spans.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternClassifier;

impl Classifier for PatternClassifier {
    fn looks_like_math(&self, content: &str) -> bool {
        if content.trim().is_empty() {
            return false;
        }
        content.contains(['_', '^'])
            || COMMAND.is_match(content)
            || BRACE_GROUP.is_match(content)
            || SYMBOL_NAME.is_match(content)
            || SYMBOL_GLYPH.is_match(content)
            || DOLLAR_SPAN.is_match(content)
            || MARKED_SPAN.is_match(content)
    }
}
