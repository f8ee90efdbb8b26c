//! Bracket reclassification.
//!
//! A pre-pass over run text that promotes plain `[...]` / `(...)` groups into
//! escaped math delimiters when their interior looks like math. Spans that
//! are already validly delimited are swapped for opaque placeholders first so
//! promotion can never reinterpret or mangle them, then restored verbatim.

use crate::classify::Classifier;
use crate::scan::{self, DELIMITERS};

/// Placeholder alphabet: `U+E000 <index> U+E000`. Private-use, so it never
/// occurs in real documents; if it somehow does, we back off entirely rather
/// than risk a corrupted restore.
const SENTINEL: char = '\u{E000}';

pub fn reclassify(text: &str, classifier: &dyn Classifier) -> String {
    if !text.contains(['[', '(']) {
        return text.to_string();
    }
    if text.contains(SENTINEL) {
        return text.to_string();
    }
    let (protected, spans) = protect_existing_spans(text);
    let promoted = promote_brackets(&protected, classifier);
    restore_placeholders(&promoted, &spans)
}

/// Replace every valid delimited span with `U+E000 index U+E000`, recording
/// the original text by index.
fn protect_existing_spans(text: &str) -> (String, Vec<String>) {
    let mut out = String::with_capacity(text.len());
    let mut spans = Vec::new();
    let mut cursor = 0;
    while cursor < text.len() {
        let candidate = DELIMITERS
            .iter()
            .find(|spec| text[cursor..].starts_with(spec.start) && !scan::is_escaped(text, cursor));
        if let Some(spec) = candidate
            && let Some(end) = scan::find_end(text, spec, cursor + spec.start.len())
        {
            out.push(SENTINEL);
            out.push_str(&spans.len().to_string());
            out.push(SENTINEL);
            spans.push(text[cursor..end].to_string());
            cursor = end;
            continue;
        }
        let Some(ch) = text[cursor..].chars().next() else {
            break;
        };
        out.push(ch);
        cursor += ch.len_utf8();
    }
    (out, spans)
}

/// First balanced close for the opening bracket at `open_idx`, honoring
/// escapes and nesting of the same bracket kind.
fn find_balanced(text: &str, open_idx: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in text[open_idx..].char_indices() {
        let pos = open_idx + i;
        if ch == open && !scan::is_escaped(text, pos) {
            depth += 1;
        } else if ch == close && !scan::is_escaped(text, pos) {
            depth -= 1;
            if depth == 0 {
                return Some(pos);
            }
        }
    }
    None
}

fn promote_brackets(text: &str, classifier: &dyn Classifier) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while cursor < text.len() {
        let Some(ch) = text[cursor..].chars().next() else {
            break;
        };
        let pair = match ch {
            '[' => Some((']', r"\[", r"\]")),
            '(' => Some((')', r"\(", r"\)")),
            _ => None,
        };
        if let Some((close, start_tok, end_tok)) = pair
            && !scan::is_escaped(text, cursor)
            && let Some(end) = find_balanced(text, cursor, ch, close)
        {
            let interior = &text[cursor + 1..end];
            if classifier.looks_like_math(interior) {
                out.push_str(start_tok);
                out.push_str(interior);
                out.push_str(end_tok);
                cursor = end + 1;
                continue;
            }
        }
        // No balanced close, or ambiguous interior: ordinary punctuation.
        out.push(ch);
        cursor += ch.len_utf8();
    }
    out
}

fn restore_placeholders(text: &str, spans: &[String]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut restored = 0usize;
    for (i, part) in text.split(SENTINEL).enumerate() {
        if i % 2 == 0 {
            out.push_str(part);
        } else {
            match part.parse::<usize>().ok().and_then(|idx| spans.get(idx)) {
                Some(span) => {
                    out.push_str(span);
                    restored += 1;
                }
                // Unreachable given the collision check.
                None => {
                    out.push(SENTINEL);
                    out.push_str(part);
                    out.push(SENTINEL);
                }
            }
        }
    }
    debug_assert_eq!(restored, spans.len(), "every placeholder restores exactly once");
    out
}
