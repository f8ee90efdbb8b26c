//! Delimiter scanning: splits a text run into literal and math segments.
//!
//! One left-to-right pass with a cursor. Segments are exhaustive and
//! contiguous: concatenating their source text reproduces the input exactly,
//! so a scan is a lossless partition of the run.

use crate::classify::Classifier;

/// One delimiter grammar: start token, end token, block vs inline layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterSpec {
    pub start: &'static str,
    pub end: &'static str,
    pub display: bool,
}

/// The four delimiter grammars, in matching precedence order. `$$` must come
/// before `$` since the latter is a prefix of the former.
pub const DELIMITERS: [DelimiterSpec; 4] = [
    DelimiterSpec {
        start: "$$",
        end: "$$",
        display: true,
    },
    DelimiterSpec {
        start: "$",
        end: "$",
        display: false,
    },
    DelimiterSpec {
        start: r"\[",
        end: r"\]",
        display: true,
    },
    DelimiterSpec {
        start: r"\(",
        end: r"\)",
        display: false,
    },
];

const DELIMITERS_NO_SINGLE_DOLLAR: [DelimiterSpec; 3] =
    [DELIMITERS[0], DELIMITERS[2], DELIMITERS[3]];

/// The delimiter set for a given configuration.
pub fn active_delimiters(single_dollar: bool) -> &'static [DelimiterSpec] {
    if single_dollar {
        &DELIMITERS
    } else {
        &DELIMITERS_NO_SINGLE_DOLLAR
    }
}

/// A unit of scanned output, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Plain text, copied verbatim into output.
    Literal(String),
    /// A math span. `raw` includes its delimiters.
    Math { raw: String, display: bool },
}

impl Segment {
    /// The exact source text this segment covers.
    pub fn source_text(&self) -> &str {
        match self {
            Segment::Literal(text) => text,
            Segment::Math { raw, .. } => raw,
        }
    }
}

/// Fast precondition check: can `text` contain any delimiter at all?
/// Callers skip scanning (and run assembly churn) entirely when this is
/// false.
pub fn contains_delimiter(text: &str, delims: &[DelimiterSpec]) -> bool {
    delims.iter().any(|spec| text.contains(spec.start))
}

/// True if the character at `idx` sits behind an odd run of backslashes.
pub(crate) fn is_escaped(text: &str, idx: usize) -> bool {
    text[..idx].bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

fn char_len(text: &str, pos: usize) -> usize {
    text[pos..].chars().next().map_or(1, char::len_utf8)
}

fn find_token(text: &str, token: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    while pos < text.len() {
        if text[pos..].starts_with(token) && !is_escaped(text, pos) {
            return Some(pos);
        }
        pos += char_len(text, pos);
    }
    None
}

fn find_single_dollar_end(text: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    while pos < text.len() {
        if text.as_bytes()[pos] == b'$' && !is_escaped(text, pos) {
            if text[pos..].starts_with("$$") {
                // Half of a double-dollar token never closes an inline span.
                pos += 2;
                continue;
            }
            return Some(pos + 1);
        }
        pos += char_len(text, pos);
    }
    None
}

/// Find the end of a span opened by `spec`, searching from `from` (the first
/// position after the start token). Returns the position one past the end
/// token.
pub(crate) fn find_end(text: &str, spec: &DelimiterSpec, from: usize) -> Option<usize> {
    if spec.start == spec.end {
        return if spec.start == "$" {
            find_single_dollar_end(text, from)
        } else {
            find_token(text, spec.end, from).map(|pos| pos + spec.end.len())
        };
    }
    // Distinct tokens nest: a further start token deepens the span, the end
    // token that brings the depth back to zero closes it. Escaped tokens
    // count for neither side.
    let mut depth = 1usize;
    let mut pos = from;
    while pos < text.len() {
        if text[pos..].starts_with(spec.start) && !is_escaped(text, pos) {
            depth += 1;
            pos += spec.start.len();
        } else if text[pos..].starts_with(spec.end) && !is_escaped(text, pos) {
            depth -= 1;
            pos += spec.end.len();
            if depth == 0 {
                return Some(pos);
            }
        } else {
            pos += char_len(text, pos);
        }
    }
    None
}

/// Segment `text` against `delims`.
///
/// A start token with no matching end is ordinary text: the cursor advances
/// one character and the scan continues. A matched pairing still has to get
/// past the classifier with its delimiters on; stray dollar signs in prose
/// pair up too, and those stay in the literal run.
pub fn scan(text: &str, delims: &[DelimiterSpec], classifier: &dyn Classifier) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;
    while cursor < text.len() {
        let candidate = delims
            .iter()
            .find(|spec| text[cursor..].starts_with(spec.start) && !is_escaped(text, cursor));
        let Some(spec) = candidate else {
            cursor += char_len(text, cursor);
            continue;
        };
        match find_end(text, spec, cursor + spec.start.len()) {
            Some(end) => {
                let raw = &text[cursor..end];
                if classifier.looks_like_math(raw) {
                    if literal_start < cursor {
                        segments.push(Segment::Literal(text[literal_start..cursor].to_string()));
                    }
                    segments.push(Segment::Math {
                        raw: raw.to_string(),
                        display: spec.display,
                    });
                    literal_start = end;
                }
                // Rejected pairings fold into the surrounding literal run.
                cursor = end;
            }
            None => cursor += char_len(text, cursor),
        }
    }
    if literal_start < text.len() {
        segments.push(Segment::Literal(text[literal_start..].to_string()));
    }
    segments
}
