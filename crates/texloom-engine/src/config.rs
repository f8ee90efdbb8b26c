//! Engine configuration.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Tunables for scanning and reconciliation. Hosts typically use
/// [`EngineConfig::default`] and deserialize overrides from their own
/// configuration files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Element names whose subtrees are never scanned (verbatim regions).
    pub skip_tags: Vec<SmolStr>,
    /// Class applied to every container the reconciler produces. Anything
    /// under an element with this class is permanently excluded from scans.
    pub processed_class: SmolStr,
    /// Attribute holding the original delimited source text on rendered
    /// math containers, used by recovery.
    pub source_attr: SmolStr,
    /// Attribute marking block vs inline layout. Presentation only.
    pub display_attr: SmolStr,
    /// Recognize single-dollar inline delimiters. Double-dollar and the
    /// backslash pairs are always on.
    pub single_dollar: bool,
    /// Promote plain bracket/parenthesis groups whose interior looks like
    /// math into escaped delimiters before scanning.
    pub reclassify_brackets: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            skip_tags: ["code", "pre", "script", "style", "textarea"]
                .into_iter()
                .map(SmolStr::new)
                .collect(),
            processed_class: SmolStr::new_static("texloom-processed"),
            source_attr: SmolStr::new_static("data-texloom-source"),
            display_attr: SmolStr::new_static("data-texloom-display"),
            single_dollar: true,
            reclassify_brackets: true,
        }
    }
}

impl EngineConfig {
    pub fn skips_tag(&self, name: &str) -> bool {
        self.skip_tags.iter().any(|t| t == name)
    }
}
