//! The external renderer seam.
//!
//! The engine treats rendering as a synchronous, fallible collaborator and
//! never parses the notation itself: whatever sits between matched
//! delimiters is handed over as an opaque string.

use crate::error::RenderError;

pub trait MathRenderer {
    /// Render `notation` (delimiters already stripped) to a markup fragment.
    /// A failure is recovered per-segment by the reconciler; no retry.
    fn render(&self, notation: &str, display: bool) -> Result<String, RenderError>;

    /// Whether the backend is ready. Backends that load lazily report their
    /// cached state here.
    fn is_loaded(&self) -> bool {
        true
    }
}
