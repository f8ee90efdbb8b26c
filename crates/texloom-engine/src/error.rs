//! Error types for the engine.

use miette::Diagnostic;

/// Errors surfaced to the host. Per-segment render failures are not listed
/// here: those are recovered locally by falling back to the original
/// delimited text and never abort a reconciliation pass.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum EngineError {
    /// The math rendering backend failed to load. The engine stays inert;
    /// no scanning is attempted until initialization succeeds.
    #[error("math renderer failed to load: {reason}")]
    #[diagnostic(code(texloom::renderer_unavailable))]
    RendererUnavailable { reason: String },
}

/// Failure to render one notation string.
///
/// Carried per segment: the reconciler catches it, emits the original
/// delimited text verbatim instead, and keeps going with sibling segments.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("render failed: {message}")]
pub struct RenderError {
    pub message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<RenderError> for EngineError {
    fn from(err: RenderError) -> Self {
        EngineError::RendererUnavailable {
            reason: err.message,
        }
    }
}
