//! LaTeX math rendering via pulldown-latex → MathML.
//!
//! Implements the engine's [`MathRenderer`] seam and owns the process-wide
//! renderer handle: loaded lazily once, cached, and queried by hosts before
//! they start reconciliation. Load failure surfaces as
//! [`EngineError::RendererUnavailable`] and leaves the engine inert.

use std::sync::{Arc, OnceLock};

use pulldown_latex::{
    Parser, Storage,
    config::{DisplayMode, RenderConfig},
    mathml::push_mathml,
};
use texloom_engine::{Engine, EngineConfig, EngineError, MathRenderer, RenderError};

/// MathML rendering backend.
#[derive(Debug, Default)]
pub struct MathMlRenderer {
    _private: (),
}

impl MathMlRenderer {
    /// Load the backend, probing it once so a broken install surfaces at
    /// initialization instead of mid-document.
    pub fn load() -> Result<Self, EngineError> {
        let renderer = Self { _private: () };
        renderer.render_mathml("x", false)?;
        Ok(renderer)
    }

    fn render_mathml(&self, notation: &str, display: bool) -> Result<String, RenderError> {
        let storage = Storage::new();
        let parser = Parser::new(notation, &storage);

        // Collect first: parse errors must fail the whole fragment, and
        // push_mathml wants the events themselves.
        let events: Vec<_> = parser.collect();
        let errors: Vec<String> = events
            .iter()
            .filter_map(|event| event.as_ref().err().map(|err| err.to_string()))
            .collect();
        if !errors.is_empty() {
            return Err(RenderError::new(errors.join("; ")));
        }

        let config = RenderConfig {
            display_mode: if display {
                DisplayMode::Block
            } else {
                DisplayMode::Inline
            },
            ..Default::default()
        };
        let mut mathml = String::new();
        push_mathml(&mut mathml, events.into_iter(), config)
            .map_err(|err| RenderError::new(err.to_string()))?;
        Ok(mathml)
    }
}

impl MathRenderer for MathMlRenderer {
    fn render(&self, notation: &str, display: bool) -> Result<String, RenderError> {
        self.render_mathml(notation, display)
    }
}

static GLOBAL: OnceLock<Arc<MathMlRenderer>> = OnceLock::new();

/// The shared renderer, loading it on first use. Every later call returns
/// the cached handle.
pub fn init() -> Result<Arc<MathMlRenderer>, EngineError> {
    if let Some(renderer) = GLOBAL.get() {
        return Ok(renderer.clone());
    }
    let renderer = Arc::new(MathMlRenderer::load()?);
    tracing::debug!("math renderer loaded");
    Ok(GLOBAL.get_or_init(|| renderer).clone())
}

/// Whether the shared renderer has been loaded.
pub fn is_loaded() -> bool {
    GLOBAL.get().is_some()
}

/// Build an [`Engine`] wired to the shared renderer, loading it if needed.
pub fn engine(config: EngineConfig) -> Result<Engine, EngineError> {
    let renderer = init()?;
    Ok(Engine::new(config, renderer as Arc<dyn MathRenderer>))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_inline_math() {
        let renderer = MathMlRenderer::load().unwrap();
        let mathml = renderer.render("x^2", false).unwrap();
        assert!(mathml.contains("<math"));
        assert!(mathml.contains("</math>"));
    }

    #[test]
    fn renders_display_math() {
        let renderer = MathMlRenderer::load().unwrap();
        let mathml = renderer.render(r"\frac{a}{b}", true).unwrap();
        assert!(mathml.contains("<math"));
        assert!(mathml.contains("<mfrac"));
    }

    #[test]
    fn invalid_latex_fails_without_output() {
        let renderer = MathMlRenderer::load().unwrap();
        // Unclosed brace
        let err = renderer.render(r"\frac{a", false).unwrap_err();
        assert!(!err.message.is_empty());
    }

    #[test]
    fn global_handle_initializes_once() {
        let first = init().unwrap();
        assert!(is_loaded());
        let second = init().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let engine = engine(EngineConfig::default()).unwrap();
        assert!(engine.renderer_loaded());
    }
}
