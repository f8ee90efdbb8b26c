//! End-to-end engine behavior against a fake renderer.

use std::sync::Arc;
use std::time::Duration;

use texloom_engine::{
    Engine, EngineConfig, IdleDeadline, MathRenderer, NodeId, PumpStatus, RenderError,
};

struct FakeRenderer {
    fail: bool,
}

impl MathRenderer for FakeRenderer {
    fn render(&self, notation: &str, display: bool) -> Result<String, RenderError> {
        if self.fail {
            return Err(RenderError::new("forced failure"));
        }
        Ok(format!("<math data-display=\"{display}\">{notation}</math>"))
    }
}

fn test_engine() -> Engine {
    Engine::new(EngineConfig::default(), Arc::new(FakeRenderer { fail: false }))
}

fn failing_engine() -> Engine {
    Engine::new(EngineConfig::default(), Arc::new(FakeRenderer { fail: true }))
}

/// Append a `<p>` holding one text node per fragment.
fn paragraph(engine: &mut Engine, fragments: &[&str]) -> NodeId {
    let tree = engine.tree_mut();
    let p = tree.create_element("p");
    let root = tree.root();
    tree.append_child(root, p);
    for fragment in fragments {
        let text = tree.create_text(*fragment);
        tree.append_child(p, text);
    }
    p
}

fn process_fully(engine: &mut Engine) -> usize {
    engine.process_document();
    engine.process_to_completion()
}

#[test]
fn renders_inline_math_between_text() {
    let mut engine = test_engine();
    paragraph(&mut engine, &["Compute $x^2$ please."]);
    let reconciled = process_fully(&mut engine);
    assert_eq!(reconciled, 1);
    insta::assert_snapshot!(
        engine.tree().to_html(),
        @r#"<body><p><span class="texloom-processed">Compute <span class="math math-inline texloom-processed" data-texloom-display="false" data-texloom-source="$x^2$"><math data-display="false">x^2</math></span> please.</span></p></body>"#
    );
}

#[test]
fn prose_brackets_and_no_delimiters_are_a_noop() {
    let mut engine = test_engine();
    paragraph(&mut engine, &["Value (not math) is fine"]);
    let before = engine.tree().to_html();
    let reconciled = process_fully(&mut engine);
    assert_eq!(reconciled, 0);
    assert_eq!(engine.tree().to_html(), before);
}

#[test]
fn render_failure_keeps_the_delimited_source() {
    let mut engine = failing_engine();
    let source = r"\[\int_0^1 x\,dx\]";
    paragraph(&mut engine, &[source]);
    process_fully(&mut engine);
    let html = engine.tree().to_html();
    // Once as the recovery attribute, once as the visible text.
    assert!(html.matches(source).count() >= 2, "lost content: {html}");
    assert!(html.contains("math-error"));
    assert!(!html.contains("<math "), "failed render must not emit markup");
}

#[test]
fn run_straddling_fragments_renders_both_spans() {
    let mut engine = test_engine();
    paragraph(&mut engine, &["$$ \\frac{a}{b} $$ and ", "later $c$"]);
    let reconciled = process_fully(&mut engine);
    assert_eq!(reconciled, 1, "one merged run");
    let html = engine.tree().to_html();
    assert!(html.contains(r#"data-texloom-display="true""#));
    assert!(html.contains(r#"data-texloom-display="false""#));
    assert!(html.contains(" and later "));
    assert!(html.contains(r#"data-texloom-source="$$ \frac{a}{b} $$""#));
    assert!(html.contains(r#"data-texloom-source="$c$""#));
}

#[test]
fn second_pass_is_a_complete_noop() {
    let mut engine = test_engine();
    paragraph(&mut engine, &["first $a^2$"]);
    paragraph(&mut engine, &["second $b_1$"]);
    assert_eq!(process_fully(&mut engine), 2);
    let after_first = engine.tree().to_html();
    let wrappers = after_first.matches("texloom-processed").count();

    assert_eq!(process_fully(&mut engine), 0);
    assert_eq!(engine.tree().to_html(), after_first);
    assert_eq!(
        engine.tree().to_html().matches("texloom-processed").count(),
        wrappers
    );
}

#[test]
fn code_regions_are_never_touched() {
    let mut engine = test_engine();
    {
        let tree = engine.tree_mut();
        let root = tree.root();
        let pre = tree.create_element("pre");
        let code = tree.create_element("code");
        let text = tree.create_text("let y = $x^2$;");
        tree.append_child(root, pre);
        tree.append_child(pre, code);
        tree.append_child(code, text);
    }
    let before = engine.tree().to_html();
    assert_eq!(process_fully(&mut engine), 0);
    assert_eq!(engine.tree().to_html(), before);
}

#[test]
fn escaped_delimiters_stay_literal() {
    let mut engine = test_engine();
    paragraph(&mut engine, &[r"Costs \$5 and \$10 total"]);
    let before = engine.tree().to_html();
    assert_eq!(process_fully(&mut engine), 0);
    assert_eq!(engine.tree().to_html(), before);
}

#[test]
fn bracket_groups_with_math_interiors_get_promoted() {
    let mut engine = test_engine();
    paragraph(&mut engine, &["solve [x^2 + 1] now"]);
    assert_eq!(process_fully(&mut engine), 1);
    let html = engine.tree().to_html();
    assert!(html.contains(r#"data-texloom-source="\[x^2 + 1\]""#));
    assert!(html.contains(r#"data-texloom-display="true""#));
}

#[test]
fn mutations_after_the_first_pass_are_picked_up_incrementally() {
    let mut engine = test_engine();
    paragraph(&mut engine, &["start $a^2$"]);
    process_fully(&mut engine);
    let first_pass = engine.tree().to_html();

    paragraph(&mut engine, &["added $b^3$"]);
    // No process_document: the journal alone drives the second pass.
    let reconciled = engine.process_to_completion();
    assert_eq!(reconciled, 1);
    let html = engine.tree().to_html();
    assert!(html.contains(r#"data-texloom-source="$b^3$""#));
    // The first pass output is still there, byte for byte.
    assert!(html.contains(first_pass.trim_start_matches("<body>").trim_end_matches("</body>")));

    assert_eq!(engine.process_to_completion(), 0);
}

struct Expired;

impl IdleDeadline for Expired {
    fn time_remaining(&self) -> Duration {
        Duration::ZERO
    }
}

#[test]
fn exhausted_deadlines_yield_and_resume() {
    let mut engine = test_engine();
    for i in 0..8 {
        let content = format!("item {i} is $x_{i}$");
        paragraph(&mut engine, &[&content]);
    }
    engine.process_document();

    let mut slices = 0;
    let mut reconciled = 0;
    loop {
        match engine.pump(&Expired) {
            PumpStatus::Yielded { reconciled: n } => {
                reconciled += n;
                slices += 1;
                assert!(slices < 100, "pump must make progress every slice");
            }
            PumpStatus::Done { reconciled: n } => {
                reconciled += n;
                break;
            }
        }
    }
    assert!(slices > 0, "zero budget must yield at least once");
    assert_eq!(reconciled, 8);
}

#[test]
fn recovery_restores_the_original_text() {
    let mut engine = test_engine();
    paragraph(&mut engine, &["$$ \\frac{a}{b} $$ and ", "later $c$"]);
    process_fully(&mut engine);

    let root = engine.tree().root();
    let restored = engine.recover_originals(root);
    assert_eq!(restored, 1);
    assert_eq!(
        engine.tree().to_html(),
        "<body><p>$$ \\frac{a}{b} $$ and later $c$</p></body>"
    );
    // Recovery itself schedules nothing.
    assert_eq!(engine.process_to_completion(), 0);
}

#[test]
fn renderer_state_is_queryable() {
    let engine = test_engine();
    assert!(engine.renderer_loaded());
}
