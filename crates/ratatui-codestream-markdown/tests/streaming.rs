use futures::executor::block_on;
use ratatui::text::Line;
use ratatui_codestream_core::text::CodeHighlighter;
use ratatui_codestream_markdown::extract::extract_code_meta_json;
use ratatui_codestream_markdown::view::CodeStreamView;
use ratatui_codestream_markdown::view::CodeStreamViewOptions;
use ratatui_codestream_syntax::HighlighterConfig;
use ratatui_codestream_syntax::HighlighterManager;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn syntect_highlighter() -> Arc<dyn CodeHighlighter> {
    let manager = HighlighterManager::with_config(HighlighterConfig::default());
    block_on(manager.get_highlighter()).expect("highlighter")
}

fn line_to_plain(line: &Line<'_>) -> String {
    line.spans
        .iter()
        .map(|s| s.content.as_ref())
        .collect::<Vec<_>>()
        .join("")
}

fn is_colored(line: &Line<'_>) -> bool {
    line.spans.iter().any(|s| s.style.fg.is_some())
}

/// Feeds `source` in `n`-char pieces, rendering after every piece like a live stream would.
fn stream(view: &mut CodeStreamView, source: &str, n: usize, height: u16) -> Vec<Vec<String>> {
    let chars: Vec<char> = source.chars().collect();
    let mut frames = Vec::new();
    for chunk in chars.chunks(n) {
        view.append(&chunk.iter().collect::<String>());
        frames.push(
            view.lines_for_height(60, height)
                .iter()
                .map(line_to_plain)
                .collect(),
        );
    }
    frames
}

#[test]
fn partial_closing_fence_never_reaches_the_screen() {
    init_tracing();
    let mut view = CodeStreamView::new();
    view.set_highlighter(Some(syntect_highlighter()));

    let frames = stream(&mut view, "```js\nconsole.log(1)\n```\n\nafter\n", 3, 20);
    for frame in &frames {
        assert!(
            frame.iter().all(|l| !l.starts_with('`')),
            "fence leaked into frame: {frame:?}"
        );
    }
    let last = frames.last().expect("frames");
    assert_eq!(last, &vec!["console.log(1)", "", "after"]);
}

#[test]
fn visible_block_is_highlighted_by_the_real_engine() {
    init_tracing();
    let mut view = CodeStreamView::new();
    view.set_highlighter(Some(syntect_highlighter()));
    view.set_markdown("```rust\nfn main() {\n    let x = 1;\n}\n```\n");

    let lines = view.lines_for_height(60, 10);
    assert_eq!(lines.len(), 3);
    assert_eq!(line_to_plain(&lines[0]), "fn main() {");
    assert!(is_colored(&lines[0]));
}

#[test]
fn distant_block_stays_plain_until_scrolled_into_margin() {
    init_tracing();
    let mut view = CodeStreamView::with_options(CodeStreamViewOptions {
        show_scrollbar: false,
        ..CodeStreamViewOptions::default()
    });
    view.set_highlighter(Some(syntect_highlighter()));

    let prose: Vec<String> = (0..40).map(|i| format!("paragraph line {i}")).collect();
    view.set_markdown(&format!(
        "{}\n\n```python\nprint('far away')\n```\n",
        prose.join("\n")
    ));

    let lines = view.lines_for_height(60, 8);
    assert_eq!(line_to_plain(&lines[41]), "print('far away')");
    assert!(!is_colored(&lines[41]));

    // Within the 5-row margin but still below the screen.
    view.scroll_y_by(29);
    let lines = view.lines_for_height(60, 8);
    assert!(is_colored(&lines[41]));
}

#[test]
fn markdown_blocks_wait_for_their_closing_fence() {
    init_tracing();
    let mut view = CodeStreamView::new();
    view.set_highlighter(Some(syntect_highlighter()));

    view.append("````markdown\n# Title\n\n```js\nlet a = 1;\n");
    assert!(view.lines_for_height(60, 10).is_empty());

    view.append("```\n````\n");
    let lines: Vec<String> = view
        .lines_for_height(60, 10)
        .iter()
        .map(line_to_plain)
        .collect();
    assert_eq!(lines, vec!["# Title", "", "```js", "let a = 1;", "```"]);
}

#[test]
fn json_snapshot_with_unloaded_language_falls_back() {
    let engine = syntect_highlighter();
    let json = r#"{
        "type": "element",
        "tagName": "pre",
        "children": [{
            "type": "element",
            "tagName": "code",
            "properties": {"className": "hljs language-swift"},
            "children": [{"type": "text", "value": "let a = 1\n``"}]
        }]
    }"#;
    let meta = extract_code_meta_json(json, engine.loaded_languages());
    assert_eq!(meta.language, "swift");
    assert_eq!(meta.highlight_lang, "ts");
    assert_eq!(meta.code, "let a = 1");
}
