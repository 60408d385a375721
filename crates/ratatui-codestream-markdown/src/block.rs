use ratatui::text::Text;
use ratatui_codestream_core::code_render::CodeRenderStyles;
use ratatui_codestream_core::code_render::render_highlighted_code;
use ratatui_codestream_core::code_render::render_plain_code;
use ratatui_codestream_core::text::CodeHighlighter;
use ratatui_codestream_core::theme::CodeTheme;
use ratatui_codestream_core::theme::Theme;
use ratatui_codestream_core::viewport::RowSpan;
use ratatui_codestream_core::visibility::ObserverOptions;
use ratatui_codestream_core::visibility::VisibilityEnvironment;
use ratatui_codestream_core::visibility::VisibilityGate;
use tracing::warn;

use crate::extract::extract_code_meta;
use crate::node::SerializedCodeNode;

/// Host override that decorates a rendered block (frames, headers, copy buttons, ...).
///
/// Receives the plain or highlighted output and the declared language.
pub trait CodeBlockWrapper {
    fn wrap(&self, output: Text<'static>, language: &str) -> Text<'static>;
}

impl<F> CodeBlockWrapper for F
where
    F: Fn(Text<'static>, &str) -> Text<'static>,
{
    fn wrap(&self, output: Text<'static>, language: &str) -> Text<'static> {
        self(output, language)
    }
}

pub struct RenderContext<'a> {
    /// `None` until the highlighter is ready; blocks render nothing until then.
    pub highlighter: Option<&'a dyn CodeHighlighter>,
    pub code_theme: CodeTheme,
    pub theme: &'a Theme,
    pub wrapper: Option<&'a dyn CodeBlockWrapper>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockPhase {
    NotVisible,
    Visible,
}

/// Render dispatcher for one code block instance.
///
/// Keep one instance per block across render passes; the visibility it has seen lives here.
pub struct StreamCodeBlock {
    gate: VisibilityGate,
}

impl StreamCodeBlock {
    pub fn new(env: &dyn VisibilityEnvironment, options: ObserverOptions) -> Self {
        Self {
            gate: VisibilityGate::arm(env, options),
        }
    }

    pub fn phase(&self) -> BlockPhase {
        if self.gate.is_visible() {
            BlockPhase::Visible
        } else {
            BlockPhase::NotVisible
        }
    }

    /// Drains visibility notifications. Returns `true` on the pass the block becomes visible.
    pub fn sync_visibility(&mut self) -> bool {
        self.gate.poll()
    }

    /// Tells the block which rows its output landed on. Ignored once visible.
    pub fn place(&mut self, rows: RowSpan) {
        self.gate.attach(rows);
    }

    /// Stops observing the last placed rows. Call when a pass renders nothing for this block.
    pub fn detach(&mut self) {
        self.gate.detach();
    }

    /// Renders the current snapshot.
    ///
    /// Returns `None` while the highlighter is not ready or the code is not safe to show yet.
    pub fn render(
        &mut self,
        node: &SerializedCodeNode,
        ctx: &RenderContext<'_>,
    ) -> Option<Text<'static>> {
        let highlighter = ctx.highlighter?;
        let meta = extract_code_meta(node, highlighter.loaded_languages());
        if meta.code.is_empty() {
            return None;
        }

        let plain_styles = CodeRenderStyles {
            base: ctx.theme.code_plain,
            background: None,
        };
        let output = match self.phase() {
            BlockPhase::NotVisible => render_plain_code(&meta.code, plain_styles).into_text(),
            BlockPhase::Visible => {
                match highlighter.highlight(&meta.code, &meta.highlight_lang, ctx.code_theme) {
                    Ok(lines) => {
                        let styles = CodeRenderStyles {
                            base: ctx.theme.code_plain,
                            background: highlighter
                                .background_color(ctx.code_theme)
                                .or(ctx.theme.code_background),
                        };
                        render_highlighted_code(&lines, styles).into_text()
                    }
                    Err(e) => {
                        warn!(language = %meta.highlight_lang, "highlighting failed: {e}");
                        render_plain_code(&meta.code, plain_styles).into_text()
                    }
                }
            }
        };

        Some(match ctx.wrapper {
            Some(wrapper) => wrapper.wrap(output, &meta.language),
            None => output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;
    use ratatui::style::Style;
    use ratatui::text::Line;
    use ratatui::text::Span;
    use ratatui_codestream_core::HighlightError;
    use ratatui_codestream_core::text::HighlightedLines;
    use ratatui_codestream_core::text::LanguageSet;
    use ratatui_codestream_core::text::NoHighlight;
    use ratatui_codestream_core::viewport::ViewportState;
    use ratatui_codestream_core::visibility::NoVisibilityTracking;
    use ratatui_codestream_core::visibility::ViewportIntersector;
    use std::sync::Arc;
    use std::sync::Mutex;

    /// Records every `(code, language)` request and paints spans red.
    struct RecordingHighlighter {
        languages: LanguageSet,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl RecordingHighlighter {
        fn new() -> Self {
            Self {
                languages: ["ts", "go"].into_iter().map(String::from).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().expect("calls").clone()
        }
    }

    impl CodeHighlighter for RecordingHighlighter {
        fn loaded_languages(&self) -> &LanguageSet {
            &self.languages
        }

        fn highlight(
            &self,
            code: &str,
            language: &str,
            _theme: CodeTheme,
        ) -> Result<HighlightedLines, HighlightError> {
            self.calls
                .lock()
                .expect("calls")
                .push((code.to_string(), language.to_string()));
            Ok(Arc::new(
                code.split('\n')
                    .map(|l| vec![Span::styled(l.to_string(), Style::default().fg(Color::Red))])
                    .collect(),
            ))
        }
    }

    fn plain(text: &Text<'static>) -> Vec<String> {
        text.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn renders_nothing_until_highlighter_is_ready() {
        let theme = Theme::default();
        let mut block = StreamCodeBlock::new(&NoVisibilityTracking, ObserverOptions::default());
        let node = SerializedCodeNode::pre_code(Some("go"), "package main\n");
        let ctx = RenderContext {
            highlighter: None,
            code_theme: CodeTheme::Dark,
            theme: &theme,
            wrapper: None,
        };
        assert!(block.render(&node, &ctx).is_none());
    }

    #[test]
    fn plain_text_while_not_visible_then_highlighted() {
        let theme = Theme::default();
        let env = ViewportIntersector::new();
        let hi = RecordingHighlighter::new();
        let mut block = StreamCodeBlock::new(&env, ObserverOptions::default());
        let node = SerializedCodeNode::pre_code(Some("swift"), "let a = 1\n``");
        let ctx = RenderContext {
            highlighter: Some(&hi),
            code_theme: CodeTheme::Dark,
            theme: &theme,
            wrapper: None,
        };

        let out = block.render(&node, &ctx).expect("plain output");
        assert_eq!(plain(&out), vec!["let a = 1".to_string()]);
        assert!(out.lines[0].spans[0].style.fg.is_none());
        assert!(hi.calls().is_empty());
        assert_eq!(block.phase(), BlockPhase::NotVisible);

        block.place(RowSpan::new(0, 1));
        let mut viewport = ViewportState::default();
        viewport.set_viewport(80, 10);
        env.notify(&viewport);
        assert!(block.sync_visibility());

        let out = block.render(&node, &ctx).expect("highlighted output");
        assert_eq!(out.lines[0].spans[0].style.fg, Some(Color::Red));
        assert_eq!(
            hi.calls(),
            vec![("let a = 1".to_string(), "ts".to_string())]
        );
    }

    #[test]
    fn unsafe_code_renders_no_empty_shell() {
        let theme = Theme::default();
        let hi = NoHighlight::new();
        let mut block = StreamCodeBlock::new(&NoVisibilityTracking, ObserverOptions::default());
        let node = SerializedCodeNode::pre_code(Some("markdown"), "```js\nlet a;");
        let ctx = RenderContext {
            highlighter: Some(&hi),
            code_theme: CodeTheme::Dark,
            theme: &theme,
            wrapper: None,
        };
        assert!(block.render(&node, &ctx).is_none());
    }

    #[test]
    fn wrapper_receives_declared_language() {
        let theme = Theme::default();
        let hi = NoHighlight::new();
        let mut block = StreamCodeBlock::new(&NoVisibilityTracking, ObserverOptions::default());
        let node = SerializedCodeNode::pre_code(Some("swift"), "let a = 1");
        let wrapper = |mut output: Text<'static>, language: &str| {
            output.lines.insert(0, Line::from(format!("[{language}]")));
            output
        };
        let ctx = RenderContext {
            highlighter: Some(&hi),
            code_theme: CodeTheme::Light,
            theme: &theme,
            wrapper: Some(&wrapper),
        };
        let out = block.render(&node, &ctx).expect("output");
        assert_eq!(
            plain(&out),
            vec!["[swift]".to_string(), "let a = 1".to_string()]
        );
    }
}
