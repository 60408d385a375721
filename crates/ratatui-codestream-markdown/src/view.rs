use std::sync::Arc;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui_codestream_core::render;
use ratatui_codestream_core::text::CodeHighlighter;
use ratatui_codestream_core::theme::CodeTheme;
use ratatui_codestream_core::theme::Theme;
use ratatui_codestream_core::viewport::RowSpan;
use ratatui_codestream_core::viewport::ViewportState;
use ratatui_codestream_core::visibility::ObserverOptions;
use ratatui_codestream_core::visibility::ViewportIntersector;
use serde::Deserialize;
use tracing::trace;
use unicode_width::UnicodeWidthStr;

use crate::block::CodeBlockWrapper;
use crate::block::RenderContext;
use crate::block::StreamCodeBlock;
use crate::document::DocumentBlock;
use crate::document::split_markdown;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CodeStreamViewOptions {
    pub code_theme: CodeTheme,
    pub observer: ObserverOptions,
    /// Blank rows between blocks.
    pub block_gap: u16,
    pub show_scrollbar: bool,
    /// Keep the viewport pinned to the bottom while content streams in.
    pub follow_tail: bool,
}

impl Default for CodeStreamViewOptions {
    fn default() -> Self {
        Self {
            code_theme: CodeTheme::Dark,
            observer: ObserverOptions::default(),
            block_gap: 1,
            show_scrollbar: true,
            follow_tail: false,
        }
    }
}

/// A scrollable view over streamed Markdown whose code blocks highlight lazily.
///
/// Prose is shown as raw text. Each code block gets a [`StreamCodeBlock`] that persists across
/// appends, so a block that has been seen stays highlighted as it keeps growing.
pub struct CodeStreamView {
    options: CodeStreamViewOptions,
    theme: Theme,
    source: String,
    blocks: Vec<DocumentBlock>,
    code_blocks: Vec<StreamCodeBlock>,
    intersector: ViewportIntersector,
    highlighter: Option<Arc<dyn CodeHighlighter>>,
    wrapper: Option<Box<dyn CodeBlockWrapper>>,
    lines: Vec<Line<'static>>,
    content_w: u32,
    dirty: bool,
    pub viewport: ViewportState,
}

impl Default for CodeStreamView {
    fn default() -> Self {
        Self::with_options(CodeStreamViewOptions::default())
    }
}

impl CodeStreamView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CodeStreamViewOptions) -> Self {
        Self {
            theme: Theme::for_code_theme(options.code_theme),
            options,
            source: String::new(),
            blocks: Vec::new(),
            code_blocks: Vec::new(),
            intersector: ViewportIntersector::new(),
            highlighter: None,
            wrapper: None,
            lines: Vec::new(),
            content_w: 0,
            dirty: true,
            viewport: ViewportState::default(),
        }
    }

    /// Sets the highlighter once it is ready. Code blocks stay hidden while this is `None`.
    pub fn set_highlighter(&mut self, highlighter: Option<Arc<dyn CodeHighlighter>>) {
        self.highlighter = highlighter;
        self.dirty = true;
    }

    pub fn set_wrapper(&mut self, wrapper: Option<Box<dyn CodeBlockWrapper>>) {
        self.wrapper = wrapper;
        self.dirty = true;
    }

    pub fn append(&mut self, delta: &str) {
        self.source.push_str(delta);
        self.reparse();
    }

    pub fn set_markdown(&mut self, source: &str) {
        self.source = source.to_string();
        self.reparse();
    }

    pub fn reset(&mut self) {
        self.source.clear();
        self.blocks.clear();
        self.code_blocks.clear();
        self.lines.clear();
        self.content_w = 0;
        self.viewport = ViewportState::default();
        self.dirty = true;
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn scroll_y_by(&mut self, delta: i32) {
        self.viewport.scroll_y_by(delta);
    }

    /// Number of code block instances alive (one per code block in the document).
    pub fn code_block_count(&self) -> usize {
        self.code_blocks.len()
    }

    pub fn intersector(&self) -> &ViewportIntersector {
        &self.intersector
    }

    /// Lays out the document for a viewport of `height` rows and returns every line.
    pub fn lines_for_height(&mut self, width: u16, height: u16) -> &[Line<'static>] {
        self.viewport.set_viewport(width, height);
        self.sync();
        &self.lines
    }

    pub fn render_ref(&mut self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let (content_area, scrollbar_x) = if self.options.show_scrollbar && area.width >= 2 {
            (
                Rect::new(area.x, area.y, area.width - 1, area.height),
                Some(area.x + area.width - 1),
            )
        } else {
            (area, None)
        };

        self.viewport
            .set_viewport(content_area.width, content_area.height);
        self.sync();

        for row in 0..content_area.height {
            let y = content_area.y + row;
            buf.set_style(
                Rect::new(content_area.x, y, content_area.width, 1),
                self.theme.text_primary,
            );
            let idx = (self.viewport.y as usize).saturating_add(row as usize);
            if let Some(line) = self.lines.get(idx) {
                render::render_spans_clipped(
                    content_area.x,
                    y,
                    self.viewport.x,
                    content_area.width,
                    buf,
                    &line.spans,
                    self.theme.text_primary,
                );
            }
        }

        if let Some(sb_x) = scrollbar_x {
            render::render_scrollbar(
                Rect::new(sb_x, area.y, 1, area.height),
                buf,
                &self.viewport,
                self.theme.text_muted,
            );
        }
    }

    fn reparse(&mut self) {
        self.blocks = split_markdown(&self.source);
        let code_count = self
            .blocks
            .iter()
            .filter(|b| matches!(b, DocumentBlock::Code(_)))
            .count();
        // Dropping surplus instances releases their observers.
        self.code_blocks.truncate(code_count);
        while self.code_blocks.len() < code_count {
            self.code_blocks.push(StreamCodeBlock::new(
                &self.intersector,
                self.options.observer,
            ));
        }
        self.dirty = true;
    }

    /// Layout, then feed the viewport to the intersector and re-layout if any block turned
    /// visible.
    fn sync(&mut self) {
        let was_at_bottom = self.viewport.is_at_bottom();
        if self.dirty {
            self.layout();
        }
        if self.options.follow_tail && was_at_bottom {
            self.viewport.to_bottom();
        }

        self.intersector.notify(&self.viewport);
        let mut became_visible = 0usize;
        for block in &mut self.code_blocks {
            if block.sync_visibility() {
                became_visible += 1;
            }
        }
        if became_visible > 0 {
            trace!(became_visible, "re-laying out highlighted blocks");
            self.layout();
        }
    }

    fn layout(&mut self) {
        let ctx = RenderContext {
            highlighter: self.highlighter.as_deref(),
            code_theme: self.options.code_theme,
            theme: &self.theme,
            wrapper: self.wrapper.as_deref(),
        };

        let mut lines: Vec<Line<'static>> = Vec::new();
        let mut code_idx = 0usize;
        for block in &self.blocks {
            let start = lines.len();
            match block {
                DocumentBlock::Prose(text) => {
                    if start > 0 {
                        push_gap(&mut lines, self.options.block_gap);
                    }
                    lines.extend(text.split('\n').map(|l| {
                        Line::from(Span::styled(l.to_string(), self.theme.text_primary))
                    }));
                }
                DocumentBlock::Code(node) => {
                    let Some(instance) = self.code_blocks.get_mut(code_idx) else {
                        continue;
                    };
                    code_idx += 1;
                    let Some(text) = instance.render(node, &ctx) else {
                        instance.detach();
                        continue;
                    };
                    if start > 0 {
                        push_gap(&mut lines, self.options.block_gap);
                    }
                    let top = lines.len() as u32;
                    instance.place(RowSpan::new(top, text.lines.len() as u32));
                    lines.extend(text.lines);
                }
            }
        }

        self.content_w = lines.iter().map(line_width).max().unwrap_or(0) as u32;
        self.lines = lines;
        self.viewport
            .set_content(self.content_w, self.lines.len() as u32);
        self.dirty = false;
    }
}

fn push_gap(lines: &mut Vec<Line<'static>>, gap: u16) {
    for _ in 0..gap {
        lines.push(Line::default());
    }
}

fn line_width(line: &Line<'_>) -> usize {
    line.spans
        .iter()
        .map(|s| UnicodeWidthStr::width(s.content.as_ref()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::style::Color;
    use ratatui::style::Style;
    use ratatui_codestream_core::HighlightError;
    use ratatui_codestream_core::text::HighlightedLines;
    use ratatui_codestream_core::text::LanguageSet;
    use ratatui_codestream_core::text::NoHighlight;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    struct CountingHighlighter {
        languages: LanguageSet,
        calls: AtomicUsize,
    }

    impl CountingHighlighter {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                languages: ["ts"].into_iter().map(String::from).collect(),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CodeHighlighter for CountingHighlighter {
        fn loaded_languages(&self) -> &LanguageSet {
            &self.languages
        }

        fn highlight(
            &self,
            code: &str,
            _language: &str,
            _theme: CodeTheme,
        ) -> Result<HighlightedLines, HighlightError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(
                code.split('\n')
                    .map(|l| vec![Span::styled(l.to_string(), Style::default().fg(Color::Red))])
                    .collect(),
            ))
        }
    }

    fn texts(lines: &[Line<'static>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn code_blocks_hidden_until_highlighter_is_set() {
        let mut view = CodeStreamView::new();
        view.set_markdown("intro\n\n```ts\nlet a = 1;\n```\n");
        assert_eq!(texts(view.lines_for_height(40, 10)), vec!["intro"]);

        view.set_highlighter(Some(Arc::new(NoHighlight::new())));
        assert_eq!(
            texts(view.lines_for_height(40, 10)),
            vec!["intro", "", "let a = 1;"]
        );
    }

    #[test]
    fn streamed_block_is_trimmed_then_highlighted_once_visible() {
        let hi = CountingHighlighter::new();
        let shared: Arc<dyn CodeHighlighter> = hi.clone();
        let mut view = CodeStreamView::new();
        view.set_highlighter(Some(shared));

        view.append("```ts\nlet a");
        let lines = view.lines_for_height(40, 10).to_vec();
        assert_eq!(texts(&lines), vec!["let a"]);
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::Red));
        assert_eq!(hi.calls(), 1);

        view.append(" = 1;\n``");
        assert_eq!(texts(view.lines_for_height(40, 10)), vec!["let a = 1;"]);
        assert_eq!(hi.calls(), 2);
    }

    #[test]
    fn offscreen_block_waits_until_scrolled_near() {
        let hi = CountingHighlighter::new();
        let shared: Arc<dyn CodeHighlighter> = hi.clone();
        let mut view = CodeStreamView::new();
        view.set_highlighter(Some(shared));

        let prose: Vec<String> = (0..30).map(|i| format!("line {i}")).collect();
        view.set_markdown(&format!("{}\n\n```ts\nlet far = 1;\n```\n", prose.join("\n")));

        let lines = view.lines_for_height(40, 5).to_vec();
        assert_eq!(lines.len(), 32);
        assert_eq!(lines[31].spans[0].style.fg, None);
        assert_eq!(hi.calls(), 0);
        assert_eq!(view.intersector().active_observers(), 1);

        view.scroll_y_by(25);
        let lines = view.lines_for_height(40, 5).to_vec();
        assert_eq!(lines[31].spans[0].style.fg, Some(Color::Red));
        assert_eq!(hi.calls(), 1);
        assert_eq!(view.intersector().active_observers(), 0);

        // Scrolling away keeps the highlighted output without new work.
        view.scroll_y_by(-25);
        let lines = view.lines_for_height(40, 5).to_vec();
        assert_eq!(lines[31].spans[0].style.fg, Some(Color::Red));
        assert_eq!(hi.calls(), 1);
    }

    #[test]
    fn block_that_stops_rendering_drops_its_rows() {
        let mut view = CodeStreamView::new();
        view.set_highlighter(Some(Arc::new(NoHighlight::new())));

        let prose: Vec<String> = (0..30).map(|i| format!("line {i}")).collect();
        let prose = prose.join("\n");
        view.set_markdown(&format!(
            "{prose}\n\n````markdown\n# Example\n```js\nx\n```\n````\n"
        ));
        assert_eq!(view.lines_for_height(40, 5).len(), 35);
        assert_eq!(view.intersector().observed_targets(), 1);

        // The nested fence reopens: the block is unsafe again and renders nothing.
        view.set_markdown(&format!("{prose}\n\n````markdown\n# Example\n```js\nx\n"));
        assert_eq!(view.lines_for_height(40, 5).len(), 30);
        assert_eq!(view.intersector().observed_targets(), 0);
        assert_eq!(view.intersector().active_observers(), 1);

        view.scroll_y_by(25);
        view.lines_for_height(40, 5);
        assert_eq!(view.intersector().active_observers(), 1);
    }

    #[test]
    fn block_taller_than_the_screen_is_highlighted() {
        let hi = CountingHighlighter::new();
        let shared: Arc<dyn CodeHighlighter> = hi.clone();
        let mut view = CodeStreamView::new();
        view.set_highlighter(Some(shared));

        let body: Vec<String> = (0..6000).map(|i| format!("let v{i} = {i};")).collect();
        view.set_markdown(&format!("```ts\n{}\n```\n", body.join("\n")));
        view.lines_for_height(40, 20);
        view.scroll_y_by(3000);
        let lines = view.lines_for_height(40, 20).to_vec();

        assert_eq!(view.intersector().active_observers(), 0);
        assert_eq!(hi.calls(), 1);
        assert_eq!(lines[3000].spans[0].style.fg, Some(Color::Red));
    }

    #[test]
    fn reset_releases_every_block_observer() {
        let mut view = CodeStreamView::new();
        view.set_markdown("```ts\na\n```\n\n```ts\nb\n```\n");
        assert_eq!(view.code_block_count(), 2);
        assert_eq!(view.intersector().active_observers(), 2);

        view.set_markdown("```ts\na\n```\n");
        assert_eq!(view.intersector().active_observers(), 1);

        view.reset();
        assert_eq!(view.code_block_count(), 0);
        assert_eq!(view.intersector().active_observers(), 0);
        assert_eq!(view.source(), "");
    }

    #[test]
    fn wrapper_decorates_code_output() {
        let mut view = CodeStreamView::new();
        view.set_highlighter(Some(Arc::new(NoHighlight::new())));
        let wrapper: Box<dyn CodeBlockWrapper> =
            Box::new(|mut output: ratatui::text::Text<'static>, language: &str| {
                output.lines.insert(0, Line::from(format!("── {language} ──")));
                output
            });
        view.set_wrapper(Some(wrapper));
        view.set_markdown("```swift\nlet a = 1\n```\n");
        assert_eq!(
            texts(view.lines_for_height(40, 10)),
            vec!["── swift ──", "let a = 1"]
        );
    }

    #[test]
    fn render_ref_draws_text_and_scrollbar() {
        let mut view = CodeStreamView::new();
        view.set_markdown("a\nb\nc\nd\ne\nf");
        let area = Rect::new(0, 0, 10, 3);
        let mut buf = Buffer::empty(area);
        view.render_ref(area, &mut buf);

        assert_eq!(buf[(0, 0)].symbol(), "a");
        assert_eq!(buf[(0, 2)].symbol(), "c");
        assert_eq!(buf[(9, 0)].symbol(), "█");
        assert_eq!(buf[(9, 2)].symbol(), " ");
    }

    #[test]
    fn follow_tail_pins_viewport_to_new_content() {
        let mut view = CodeStreamView::with_options(CodeStreamViewOptions {
            follow_tail: true,
            ..CodeStreamViewOptions::default()
        });
        view.set_markdown("a\nb");
        view.lines_for_height(10, 2);
        assert_eq!(view.viewport.y, 0);

        view.append("\nc\nd");
        view.lines_for_height(10, 2);
        assert_eq!(view.viewport.y, 2);
    }
}
