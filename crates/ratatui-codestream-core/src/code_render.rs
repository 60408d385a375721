use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::text::Text;
use unicode_width::UnicodeWidthStr;

/// Styling for the code render core.
#[derive(Clone, Copy, Debug, Default)]
pub struct CodeRenderStyles {
    /// Base style applied to code spans (patched onto highlight styles).
    pub base: Style,
    /// Background painted under highlighted spans, if the engine's theme has one.
    pub background: Option<Color>,
}

#[derive(Clone, Debug, Default)]
pub struct RenderedCode {
    /// Fully materialized lines ready for drawing via `Paragraph`/custom rendering.
    pub lines: Vec<Line<'static>>,
    /// Maximum display width (in terminal cell units) across all rendered lines.
    pub content_width: u32,
    /// Total number of rendered lines.
    pub content_height: u32,
}

impl RenderedCode {
    pub fn into_text(self) -> Text<'static> {
        Text::from(self.lines)
    }

    pub fn from_text(text: Text<'static>) -> Self {
        let lines = text.lines;
        let content_width = lines
            .iter()
            .map(|l| UnicodeWidthStr::width(join_spans_plain(&l.spans).as_str()) as u32)
            .max()
            .unwrap_or(0);
        Self {
            content_height: lines.len() as u32,
            content_width,
            lines,
        }
    }
}

/// Renders `code` as unstyled preformatted lines, one per `\n`-separated line.
pub fn render_plain_code(code: &str, styles: CodeRenderStyles) -> RenderedCode {
    let lines: Vec<Line<'static>> = code
        .split('\n')
        .map(|l| Line::from(vec![Span::styled(l.to_string(), styles.base)]))
        .collect();
    RenderedCode::from_text(Text::from(lines))
}

/// Materializes highlighted spans, patching `styles.base` and the background underneath.
pub fn render_highlighted_code(
    highlighted: &[Vec<Span<'static>>],
    styles: CodeRenderStyles,
) -> RenderedCode {
    let mut base = styles.base;
    if let Some(bg) = styles.background {
        base = base.bg(bg);
    }

    let lines: Vec<Line<'static>> = highlighted
        .iter()
        .map(|spans| {
            let spans = spans
                .iter()
                .cloned()
                .map(|mut s| {
                    s.style = base.patch(s.style);
                    s
                })
                .collect::<Vec<_>>();
            Line::from(spans)
        })
        .collect();
    RenderedCode::from_text(Text::from(lines))
}

fn join_spans_plain(spans: &[Span<'_>]) -> String {
    let mut out = String::new();
    for s in spans {
        out.push_str(s.content.as_ref());
    }
    out
}
