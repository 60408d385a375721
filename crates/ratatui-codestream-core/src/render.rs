use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;
use unicode_width::UnicodeWidthChar;

use crate::viewport::ViewportState;

/// Draws a one-column vertical scrollbar for `state` into `area`.
///
/// The track is left blank when all content fits.
pub fn render_scrollbar(area: Rect, buf: &mut Buffer, state: &ViewportState, style: Style) {
    buf.set_style(area, style);
    let thumb = scrollbar_thumb(area.height, state);
    for dy in 0..area.height {
        let on_thumb = thumb.is_some_and(|(top, len)| dy >= top && dy < top + len);
        let symbol = if on_thumb { "█" } else { " " };
        buf.set_stringn(area.x, area.y + dy, symbol, 1, style);
    }
}

/// Thumb `(top, len)` in a track of `track` rows, or `None` when nothing is scrollable.
fn scrollbar_thumb(track: u16, state: &ViewportState) -> Option<(u16, u16)> {
    let content = u64::from(state.content_h);
    let visible = u64::from(state.viewport_h);
    if track == 0 || content <= visible {
        return None;
    }

    let track = u64::from(track);
    let len = ((visible * track + content / 2) / content).clamp(1, track);
    let max_y = content - visible;
    let room = track - len;
    let y = u64::from(state.y).min(max_y);
    let top = (y * room + max_y / 2) / max_y;
    Some((top as u16, len as u16))
}

/// Draws `spans` on row `y`, skipping the first `start_col` display columns and writing at most
/// `max_cols` columns. Tabs expand to four spaces; wide glyphs cut by the left edge are skipped.
pub fn render_spans_clipped(
    x: u16,
    y: u16,
    start_col: u32,
    max_cols: u16,
    buf: &mut Buffer,
    spans: &[Span<'static>],
    fallback_style: Style,
) {
    if max_cols == 0 {
        return;
    }

    let start_col = start_col as usize;
    let max_cols = max_cols as usize;
    let mut col = 0usize;
    let mut out_cols = 0usize;
    let mut dx = 0u16;
    let mut tmp = [0u8; 4];

    for span in spans {
        let style = fallback_style.patch(span.style);
        for ch in span.content.chars() {
            if ch == '\t' {
                for _ in 0..4 {
                    if col < start_col {
                        col += 1;
                        continue;
                    }
                    if out_cols + 1 > max_cols {
                        return;
                    }
                    if let Some(cell) = buf.cell_mut((x + dx, y)) {
                        cell.set_style(style);
                        cell.set_symbol(" ");
                    }
                    dx += 1;
                    out_cols += 1;
                    col += 1;
                }
                continue;
            }

            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if w == 0 {
                continue;
            }
            if col < start_col {
                col += w;
                continue;
            }
            if out_cols + w > max_cols {
                return;
            }

            let s = ch.encode_utf8(&mut tmp);
            if let Some(cell) = buf.cell_mut((x + dx, y)) {
                cell.set_style(style);
                cell.set_symbol(s);
            }
            dx += 1;
            out_cols += 1;
            col += w;

            if w == 2 {
                if out_cols >= max_cols {
                    return;
                }
                if let Some(cell) = buf.cell_mut((x + dx, y)) {
                    cell.set_style(style);
                    cell.set_symbol("");
                }
                dx += 1;
                out_cols += 1;
            }
        }
    }
}
