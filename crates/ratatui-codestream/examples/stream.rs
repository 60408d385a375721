use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEventKind;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Text;
use ratatui::widgets::Paragraph;
use ratatui_codestream::markdown::block::CodeBlockWrapper;
use ratatui_codestream::markdown::view::CodeStreamView;
use ratatui_codestream::markdown::view::CodeStreamViewOptions;
use ratatui_codestream::syntax;
use ratatui_codestream::text::CodeHighlighter;
use std::io;
use std::sync::Arc;
use std::time::Duration;

const SAMPLE_MARKDOWN: &str = r#"Streaming a reply that contains code.

```rust
fn main() {
    let greeting = "hello";
    println!("{greeting}, world");
}
```

A nested Markdown example only shows up once its outer fence closes:

````markdown
# Example

```js
console.log(1)
```
````

Plenty of prose follows, so the next block starts off screen.
Scroll down with j to watch it switch from plain text to highlighted.
.
.
.
.
.
.
.
.
.
.
.
.
.
.
.
.

```python
def far_away():
    return "highlighted only once it scrolls near the viewport"
```
"#;

const CHUNK_CHARS: usize = 6;

fn main() -> io::Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    crossterm::execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Starts engine construction in the background; the view picks it up once ready.
    let _pending = syntax::get_highlighter();

    let mut view = CodeStreamView::with_options(CodeStreamViewOptions {
        follow_tail: true,
        ..Default::default()
    });
    let wrapper: Box<dyn CodeBlockWrapper> =
        Box::new(|mut output: Text<'static>, language: &str| {
            let label = if language.is_empty() { "code" } else { language };
            output
                .lines
                .insert(0, Line::from(format!("─ {label} ─")).dark_gray());
            output
        });
    view.set_wrapper(Some(wrapper));

    let res = run(&mut terminal, &mut view);

    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

fn run<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    view: &mut CodeStreamView,
) -> io::Result<()> {
    let chars: Vec<char> = SAMPLE_MARKDOWN.chars().collect();
    let mut streamed = 0usize;
    let mut has_highlighter = false;

    loop {
        if !has_highlighter {
            if let Some(engine) = syntax::global().ready() {
                let engine: Arc<dyn CodeHighlighter> = engine;
                view.set_highlighter(Some(engine));
                has_highlighter = true;
            }
        }
        if streamed < chars.len() {
            let end = (streamed + CHUNK_CHARS).min(chars.len());
            view.append(&chars[streamed..end].iter().collect::<String>());
            streamed = end;
        }

        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(1)])
                .split(f.area());
            view.render_ref(chunks[0], f.buffer_mut());
            let status = format!(
                "j/k scroll  g/G top/bottom  r restart  q quit   highlighter: {}",
                if has_highlighter { "ready" } else { "loading" }
            );
            f.render_widget(Paragraph::new(status).dark_gray(), chunks[1]);
        })?;

        if !crossterm::event::poll(Duration::from_millis(40))? {
            continue;
        }
        let Event::Key(key) = crossterm::event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Char('j') | KeyCode::Down => view.scroll_y_by(1),
            KeyCode::Char('k') | KeyCode::Up => view.scroll_y_by(-1),
            KeyCode::PageDown => view.viewport.page_down(),
            KeyCode::PageUp => view.viewport.page_up(),
            KeyCode::Char('g') => view.viewport.to_top(),
            KeyCode::Char('G') => view.viewport.to_bottom(),
            KeyCode::Char('r') => {
                view.reset();
                streamed = 0;
            }
            _ => {}
        }
    }
}
