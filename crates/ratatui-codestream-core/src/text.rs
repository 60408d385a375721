use std::collections::BTreeSet;
use std::sync::Arc;

use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::text::Span;

use crate::error::HighlightError;
use crate::theme::CodeTheme;

/// Language substituted when a block declares a language the engine has not loaded.
///
/// Engines must always have this language loaded.
pub const FALLBACK_LANGUAGE: &str = "ts";

pub type LanguageSet = BTreeSet<String>;

/// Highlighted output, one `Vec<Span>` per source line.
pub type HighlightedLines = Arc<Vec<Vec<Span<'static>>>>;

/// A ready highlighting engine.
///
/// Implementations are shared between all block instances, so they must be safe for concurrent
/// reads. Results for an identical `(code, language, theme)` triple must be identical; engines
/// are free to serve them from a cache.
pub trait CodeHighlighter: Send + Sync {
    fn loaded_languages(&self) -> &LanguageSet;

    fn highlight(
        &self,
        code: &str,
        language: &str,
        theme: CodeTheme,
    ) -> Result<HighlightedLines, HighlightError>;

    fn background_color(&self, _theme: CodeTheme) -> Option<Color> {
        None
    }

    fn is_loaded(&self, language: &str) -> bool {
        self.loaded_languages().contains(language)
    }
}

/// A highlighter that only knows the fallback language and emits unstyled spans.
#[derive(Clone, Debug)]
pub struct NoHighlight {
    languages: LanguageSet,
}

impl NoHighlight {
    pub fn new() -> Self {
        Self {
            languages: LanguageSet::from([FALLBACK_LANGUAGE.to_string()]),
        }
    }
}

impl Default for NoHighlight {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeHighlighter for NoHighlight {
    fn loaded_languages(&self) -> &LanguageSet {
        &self.languages
    }

    fn highlight(
        &self,
        code: &str,
        _language: &str,
        _theme: CodeTheme,
    ) -> Result<HighlightedLines, HighlightError> {
        Ok(Arc::new(
            code.split('\n')
                .map(|l| vec![Span::styled(l.to_string(), Style::default())])
                .collect(),
        ))
    }
}
