use std::collections::HashMap;
use std::sync::Arc;

use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui_codestream_core::HighlightError;
use ratatui_codestream_core::text::CodeHighlighter;
use ratatui_codestream_core::text::FALLBACK_LANGUAGE;
use ratatui_codestream_core::text::HighlightedLines;
use ratatui_codestream_core::text::LanguageSet;
use ratatui_codestream_core::theme::CodeTheme;
use syntect::easy::HighlightLines;
use syntect::highlighting::FontStyle;
use syntect::highlighting::Style as SynStyle;
use syntect::highlighting::Theme;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxReference;
use syntect::parsing::SyntaxSet;
use tracing::debug;
use tracing::warn;

use crate::cache::HighlightCache;
use crate::config::HighlighterConfig;

/// Maps a host theme key to the bundled syntect theme that renders it.
pub fn syntect_theme_name(theme: CodeTheme) -> &'static str {
    match theme {
        CodeTheme::Light => "InspiredGitHub",
        CodeTheme::Dark => "base16-ocean.dark",
    }
}

pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
    themes: HashMap<CodeTheme, Theme>,
    /// Registered language name -> syntect syntax name.
    grammars: HashMap<String, String>,
    loaded: LanguageSet,
    cache: HighlightCache,
}

impl SyntectHighlighter {
    pub fn new() -> Result<Self, HighlightError> {
        Self::with_config(&HighlighterConfig::default())
    }

    /// Loads the configured themes and registers every configured language up front.
    ///
    /// Languages whose grammar cannot be found are skipped. Fails if a theme is missing or the
    /// fallback language cannot be registered.
    pub fn with_config(config: &HighlighterConfig) -> Result<Self, HighlightError> {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let mut theme_set = ThemeSet::load_defaults();

        let mut themes = HashMap::new();
        for theme in &config.themes {
            let name = syntect_theme_name(*theme);
            let Some(loaded) = theme_set.themes.remove(name) else {
                return Err(HighlightError::Init(format!("syntect theme `{name}` is missing")));
            };
            themes.insert(*theme, loaded);
        }

        let mut grammars = HashMap::new();
        for spec in config.language_specs() {
            let found = spec
                .candidates
                .iter()
                .find_map(|token| syntax_set.find_syntax_by_token(token));
            match found {
                Some(syntax) => {
                    grammars.insert(spec.name, syntax.name.clone());
                }
                None => warn!(language = %spec.name, "no grammar found, language not loaded"),
            }
        }
        if !grammars.contains_key(FALLBACK_LANGUAGE) {
            return Err(HighlightError::MissingFallback(FALLBACK_LANGUAGE.to_string()));
        }

        let loaded: LanguageSet = grammars.keys().cloned().collect();
        debug!(?loaded, "syntect highlighter initialized");

        Ok(Self {
            syntax_set,
            themes,
            grammars,
            loaded,
            cache: HighlightCache::new(config.cache_capacity),
        })
    }

    pub fn cache(&self) -> &HighlightCache {
        &self.cache
    }

    fn syntax_for(&self, language: &str) -> &SyntaxReference {
        self.grammars
            .get(language)
            .or_else(|| self.grammars.get(FALLBACK_LANGUAGE))
            .and_then(|name| self.syntax_set.find_syntax_by_name(name))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    fn highlight_uncached(
        &self,
        code: &str,
        language: &str,
        theme: &Theme,
    ) -> Result<Vec<Vec<Span<'static>>>, HighlightError> {
        let syntax = self.syntax_for(language);
        let mut highlighter = HighlightLines::new(syntax, theme);

        let mut out: Vec<Vec<Span<'static>>> = Vec::new();
        let mut line_buf = String::new();
        for line in code.split('\n') {
            line_buf.clear();
            line_buf.push_str(line);
            line_buf.push('\n');
            let regions = highlighter
                .highlight_line(&line_buf, &self.syntax_set)
                .map_err(|e| HighlightError::Engine(e.to_string()))?;

            let mut spans: Vec<Span<'static>> = Vec::new();
            for (style, s) in regions {
                let s = s.trim_end_matches('\n');
                if s.is_empty() {
                    continue;
                }
                spans.push(Span::styled(s.to_string(), syn_style_to_ratatui(style)));
            }
            if spans.is_empty() {
                spans.push(Span::raw(line.to_string()));
            }
            out.push(spans);
        }
        Ok(out)
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn loaded_languages(&self) -> &LanguageSet {
        &self.loaded
    }

    fn highlight(
        &self,
        code: &str,
        language: &str,
        theme: CodeTheme,
    ) -> Result<HighlightedLines, HighlightError> {
        if let Some(hit) = self.cache.get(code, language, theme) {
            return Ok(hit);
        }
        let Some(syn_theme) = self.themes.get(&theme) else {
            return Err(HighlightError::UnknownTheme(theme.as_str().to_string()));
        };
        let highlighted = Arc::new(self.highlight_uncached(code, language, syn_theme)?);
        self.cache.insert(code, language, theme, highlighted.clone());
        Ok(highlighted)
    }

    fn background_color(&self, theme: CodeTheme) -> Option<Color> {
        let bg = self.themes.get(&theme)?.settings.background?;
        Some(Color::Rgb(bg.r, bg.g, bg.b))
    }
}

fn syn_style_to_ratatui(s: SynStyle) -> Style {
    let mut out = Style::default().fg(Color::Rgb(s.foreground.r, s.foreground.g, s.foreground.b));

    if s.font_style.contains(FontStyle::BOLD) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if s.font_style.contains(FontStyle::ITALIC) {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if s.font_style.contains(FontStyle::UNDERLINE) {
        out = out.add_modifier(Modifier::UNDERLINED);
    }

    out
}
