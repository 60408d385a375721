use ratatui_codestream_core::theme::CodeTheme;
use serde::Deserialize;

/// A language name and the grammar tokens tried, in order, to load it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LanguageSpec {
    pub name: String,
    pub candidates: Vec<String>,
}

impl LanguageSpec {
    pub fn new(name: &str, candidates: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            candidates: candidates.iter().map(|c| (*c).to_string()).collect(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HighlighterConfig {
    pub languages: Vec<LanguageSpec>,
    /// Extra names registered at init, each resolved by its own name.
    pub extra_languages: Vec<String>,
    pub themes: Vec<CodeTheme>,
    /// Maximum cached highlight results. `0` disables the cache.
    pub cache_capacity: usize,
}

impl Default for HighlighterConfig {
    fn default() -> Self {
        Self {
            languages: vec![
                LanguageSpec::new("json", &["json"]),
                LanguageSpec::new("bash", &["bash", "sh"]),
                LanguageSpec::new("vue", &["vue", "html"]),
                LanguageSpec::new("ts", &["typescript", "ts", "js"]),
                LanguageSpec::new("tsx", &["tsx", "jsx", "js"]),
                LanguageSpec::new("css", &["css"]),
                LanguageSpec::new("html", &["html"]),
                LanguageSpec::new("python", &["python", "py"]),
                LanguageSpec::new("go", &["go"]),
                LanguageSpec::new("rust", &["rust", "rs"]),
                LanguageSpec::new("markdown", &["markdown", "md"]),
            ],
            extra_languages: Vec::new(),
            themes: vec![CodeTheme::Light, CodeTheme::Dark],
            cache_capacity: 256,
        }
    }
}

impl HighlighterConfig {
    /// Every language spec the engine should try to register, extras last.
    pub fn language_specs(&self) -> impl Iterator<Item = LanguageSpec> + '_ {
        self.languages.iter().cloned().chain(
            self.extra_languages
                .iter()
                .map(|name| LanguageSpec::new(name, &[name.as_str()])),
        )
    }
}
