use ratatui::style::Color;
use ratatui::style::Style;
use serde::Deserialize;
use serde::Serialize;

/// Host-facing theme key for code blocks.
///
/// The key is passed through the pipeline opaquely; the highlighting engine resolves it to its
/// own style set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeTheme {
    Light,
    #[default]
    Dark,
}

impl CodeTheme {
    pub fn as_str(self) -> &'static str {
        match self {
            CodeTheme::Light => "light",
            CodeTheme::Dark => "dark",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Theme {
    pub text_primary: Style,
    pub text_muted: Style,
    pub code_plain: Style,
    pub code_background: Option<Color>,
}

impl Theme {
    pub fn for_code_theme(code_theme: CodeTheme) -> Self {
        match code_theme {
            CodeTheme::Dark => Self::default(),
            CodeTheme::Light => Self {
                code_plain: Style::default().fg(Color::Black),
                code_background: Some(Color::Rgb(0xf6, 0xf8, 0xfa)),
                ..Self::default()
            },
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        use ratatui::style::Stylize;

        Self {
            text_primary: Style::default(),
            text_muted: Style::default().dark_gray(),
            code_plain: Style::default(),
            code_background: None,
        }
    }
}
