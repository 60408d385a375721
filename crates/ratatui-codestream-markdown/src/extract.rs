//! Language and safe-to-render code for one streamed `<pre><code>` snapshot.
//!
//! The tree pipeline re-parses the whole document on every token, so a snapshot may end in the
//! middle of a closing fence. Two heuristics keep half-received fences off screen:
//!
//! - Any language but `markdown`: a trailing line that starts with a backtick is a closing fence
//!   still streaming in, so it is dropped and the rest is shown.
//! - `markdown`: the block may contain nested example fences. Nothing is shown until the last
//!   line is a fence marker and the number of fence lines is even.
//!
//! Fence lines are detected line by line, so markers inside inline code spans or escaped
//! contexts are counted as well.
use ratatui_codestream_core::text::FALLBACK_LANGUAGE;
use ratatui_codestream_core::text::LanguageSet;
use tracing::debug;

use crate::node::Node;
use crate::node::SerializedCodeNode;

pub const MARKDOWN_LANGUAGE: &str = "markdown";

const FENCE_MARKER: &str = "```";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    /// `language` if loaded, otherwise [`FALLBACK_LANGUAGE`].
    pub highlight_lang: String,
    /// Declared language tag, empty if absent.
    pub language: String,
    /// Empty while the block is not safe to render.
    pub code: String,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

pub fn extract_code_meta(node: &SerializedCodeNode, loaded: &LanguageSet) -> ExtractionResult {
    let (language, code) = match code_text(node) {
        Some((language, text)) => {
            let code = safe_code(&language, text);
            (language, code)
        }
        None => (String::new(), String::new()),
    };
    ExtractionResult {
        highlight_lang: resolve_highlight_language(&language, loaded).to_string(),
        language,
        code,
    }
}

/// Decodes `json` and extracts it. Undecodable input is treated as nothing to render yet.
pub fn extract_code_meta_json(json: &str, loaded: &LanguageSet) -> ExtractionResult {
    match SerializedCodeNode::from_json(json) {
        Ok(node) => extract_code_meta(&node, loaded),
        Err(e) => {
            debug!("ignoring undecodable code node: {e}");
            extract_code_meta(&SerializedCodeNode::default(), loaded)
        }
    }
}

pub fn resolve_highlight_language<'a>(language: &'a str, loaded: &LanguageSet) -> &'a str {
    if loaded.contains(language) {
        language
    } else {
        FALLBACK_LANGUAGE
    }
}

/// Only the `code > text` shape under the root is checked; the root's own tag is not.
fn code_text(node: &SerializedCodeNode) -> Option<(String, &str)> {
    let Some(Node::Element(code)) = node.children.first() else {
        return None;
    };
    if code.tag_name != "code" {
        return None;
    }
    let Some(Node::Text(text)) = code.children.first() else {
        return None;
    };
    let language = code
        .properties
        .class_name
        .as_ref()
        .and_then(|class_name| declared_language(&class_name.tokens()))
        .unwrap_or_default();
    Some((language, text.value.as_str()))
}

/// Suffix after the first hyphen of the first class token mentioning `language`.
fn declared_language(tokens: &[&str]) -> Option<String> {
    let token = tokens.iter().find(|t| t.contains("language"))?;
    let (_, name) = token.split_once('-')?;
    Some(name.to_string())
}

fn safe_code(language: &str, text: &str) -> String {
    let text = text.strip_suffix('\n').unwrap_or(text);
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.last().copied().unwrap_or_default();

    if language == MARKDOWN_LANGUAGE {
        let fences = lines.iter().filter(|l| is_fence_line(l)).count();
        if is_fence_line(last) && fences % 2 == 0 {
            return text.to_string();
        }
        return String::new();
    }

    if last.trim_start().starts_with('`') {
        return lines[..lines.len() - 1].join("\n");
    }
    text.to_string()
}

fn is_fence_line(line: &str) -> bool {
    line.trim_start().starts_with(FENCE_MARKER)
}
