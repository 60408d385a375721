use pulldown_cmark::CodeBlockKind;
use pulldown_cmark::CowStr;
use pulldown_cmark::Event;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;

use crate::node::SerializedCodeNode;

#[derive(Clone, Debug, PartialEq)]
pub enum DocumentBlock {
    /// Raw Markdown between code blocks, trimmed of surrounding blank lines.
    Prose(String),
    Code(SerializedCodeNode),
}

/// Splits (possibly incomplete) Markdown into prose runs and `<pre><code>` snapshots.
///
/// An unterminated fence runs to the end of the input, which is exactly the streaming case the
/// extractor has to judge.
pub fn split_markdown(source: &str) -> Vec<DocumentBlock> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut blocks = Vec::new();
    let mut prose_start = 0usize;
    let mut code: Option<(Option<String>, String)> = None;

    for (event, range) in Parser::new_ext(source, options).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                push_prose(&mut blocks, &source[prose_start..range.start]);
                let language = match kind {
                    CodeBlockKind::Fenced(info) => normalize_fenced_lang(&info),
                    CodeBlockKind::Indented => None,
                };
                code = Some((language, String::new()));
            }
            Event::Text(text) => {
                if let Some((_, buf)) = code.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, text)) = code.take() {
                    blocks.push(DocumentBlock::Code(SerializedCodeNode::pre_code(
                        language.as_deref(),
                        text,
                    )));
                }
                prose_start = range.end;
            }
            _ => {}
        }
    }

    if let Some((language, text)) = code.take() {
        blocks.push(DocumentBlock::Code(SerializedCodeNode::pre_code(
            language.as_deref(),
            text,
        )));
        prose_start = source.len();
    }
    push_prose(&mut blocks, &source[prose_start.min(source.len())..]);
    blocks
}

fn push_prose(blocks: &mut Vec<DocumentBlock>, raw: &str) {
    let trimmed = raw.trim_matches('\n').trim_end();
    if trimmed.trim().is_empty() {
        return;
    }
    blocks.push(DocumentBlock::Prose(trimmed.to_string()));
}

fn normalize_fenced_lang(lang: &CowStr<'_>) -> Option<String> {
    let raw = lang.trim();
    let first = raw.split_whitespace().next().unwrap_or("");
    let first = first.split(',').next().unwrap_or("").trim();
    if first.is_empty() {
        return None;
    }
    let first = first.strip_prefix("language-").unwrap_or(first);
    let first = first.strip_prefix('{').unwrap_or(first);
    let first = first.strip_suffix('}').unwrap_or(first);
    let first = first.trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}
