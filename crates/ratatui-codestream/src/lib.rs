//! Stream-safe, lazily highlighted code blocks for ratatui.
//!
//! The core building blocks are always available. Enable `syntect` for the highlighting engine
//! and its shared lifecycle manager, and `markdown` for fence extraction, per-block dispatch and
//! [`markdown::view::CodeStreamView`].
pub use ratatui_codestream_core::HighlightError;
pub use ratatui_codestream_core::code_render;
pub use ratatui_codestream_core::render;
pub use ratatui_codestream_core::text;
pub use ratatui_codestream_core::theme;
pub use ratatui_codestream_core::viewport;
pub use ratatui_codestream_core::visibility;

#[cfg(feature = "markdown")]
pub use ratatui_codestream_markdown as markdown;

#[cfg(feature = "syntect")]
pub use ratatui_codestream_syntax as syntax;
