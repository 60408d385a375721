//! Highlighting engine and lifecycle for `ratatui-codestream`.
//!
//! - [`syntect::SyntectHighlighter`]: a [`CodeHighlighter`] backed by syntect, with a fixed,
//!   bounded language registry and an exact-input highlight cache.
//! - [`lifecycle::HighlighterManager`]: builds the engine at most once on a background thread and
//!   hands every caller the same shared future. [`lifecycle::global`] is the process-wide
//!   instance.
//!
//! [`CodeHighlighter`]: ratatui_codestream_core::text::CodeHighlighter
pub mod cache;
pub mod config;
pub mod lifecycle;
pub mod syntect;

pub use config::HighlighterConfig;
pub use lifecycle::HighlighterManager;
pub use lifecycle::get_highlighter;
pub use lifecycle::global;
