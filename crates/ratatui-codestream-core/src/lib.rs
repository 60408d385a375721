//! `ratatui-codestream-core` provides the building blocks shared by the streaming code block
//! pipeline.
//!
//! This crate is designed for **widget library authors** and apps that host streamed Markdown.
//! The highlighting engine (syntect) and the Markdown side live in separate crates.
//!
//! ## Design goals
//!
//! - Event-loop agnostic: you drive scrolling, layout and rendering from your app.
//! - No async runtime: visibility notifications are queued and drained on the render thread.
//! - Highlighting is a capability ([`text::CodeHighlighter`]) so hosts can swap engines or use
//!   [`text::NoHighlight`] in tests.
//!
//! Useful entry points:
//! - [`visibility::VisibilityGate`]: one-shot "entered the viewport" signal per block.
//! - [`visibility::ViewportIntersector`]: viewport-backed intersection environment.
//! - [`code_render::render_plain_code`] / [`code_render::render_highlighted_code`]: render core.
pub mod error;
pub mod theme;

pub mod text;

pub mod render;
pub mod viewport;
pub mod visibility;

pub mod code_render;

pub use error::HighlightError;
