//! Streaming code blocks for `ratatui-codestream`.
//!
//! Markdown streamed from a generative source arrives token by token, so a code block's closing
//! fence may be half-received at any render pass. This crate decides when a block is safe to
//! show, and only highlights blocks that have scrolled near the viewport.
//!
//! ## Layers
//!
//! - [`node`]: the hast-shaped `<pre><code>` snapshot handed over by the tree pipeline.
//! - [`extract`]: language + safe-to-render code text for one snapshot.
//! - [`block::StreamCodeBlock`]: per-block dispatcher (plain text until visible, then highlighted).
//! - [`document`]: splits streamed Markdown into prose and code block snapshots.
//! - [`view::CodeStreamView`]: a scrollable view hosting many blocks.
pub mod block;
pub mod document;
pub mod extract;
pub mod node;
pub mod view;

pub use extract::ExtractionResult;
pub use extract::extract_code_meta;
pub use node::SerializedCodeNode;
