use thiserror::Error;

/// Errors raised by highlighting engines and their initialization.
///
/// The type is `Clone` because a single failed initialization is handed to every waiter of the
/// shared initialization future.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HighlightError {
    #[error("theme `{0}` is not loaded")]
    UnknownTheme(String),

    #[error("fallback language `{0}` could not be registered")]
    MissingFallback(String),

    #[error("failed to spawn highlighter init thread: {0}")]
    Spawn(String),

    #[error("highlighter init was dropped before completing")]
    InitCanceled,

    #[error("highlighter init failed: {0}")]
    Init(String),

    #[error("highlighting failed: {0}")]
    Engine(String),
}
