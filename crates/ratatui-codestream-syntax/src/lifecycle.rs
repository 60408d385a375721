//! Process-wide highlighter lifecycle.
//!
//! The engine moves through `uninitialized -> initializing -> ready`. The first call to
//! [`HighlighterManager::get_highlighter`] spawns construction on a background thread and stores
//! a [`Shared`] future; every later call, before or after completion, gets a clone of that same
//! future. A failed construction is delivered to every waiter and is not retried until
//! [`HighlighterManager::reset`] is called.
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::OnceLock;
use std::thread;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future;
use futures::future::BoxFuture;
use futures::future::Shared;
use ratatui_codestream_core::HighlightError;
use ratatui_codestream_core::text::CodeHighlighter;
use ratatui_codestream_core::text::LanguageSet;
use tracing::debug;
use tracing::error;

use crate::config::HighlighterConfig;
use crate::syntect::SyntectHighlighter;

pub type InitResult<H> = Result<Arc<H>, HighlightError>;
pub type HighlighterFuture<H = SyntectHighlighter> = Shared<BoxFuture<'static, InitResult<H>>>;

type Factory<H> = dyn Fn() -> Result<H, HighlightError> + Send + Sync;

pub struct HighlighterManager<H = SyntectHighlighter> {
    factory: Arc<Factory<H>>,
    ready: Arc<OnceLock<Arc<H>>>,
    pending: Mutex<Option<HighlighterFuture<H>>>,
}

impl HighlighterManager<SyntectHighlighter> {
    pub fn with_config(config: HighlighterConfig) -> Self {
        Self::new(move || SyntectHighlighter::with_config(&config))
    }
}

impl<H> HighlighterManager<H>
where
    H: CodeHighlighter + 'static,
{
    pub fn new(factory: impl Fn() -> Result<H, HighlightError> + Send + Sync + 'static) -> Self {
        Self {
            factory: Arc::new(factory),
            ready: Arc::new(OnceLock::new()),
            pending: Mutex::new(None),
        }
    }

    /// Returns the shared initialization future, starting construction on the first call.
    pub fn get_highlighter(&self) -> HighlighterFuture<H> {
        let mut pending = self.pending();
        if let Some(fut) = pending.as_ref() {
            return fut.clone();
        }
        let fut = self.start().shared();
        *pending = Some(fut.clone());
        fut
    }

    pub fn is_ready(&self) -> bool {
        self.ready.get().is_some()
    }

    /// The engine, once construction has finished successfully.
    pub fn ready(&self) -> Option<Arc<H>> {
        self.ready.get().cloned()
    }

    pub fn loaded_languages(&self) -> Option<LanguageSet> {
        self.ready.get().map(|h| h.loaded_languages().clone())
    }

    /// Forgets a failed initialization so the next `get_highlighter` tries again.
    ///
    /// Returns `false` (and changes nothing) while construction is running or once it succeeded.
    pub fn reset(&self) -> bool {
        if self.is_ready() {
            return false;
        }
        let mut pending = self.pending();
        let failed = matches!(
            pending.as_ref().and_then(|fut| fut.peek()),
            Some(Err(_))
        );
        if failed {
            debug!("resetting failed highlighter init");
            *pending = None;
        }
        failed
    }

    fn start(&self) -> BoxFuture<'static, InitResult<H>> {
        debug!("starting highlighter init");
        let (tx, rx) = oneshot::channel::<InitResult<H>>();
        let factory = self.factory.clone();
        let ready = self.ready.clone();

        let spawned = thread::Builder::new()
            .name("highlighter-init".to_string())
            .spawn(move || {
                let result = factory().map(Arc::new);
                match &result {
                    Ok(highlighter) => {
                        let _ = ready.set(highlighter.clone());
                        debug!(
                            languages = highlighter.loaded_languages().len(),
                            "highlighter ready"
                        );
                    }
                    Err(e) => error!("highlighter init failed: {e}"),
                }
                let _ = tx.send(result);
            });

        match spawned {
            Ok(_) => async move {
                match rx.await {
                    Ok(result) => result,
                    Err(_) => Err(HighlightError::InitCanceled),
                }
            }
            .boxed(),
            Err(e) => {
                error!("failed to spawn highlighter init thread: {e}");
                future::ready(Err(HighlightError::Spawn(e.to_string()))).boxed()
            }
        }
    }

    fn pending(&self) -> MutexGuard<'_, Option<HighlighterFuture<H>>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

static GLOBAL: LazyLock<HighlighterManager> =
    LazyLock::new(|| HighlighterManager::with_config(HighlighterConfig::default()));

/// The process-wide highlighter manager, using the default configuration.
pub fn global() -> &'static HighlighterManager {
    &GLOBAL
}

/// Shorthand for `global().get_highlighter()`.
pub fn get_highlighter() -> HighlighterFuture {
    GLOBAL.get_highlighter()
}
