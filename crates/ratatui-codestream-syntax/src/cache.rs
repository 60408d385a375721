use std::sync::Mutex;
use std::sync::MutexGuard;

use indexmap::IndexMap;
use ratatui_codestream_core::text::HighlightedLines;
use ratatui_codestream_core::theme::CodeTheme;
use tracing::trace;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    code: String,
    language: String,
    theme: CodeTheme,
}

/// Bounded least-recently-used cache keyed by the exact `(code, language, theme)` triple.
pub struct HighlightCache {
    capacity: usize,
    entries: Mutex<IndexMap<CacheKey, HighlightedLines>>,
}

impl HighlightCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(IndexMap::with_capacity(capacity.min(1024))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, code: &str, language: &str, theme: CodeTheme) -> Option<HighlightedLines> {
        let key = CacheKey {
            code: code.to_string(),
            language: language.to_string(),
            theme,
        };
        let mut entries = self.entries();
        let (idx, _, value) = entries.get_full(&key)?;
        let value = value.clone();
        let last = entries.len() - 1;
        entries.move_index(idx, last);
        Some(value)
    }

    pub fn insert(&self, code: &str, language: &str, theme: CodeTheme, value: HighlightedLines) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries();
        while entries.len() >= self.capacity {
            if entries.shift_remove_index(0).is_some() {
                trace!(capacity = self.capacity, "evicted highlight cache entry");
            }
        }
        entries.insert(
            CacheKey {
                code: code.to_string(),
                language: language.to_string(),
                theme,
            },
            value,
        );
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    fn entries(&self) -> MutexGuard<'_, IndexMap<CacheKey, HighlightedLines>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
