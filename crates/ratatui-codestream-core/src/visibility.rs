//! Visibility gating for lazily highlighted blocks.
//!
//! A [`VisibilityGate`] starts `Armed` and flips to `Visible` the first time its block enters the
//! viewport (extended by a root margin so highlighting lands before the block scrolls in). The
//! transition is one-way; the gate releases its observer as soon as it fires and again on drop.
//!
//! The environment is injected through [`VisibilityEnvironment`]. Hosts without viewport tracking
//! use [`NoVisibilityTracking`], which makes every gate visible immediately.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::Weak;

use crossbeam_channel as chan;
use serde::Deserialize;
use tracing::debug;
use tracing::trace;

use crate::viewport::RowSpan;
use crate::viewport::ViewportState;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ObserverOptions {
    /// Rows added above and below the viewport before testing intersection.
    pub root_margin: u16,
    /// Fraction of the target (or of the extended viewport, for targets taller than it) that
    /// must intersect.
    pub threshold: f32,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            root_margin: 5,
            threshold: 0.01,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionEntry {
    pub target: RowSpan,
    pub is_intersecting: bool,
    pub intersection_ratio: f32,
}

/// Observes a single target and queues intersection records for it.
pub trait IntersectionObserver: Send {
    /// Starts (or moves) observation of `target`.
    fn observe(&mut self, target: RowSpan);

    fn unobserve(&mut self);

    /// Drains queued records without blocking.
    fn take_records(&mut self) -> Vec<IntersectionEntry>;

    /// Releases the observer's registration. Safe to call more than once.
    fn disconnect(&mut self);
}

pub trait VisibilityEnvironment {
    /// Returns `None` when the environment cannot track visibility.
    fn intersection_observer(
        &self,
        options: ObserverOptions,
    ) -> Option<Box<dyn IntersectionObserver>>;
}

/// Environment for hosts that cannot report visibility.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoVisibilityTracking;

impl VisibilityEnvironment for NoVisibilityTracking {
    fn intersection_observer(
        &self,
        _options: ObserverOptions,
    ) -> Option<Box<dyn IntersectionObserver>> {
        None
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    observers: HashMap<u64, Registration>,
}

struct Registration {
    options: ObserverOptions,
    target: Option<RowSpan>,
    last_intersecting: Option<bool>,
    tx: chan::Sender<IntersectionEntry>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Viewport-backed [`VisibilityEnvironment`].
///
/// Call [`ViewportIntersector::notify`] after every scroll or layout change. Each observer gets a
/// record whenever its target's intersecting state changes (and once right after `observe`).
#[derive(Clone, Default)]
pub struct ViewportIntersector {
    registry: Arc<Mutex<Registry>>,
}

impl ViewportIntersector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues records for every observed target against `viewport`. Returns how many were queued.
    pub fn notify(&self, viewport: &ViewportState) -> usize {
        let mut registry = lock(&self.registry);
        let mut queued = 0usize;
        for reg in registry.observers.values_mut() {
            let Some(target) = reg.target else {
                continue;
            };
            let window = viewport.visible_rows_with_margin(reg.options.root_margin);
            let ratio = target.intersection_ratio(window);
            let coverage = target.coverage(window);
            let is_intersecting = coverage > 0.0 && coverage >= reg.options.threshold;
            if reg.last_intersecting == Some(is_intersecting) {
                continue;
            }
            reg.last_intersecting = Some(is_intersecting);
            let entry = IntersectionEntry {
                target,
                is_intersecting,
                intersection_ratio: ratio,
            };
            if reg.tx.send(entry).is_ok() {
                queued += 1;
            }
        }
        queued
    }

    /// Number of observers that have not been disconnected.
    pub fn active_observers(&self) -> usize {
        lock(&self.registry).observers.len()
    }

    /// Number of observers currently watching a target.
    pub fn observed_targets(&self) -> usize {
        lock(&self.registry)
            .observers
            .values()
            .filter(|r| r.target.is_some())
            .count()
    }
}

impl VisibilityEnvironment for ViewportIntersector {
    fn intersection_observer(
        &self,
        options: ObserverOptions,
    ) -> Option<Box<dyn IntersectionObserver>> {
        let (tx, rx) = chan::unbounded();
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id = registry.next_id.wrapping_add(1);
        registry.observers.insert(
            id,
            Registration {
                options,
                target: None,
                last_intersecting: None,
                tx,
            },
        );
        Some(Box::new(ChannelObserver {
            id,
            registry: Arc::downgrade(&self.registry),
            rx,
        }))
    }
}

struct ChannelObserver {
    id: u64,
    registry: Weak<Mutex<Registry>>,
    rx: chan::Receiver<IntersectionEntry>,
}

impl ChannelObserver {
    fn with_registration(&self, f: impl FnOnce(&mut Registration)) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        if let Some(reg) = lock(&registry).observers.get_mut(&self.id) {
            f(reg);
        }
    }
}

impl IntersectionObserver for ChannelObserver {
    fn observe(&mut self, target: RowSpan) {
        self.with_registration(|reg| {
            reg.target = Some(target);
            reg.last_intersecting = None;
        });
    }

    fn unobserve(&mut self) {
        self.with_registration(|reg| {
            reg.target = None;
            reg.last_intersecting = None;
        });
    }

    fn take_records(&mut self) -> Vec<IntersectionEntry> {
        self.rx.try_iter().collect()
    }

    fn disconnect(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        lock(&registry).observers.remove(&self.id);
    }
}

impl Drop for ChannelObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    Armed,
    Visible,
}

/// One-shot visibility signal for a single rendered block.
pub struct VisibilityGate {
    state: GateState,
    observer: Option<Box<dyn IntersectionObserver>>,
    target: Option<RowSpan>,
}

impl VisibilityGate {
    pub fn arm(env: &dyn VisibilityEnvironment, options: ObserverOptions) -> Self {
        match env.intersection_observer(options) {
            Some(observer) => Self {
                state: GateState::Armed,
                observer: Some(observer),
                target: None,
            },
            None => {
                debug!("visibility tracking unavailable, gate starts visible");
                Self::visible()
            }
        }
    }

    pub fn visible() -> Self {
        Self {
            state: GateState::Visible,
            observer: None,
            target: None,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == GateState::Visible
    }

    /// Points the gate at the rows its block currently occupies. No-op once visible.
    pub fn attach(&mut self, target: RowSpan) {
        if self.is_visible() || self.target == Some(target) {
            return;
        }
        let Some(observer) = self.observer.as_mut() else {
            return;
        };
        observer.observe(target);
        self.target = Some(target);
    }

    /// Stops observing the current rows, e.g. while the block renders nothing. The gate stays
    /// armed; a later [`VisibilityGate::attach`] observes again.
    pub fn detach(&mut self) {
        if self.target.take().is_none() {
            return;
        }
        if let Some(observer) = self.observer.as_mut() {
            observer.unobserve();
        }
    }

    /// Drains queued records. Returns `true` only on the call that makes the gate visible.
    pub fn poll(&mut self) -> bool {
        let Some(observer) = self.observer.as_mut() else {
            return false;
        };
        let records = observer.take_records();
        let Some(entry) = records.iter().find(|e| e.is_intersecting) else {
            return false;
        };
        trace!(
            top = entry.target.top,
            ratio = entry.intersection_ratio,
            "code block became visible"
        );
        self.state = GateState::Visible;
        self.release();
        true
    }

    fn release(&mut self) {
        let Some(mut observer) = self.observer.take() else {
            return;
        };
        if self.target.take().is_some() {
            observer.unobserve();
        }
        observer.disconnect();
    }
}

impl Drop for VisibilityGate {
    fn drop(&mut self) {
        self.release();
    }
}
