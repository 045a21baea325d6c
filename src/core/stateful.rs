//! Shared invalidation core composed into every stateful entity.
//!
//! A [`StatefulCore`] is a cheap `Rc` handle. Entities own one and hand
//! clones to listeners, so a listener can re-invalidate an entity while the
//! entity is dispatching without borrowing the entity itself.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::consistency::{Consistency, PendingSignals, supported_signals};
use crate::core::states::{Signal, SignalMask, StateMask};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a stateful entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Handle returned by [`StatefulCore::listen_signals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey(u64);

/// Event delivered to signal listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalEvent {
    pub source: EntityId,
    pub signals: SignalMask,
}

impl SignalEvent {
    #[must_use]
    pub const fn has_signal(&self, signal: Signal) -> bool {
        self.signals.contains_signal(signal)
    }

    #[must_use]
    pub const fn needs_redraw(&self) -> bool {
        self.has_signal(Signal::NeedsRedraw)
    }

    #[must_use]
    pub const fn bounds_changed(&self) -> bool {
        self.has_signal(Signal::BoundsChanged)
    }

    #[must_use]
    pub const fn data_changed(&self) -> bool {
        self.has_signal(Signal::DataChanged)
    }

    #[must_use]
    pub const fn needs_reapplication(&self) -> bool {
        self.has_signal(Signal::NeedsReapplication)
    }

    #[must_use]
    pub const fn needs_recalculation(&self) -> bool {
        self.has_signal(Signal::NeedsRecalculation)
    }
}

type ListenerCallback = Rc<dyn Fn(&SignalEvent)>;

struct ListenerEntry {
    key: ListenerKey,
    filter: SignalMask,
    callback: ListenerCallback,
}

struct CoreInner {
    id: EntityId,
    kind: &'static str,
    supported_signals: SignalMask,
    consistency: Cell<Consistency>,
    suspension: Cell<PendingSignals>,
    listeners: RefCell<Vec<ListenerEntry>>,
    next_listener: Cell<u64>,
    dispatching: Cell<bool>,
    delivered: Cell<SignalMask>,
    follow_up: Cell<SignalMask>,
}

/// Dirty-state mask, suspension state and listener list of one entity.
#[derive(Clone)]
pub struct StatefulCore {
    inner: Rc<CoreInner>,
}

impl StatefulCore {
    #[must_use]
    pub fn new(kind: &'static str, supported_states: StateMask, supported_signals: SignalMask) -> Self {
        Self {
            inner: Rc::new(CoreInner {
                id: EntityId::next(),
                kind,
                supported_signals,
                consistency: Cell::new(Consistency::new(supported_states)),
                suspension: Cell::new(PendingSignals::idle()),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(1),
                dispatching: Cell::new(false),
                delivered: Cell::new(SignalMask::none()),
                follow_up: Cell::new(SignalMask::none()),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.inner.id
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.inner.kind
    }

    #[must_use]
    pub fn supported_states(&self) -> StateMask {
        self.inner.consistency.get().supported()
    }

    #[must_use]
    pub fn supported_signals(&self) -> SignalMask {
        self.inner.supported_signals
    }

    #[must_use]
    pub fn consistency(&self) -> Consistency {
        self.inner.consistency.get()
    }

    /// Marks `states` dirty and dispatches `signals`.
    ///
    /// Returns the states that were not dirty before the call. A request made
    /// from inside one of this entity's listeners that sets no new state is
    /// dropped instead of being dispatched again.
    pub fn invalidate(
        &self,
        states: impl Into<StateMask>,
        signals: impl Into<SignalMask>,
    ) -> StateMask {
        let mut consistency = self.inner.consistency.get();
        let effective = consistency.invalidate(states.into());
        self.inner.consistency.set(consistency);

        if self.inner.dispatching.get() && effective.is_none() {
            trace!(entity = self.inner.kind, "re-entrant invalidation dropped");
            return effective;
        }
        self.dispatch_signal(signals);
        effective
    }

    pub fn mark_consistent(&self, states: impl Into<StateMask>) {
        let mut consistency = self.inner.consistency.get();
        consistency.mark_consistent(states.into());
        self.inner.consistency.set(consistency);
    }

    #[must_use]
    pub fn has_invalidation_state(&self, states: impl Into<StateMask>) -> bool {
        self.inner.consistency.get().has_invalidation_state(states.into())
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.inner.consistency.get().is_consistent()
    }

    /// Dispatches `signals` without touching the dirty mask.
    pub fn dispatch_signal(&self, signals: impl Into<SignalMask>) {
        self.dispatch(signals.into(), false);
    }

    /// Dispatches `signals` even while suspended.
    pub fn force_dispatch_signal(&self, signals: impl Into<SignalMask>) {
        self.dispatch(signals.into(), true);
    }

    fn dispatch(&self, signals: SignalMask, force: bool) {
        let signals = supported_signals(signals, self.inner.supported_signals);
        if signals.is_none() {
            return;
        }

        let suspension = self.inner.suspension.get();
        if suspension.is_suspended() && !force {
            self.inner.suspension.set(suspension.defer(signals));
            return;
        }

        if self.inner.dispatching.get() {
            let fresh = signals.difference(self.inner.delivered.get());
            self.inner
                .follow_up
                .set(self.inner.follow_up.get().union(fresh));
            return;
        }

        self.run_dispatch(signals);
    }

    fn run_dispatch(&self, signals: SignalMask) {
        let _guard = DispatchGuard::enter(&self.inner);
        let mut current = signals;
        loop {
            self.inner
                .delivered
                .set(self.inner.delivered.get().union(current));
            let event = SignalEvent {
                source: self.inner.id,
                signals: current,
            };
            let targets: Vec<ListenerCallback> = self
                .inner
                .listeners
                .borrow()
                .iter()
                .filter(|entry| entry.filter.intersects(current))
                .map(|entry| Rc::clone(&entry.callback))
                .collect();
            trace!(
                entity = self.inner.kind,
                signals = current.bits(),
                listeners = targets.len(),
                "dispatch signal"
            );
            for callback in targets {
                callback(&event);
            }

            current = self.inner.follow_up.replace(SignalMask::none());
            if current.is_none() {
                break;
            }
        }
    }

    #[must_use]
    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatching.get()
    }

    #[must_use]
    pub fn suspension(&self) -> PendingSignals {
        self.inner.suspension.get()
    }

    pub fn suspend_dispatching(&self) {
        self.inner
            .suspension
            .set(self.inner.suspension.get().suspend());
    }

    /// Leaves one suspension level, dispatching the coalesced union once on
    /// the transition to zero when `dispatch_pending` is set.
    pub fn resume_dispatching(&self, dispatch_pending: bool) {
        let (next, released) = self.inner.suspension.get().resume(dispatch_pending);
        self.inner.suspension.set(next);
        if let Some(signals) = released {
            self.dispatch(signals, false);
        }
    }

    /// Suspends dispatching until the returned guard is dropped.
    #[must_use]
    pub fn suspended(&self) -> SuspendGuard {
        self.suspend_dispatching();
        SuspendGuard { core: self.clone() }
    }

    pub fn listen_signals<F>(&self, filter: impl Into<SignalMask>, callback: F) -> ListenerKey
    where
        F: Fn(&SignalEvent) + 'static,
    {
        let key = ListenerKey(self.inner.next_listener.get());
        self.inner.next_listener.set(key.0 + 1);
        self.inner.listeners.borrow_mut().push(ListenerEntry {
            key,
            filter: filter.into(),
            callback: Rc::new(callback),
        });
        key
    }

    pub fn unlisten_signals(&self, key: ListenerKey) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|entry| entry.key != key);
        listeners.len() != before
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Detaches every listener.
    pub fn dispose(&self) {
        self.inner.listeners.borrow_mut().clear();
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakStatefulCore {
        WeakStatefulCore {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl fmt::Debug for StatefulCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatefulCore")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("consistency", &self.inner.consistency.get())
            .field("suspension", &self.inner.suspension.get())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Non-owning core handle for listeners that must not keep an entity alive.
#[derive(Clone)]
pub struct WeakStatefulCore {
    inner: Weak<CoreInner>,
}

impl WeakStatefulCore {
    #[must_use]
    pub fn upgrade(&self) -> Option<StatefulCore> {
        self.inner.upgrade().map(|inner| StatefulCore { inner })
    }
}

impl fmt::Debug for WeakStatefulCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakStatefulCore")
    }
}

/// Resumes dispatching with pending signals when dropped.
#[must_use = "dispatching resumes as soon as the guard is dropped"]
pub struct SuspendGuard {
    core: StatefulCore,
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        self.core.resume_dispatching(true);
    }
}

struct DispatchGuard<'a> {
    inner: &'a CoreInner,
}

impl<'a> DispatchGuard<'a> {
    fn enter(inner: &'a CoreInner) -> Self {
        inner.dispatching.set(true);
        Self { inner }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.inner.dispatching.set(false);
        self.inner.delivered.set(SignalMask::none());
        self.inner.follow_up.set(SignalMask::none());
    }
}

/// Suspends every core in `cores`.
pub fn suspend_all(cores: &[&StatefulCore]) {
    for core in cores {
        core.suspend_dispatching();
    }
}

/// Resumes every core in `cores` in reverse order, dispatching pending signals.
pub fn resume_all(cores: &[&StatefulCore]) {
    for core in cores.iter().rev() {
        core.resume_dispatching(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::states::ConsistencyState;

    fn bounds_core() -> StatefulCore {
        let core = StatefulCore::new(
            "test",
            ConsistencyState::Bounds | ConsistencyState::Appearance,
            SignalMask::all(),
        );
        core.mark_consistent(StateMask::VISUAL);
        core
    }

    #[test]
    fn self_listener_reinvalidation_terminates() {
        let core = bounds_core();
        let calls = Rc::new(Cell::new(0_u32));
        let handle = core.downgrade();
        let counter = Rc::clone(&calls);
        core.listen_signals(SignalMask::all(), move |_| {
            counter.set(counter.get() + 1);
            if let Some(core) = handle.upgrade() {
                core.invalidate(ConsistencyState::Bounds, Signal::NeedsRedraw);
            }
        });

        core.invalidate(ConsistencyState::Bounds, Signal::NeedsRedraw);
        assert_eq!(calls.get(), 1);
        assert!(!core.is_dispatching());
    }

    #[test]
    fn nested_new_signal_is_delivered_as_follow_up() {
        let core = bounds_core();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let handle = core.downgrade();
        let log = Rc::clone(&seen);
        core.listen_signals(SignalMask::all(), move |event| {
            log.borrow_mut().push(event.signals);
            if let Some(core) = handle.upgrade() {
                core.invalidate(ConsistencyState::Appearance, Signal::BoundsChanged);
            }
        });

        core.invalidate(ConsistencyState::Bounds, Signal::NeedsRedraw);
        assert_eq!(
            *seen.borrow(),
            vec![
                SignalMask::from_signal(Signal::NeedsRedraw),
                SignalMask::from_signal(Signal::BoundsChanged),
            ]
        );
    }

    #[test]
    fn forced_dispatch_ignores_suspension() {
        let core = bounds_core();
        let calls = Rc::new(Cell::new(0_u32));
        let counter = Rc::clone(&calls);
        core.listen_signals(SignalMask::all(), move |_| counter.set(counter.get() + 1));

        core.suspend_dispatching();
        core.force_dispatch_signal(Signal::MetaChanged);
        assert_eq!(calls.get(), 1);
        core.resume_dispatching(true);
        assert_eq!(calls.get(), 1);
    }
}
