use serde::{Deserialize, Serialize};

use crate::core::states::{SignalMask, StateMask};

/// Dirty-state bookkeeping restricted to a fixed set of supported states.
///
/// Pure value type: every operation is a mask transformation with no
/// dispatch side effects, so it can be tested in isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consistency {
    supported: StateMask,
    dirty: StateMask,
}

impl Consistency {
    /// Every supported state starts invalidated.
    #[must_use]
    pub const fn new(supported: StateMask) -> Self {
        Self {
            supported,
            dirty: supported,
        }
    }

    #[must_use]
    pub const fn supported(self) -> StateMask {
        self.supported
    }

    #[must_use]
    pub const fn dirty(self) -> StateMask {
        self.dirty
    }

    /// Marks `states` dirty and returns the bits that were newly set.
    pub fn invalidate(&mut self, states: StateMask) -> StateMask {
        let requested = states.intersection(self.supported);
        let effective = requested.difference(self.dirty);
        self.dirty = self.dirty.union(effective);
        effective
    }

    pub fn mark_consistent(&mut self, states: StateMask) {
        self.dirty = self.dirty.difference(states);
    }

    #[must_use]
    pub const fn has_invalidation_state(self, states: StateMask) -> bool {
        self.dirty.intersects(states.intersection(self.supported))
    }

    #[must_use]
    pub const fn is_consistent(self) -> bool {
        self.dirty.is_none()
    }

    /// Consistent apart from the `allowed` states.
    #[must_use]
    pub const fn is_consistent_except(self, allowed: StateMask) -> bool {
        self.dirty.difference(allowed).is_none()
    }
}

/// Suspension level plus the union of signals deferred while suspended.
///
/// `suspend`, `defer` and `resume` are pure transitions; the caller decides
/// what to do with the coalesced mask handed back by `resume`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PendingSignals {
    level: u32,
    pending: SignalMask,
}

impl PendingSignals {
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            level: 0,
            pending: SignalMask::none(),
        }
    }

    #[must_use]
    pub const fn level(self) -> u32 {
        self.level
    }

    #[must_use]
    pub const fn pending(self) -> SignalMask {
        self.pending
    }

    #[must_use]
    pub const fn is_suspended(self) -> bool {
        self.level > 0
    }

    #[must_use]
    pub const fn suspend(self) -> Self {
        Self {
            level: self.level + 1,
            pending: self.pending,
        }
    }

    /// Accumulates `signals` into the pending union.
    #[must_use]
    pub const fn defer(self, signals: SignalMask) -> Self {
        Self {
            level: self.level,
            pending: self.pending.union(signals),
        }
    }

    /// Leaves one suspension level.
    ///
    /// On the transition to level 0 the pending union is cleared and, when
    /// `dispatch_pending` is set and the union is non-empty, returned for a
    /// single coalesced dispatch. Resuming an idle state is a no-op.
    #[must_use]
    pub const fn resume(self, dispatch_pending: bool) -> (Self, Option<SignalMask>) {
        if self.level == 0 {
            return (self, None);
        }
        if self.level > 1 {
            return (
                Self {
                    level: self.level - 1,
                    pending: self.pending,
                },
                None,
            );
        }
        let released = if dispatch_pending && !self.pending.is_none() {
            Some(self.pending)
        } else {
            None
        };
        (Self::idle(), released)
    }
}

/// Restricts a signal request to what an entity is allowed to emit.
#[must_use]
pub const fn supported_signals(requested: SignalMask, supported: SignalMask) -> SignalMask {
    requested.intersection(supported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::states::{ConsistencyState, Signal};

    #[test]
    fn unsupported_states_are_ignored() {
        let mut consistency = Consistency::new(StateMask::from_state(ConsistencyState::Bounds));
        consistency.mark_consistent(StateMask::VISUAL);
        let effective = consistency.invalidate(StateMask::from_state(ConsistencyState::Data));
        assert!(effective.is_none());
        assert!(consistency.is_consistent());
        assert!(!consistency.has_invalidation_state(StateMask::from_state(ConsistencyState::Data)));
    }

    #[test]
    fn invalidate_returns_only_new_bits() {
        let mut consistency = Consistency::new(StateMask::VISUAL);
        consistency.mark_consistent(StateMask::VISUAL);
        let first = consistency.invalidate(ConsistencyState::Bounds | ConsistencyState::Appearance);
        let second = consistency.invalidate(ConsistencyState::Bounds | ConsistencyState::Container);
        assert_eq!(first, ConsistencyState::Bounds | ConsistencyState::Appearance);
        assert_eq!(second, StateMask::from_state(ConsistencyState::Container));
    }

    #[test]
    fn nested_resume_releases_union_once() {
        let state = PendingSignals::idle()
            .suspend()
            .suspend()
            .defer(SignalMask::from_signal(Signal::NeedsRedraw))
            .defer(SignalMask::from_signal(Signal::BoundsChanged));
        let (state, released) = state.resume(true);
        assert_eq!(released, None);
        assert!(state.is_suspended());
        let (state, released) = state.resume(true);
        assert_eq!(released, Some(Signal::NeedsRedraw | Signal::BoundsChanged));
        assert_eq!(state, PendingSignals::idle());
    }

    #[test]
    fn resume_without_dispatch_drops_pending() {
        let state = PendingSignals::idle()
            .suspend()
            .defer(SignalMask::from_signal(Signal::DataChanged));
        let (state, released) = state.resume(false);
        assert_eq!(released, None);
        assert!(state.pending().is_none());
    }
}
