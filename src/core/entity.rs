//! Capability traits composed by concrete entities.
//!
//! An entity picks only what it needs: scales are `Invalidatable`, series
//! and axes are additionally `Boundable` and `Drawable`.

use crate::core::stateful::{ListenerKey, SignalEvent, StatefulCore};
use crate::core::states::{SignalMask, StateMask};
use crate::core::types::Rect;
use crate::error::ChartResult;
use crate::render::RenderFrame;

/// Delegates the invalidation contract to an owned [`StatefulCore`].
pub trait Invalidatable {
    fn core(&self) -> &StatefulCore;

    fn invalidate(&self, states: impl Into<StateMask>, signals: impl Into<SignalMask>) -> StateMask {
        self.core().invalidate(states, signals)
    }

    fn mark_consistent(&self, states: impl Into<StateMask>) {
        self.core().mark_consistent(states);
    }

    fn has_invalidation_state(&self, states: impl Into<StateMask>) -> bool {
        self.core().has_invalidation_state(states)
    }

    fn is_consistent(&self) -> bool {
        self.core().is_consistent()
    }

    fn suspend_dispatching(&self) {
        self.core().suspend_dispatching();
    }

    fn resume_dispatching(&self, dispatch_pending: bool) {
        self.core().resume_dispatching(dispatch_pending);
    }

    fn listen_signals<F>(&self, filter: impl Into<SignalMask>, callback: F) -> ListenerKey
    where
        F: Fn(&SignalEvent) + 'static,
    {
        self.core().listen_signals(filter, callback)
    }

    fn unlisten_signals(&self, key: ListenerKey) -> bool {
        self.core().unlisten_signals(key)
    }
}

/// Entities laid out inside parent bounds.
pub trait Boundable {
    fn bounds(&self) -> Option<Rect>;

    fn set_bounds(&mut self, bounds: Rect) -> ChartResult<()>;
}

/// Entities that contribute geometry to a render frame.
pub trait Drawable {
    fn draw(&mut self, frame: &mut RenderFrame) -> ChartResult<()>;
}
