pub mod consistency;
pub mod entity;
pub mod primitives;
pub mod reporting;
pub mod settings;
pub mod stateful;
pub mod states;
pub mod types;

pub use consistency::{Consistency, PendingSignals};
pub use entity::{Boundable, Drawable, Invalidatable};
pub use reporting::{
    ErrorCode, RecordingReporter, Report, Reporter, SharedReporter, TracingReporter, WarningCode,
    default_reporter,
};
pub use settings::SettingDescriptor;
pub use stateful::{
    EntityId, ListenerKey, SignalEvent, StatefulCore, SuspendGuard, WeakStatefulCore, resume_all,
    suspend_all,
};
pub use states::{ConsistencyState, Signal, SignalMask, StateMask};
pub use types::{Point, Rect};
