use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// One category of staleness an entity can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsistencyState {
    Enabled,
    Container,
    Bounds,
    ZIndex,
    Appearance,
    PixelBounds,
    Data,
    SeriesPoints,
    SeriesHatchFill,
    SeriesMarkers,
    SeriesLabels,
    SeriesColor,
    SeriesClip,
    AxisTitle,
    AxisLabels,
    AxisTicks,
    AxisOverlap,
    ScaleRecalculation,
    ChartSeries,
    ChartAxes,
    MarkerLayout,
}

impl ConsistencyState {
    /// Draw pass resolution order shared by every visual entity.
    pub const DRAW_ORDER: [Self; 5] = [
        Self::Appearance,
        Self::Container,
        Self::ZIndex,
        Self::Bounds,
        Self::PixelBounds,
    ];

    const fn bit(self) -> u32 {
        match self {
            Self::Enabled => 1 << 0,
            Self::Container => 1 << 1,
            Self::Bounds => 1 << 2,
            Self::ZIndex => 1 << 3,
            Self::Appearance => 1 << 4,
            Self::PixelBounds => 1 << 5,
            Self::Data => 1 << 6,
            Self::SeriesPoints => 1 << 7,
            Self::SeriesHatchFill => 1 << 8,
            Self::SeriesMarkers => 1 << 9,
            Self::SeriesLabels => 1 << 10,
            Self::SeriesColor => 1 << 11,
            Self::SeriesClip => 1 << 12,
            Self::AxisTitle => 1 << 13,
            Self::AxisLabels => 1 << 14,
            Self::AxisTicks => 1 << 15,
            Self::AxisOverlap => 1 << 16,
            Self::ScaleRecalculation => 1 << 17,
            Self::ChartSeries => 1 << 18,
            Self::ChartAxes => 1 << 19,
            Self::MarkerLayout => 1 << 20,
        }
    }
}

/// Bitmask of [`ConsistencyState`] values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct StateMask {
    bits: u32,
}

impl StateMask {
    /// States every visual entity supports.
    pub const VISUAL: Self = Self::none()
        .with(ConsistencyState::Enabled)
        .with(ConsistencyState::Container)
        .with(ConsistencyState::Bounds)
        .with(ConsistencyState::ZIndex)
        .with(ConsistencyState::Appearance)
        .with(ConsistencyState::PixelBounds);

    #[must_use]
    pub const fn none() -> Self {
        Self { bits: 0 }
    }

    #[must_use]
    pub const fn from_state(state: ConsistencyState) -> Self {
        Self { bits: state.bit() }
    }

    #[must_use]
    pub const fn with(self, state: ConsistencyState) -> Self {
        Self {
            bits: self.bits | state.bit(),
        }
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }

    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self {
            bits: self.bits & !other.bits,
        }
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.bits & other.bits) != 0
    }

    #[must_use]
    pub const fn contains_state(self, state: ConsistencyState) -> bool {
        (self.bits & state.bit()) != 0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.bits == 0
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.bits
    }
}

impl From<ConsistencyState> for StateMask {
    fn from(state: ConsistencyState) -> Self {
        Self::from_state(state)
    }
}

impl BitOr for StateMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOr<ConsistencyState> for StateMask {
    type Output = Self;

    fn bitor(self, rhs: ConsistencyState) -> Self {
        self.with(rhs)
    }
}

impl BitOr for ConsistencyState {
    type Output = StateMask;

    fn bitor(self, rhs: Self) -> StateMask {
        StateMask::from_state(self).with(rhs)
    }
}

impl BitOrAssign for StateMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}

impl BitOrAssign<ConsistencyState> for StateMask {
    fn bitor_assign(&mut self, rhs: ConsistencyState) {
        *self = self.with(rhs);
    }
}

impl fmt::Debug for StateMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateMask({:#x})", self.bits)
    }
}

/// Notification category dispatched to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    NeedsRedraw,
    NeedsReapplication,
    NeedsRecalculation,
    BoundsChanged,
    DataChanged,
    MetaChanged,
    NeedsRedrawLabels,
    NeedsRedrawAppearance,
    NeedsUpdateMarkers,
    EnabledStateChanged,
}

impl Signal {
    const fn bit(self) -> u16 {
        match self {
            Self::NeedsRedraw => 1 << 0,
            Self::NeedsReapplication => 1 << 1,
            Self::NeedsRecalculation => 1 << 2,
            Self::BoundsChanged => 1 << 3,
            Self::DataChanged => 1 << 4,
            Self::MetaChanged => 1 << 5,
            Self::NeedsRedrawLabels => 1 << 6,
            Self::NeedsRedrawAppearance => 1 << 7,
            Self::NeedsUpdateMarkers => 1 << 8,
            Self::EnabledStateChanged => 1 << 9,
        }
    }
}

/// Bitmask of [`Signal`] values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SignalMask {
    bits: u16,
}

impl SignalMask {
    const ALL_BITS: u16 = Signal::NeedsRedraw.bit()
        | Signal::NeedsReapplication.bit()
        | Signal::NeedsRecalculation.bit()
        | Signal::BoundsChanged.bit()
        | Signal::DataChanged.bit()
        | Signal::MetaChanged.bit()
        | Signal::NeedsRedrawLabels.bit()
        | Signal::NeedsRedrawAppearance.bit()
        | Signal::NeedsUpdateMarkers.bit()
        | Signal::EnabledStateChanged.bit();

    #[must_use]
    pub const fn none() -> Self {
        Self { bits: 0 }
    }

    #[must_use]
    pub const fn all() -> Self {
        Self {
            bits: Self::ALL_BITS,
        }
    }

    #[must_use]
    pub const fn from_signal(signal: Signal) -> Self {
        Self { bits: signal.bit() }
    }

    #[must_use]
    pub const fn with(self, signal: Signal) -> Self {
        Self {
            bits: self.bits | signal.bit(),
        }
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.bits & other.bits) != 0
    }

    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self {
            bits: self.bits & !other.bits,
        }
    }

    #[must_use]
    pub const fn contains_signal(self, signal: Signal) -> bool {
        (self.bits & signal.bit()) != 0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.bits == 0
    }

    #[must_use]
    pub const fn bits(self) -> u16 {
        self.bits
    }
}

impl From<Signal> for SignalMask {
    fn from(signal: Signal) -> Self {
        Self::from_signal(signal)
    }
}

impl BitOr for SignalMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOr<Signal> for SignalMask {
    type Output = Self;

    fn bitor(self, rhs: Signal) -> Self {
        self.with(rhs)
    }
}

impl BitOr for Signal {
    type Output = SignalMask;

    fn bitor(self, rhs: Self) -> SignalMask {
        SignalMask::from_signal(self).with(rhs)
    }
}

impl BitOrAssign for SignalMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}

impl BitOrAssign<Signal> for SignalMask {
    fn bitor_assign(&mut self, rhs: Signal) {
        *self = self.with(rhs);
    }
}

impl fmt::Debug for SignalMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignalMask({:#x})", self.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_mask_difference_clears_only_requested_bits() {
        let mask = ConsistencyState::Bounds | ConsistencyState::Appearance;
        let cleared = mask.difference(StateMask::from_state(ConsistencyState::Bounds));
        assert!(!cleared.contains_state(ConsistencyState::Bounds));
        assert!(cleared.contains_state(ConsistencyState::Appearance));
    }

    #[test]
    fn visual_states_cover_draw_order() {
        for state in ConsistencyState::DRAW_ORDER {
            assert!(StateMask::VISUAL.contains_state(state));
        }
    }

    #[test]
    fn signal_union_is_idempotent() {
        let redraw = SignalMask::from_signal(Signal::NeedsRedraw);
        assert_eq!(redraw.union(redraw), redraw);
        assert!(SignalMask::all().contains_signal(Signal::EnabledStateChanged));
    }

    #[test]
    fn or_assign_accepts_single_members() {
        let mut states = StateMask::none();
        states |= ConsistencyState::Bounds;
        states |= ConsistencyState::Bounds | ConsistencyState::ZIndex;
        assert_eq!(states, ConsistencyState::Bounds | ConsistencyState::ZIndex);

        let mut signals = SignalMask::none();
        signals |= Signal::DataChanged;
        assert_eq!(signals, SignalMask::from_signal(Signal::DataChanged));
    }
}
