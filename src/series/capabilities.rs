use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// One behavior a drawer declares to the series that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawerCapability {
    NeedsZero,
    SupportsStack,
    SupportsConnectingMissing,
    SupportsStepDirection,
    IsDiscreteBased,
    IsWidthBased,
    Is3dBased,
    IsLineBased,
    IsOhlcBased,
    IsVertical,
}

impl DrawerCapability {
    const fn bit(self) -> u16 {
        match self {
            Self::NeedsZero => 1 << 0,
            Self::SupportsStack => 1 << 1,
            Self::SupportsConnectingMissing => 1 << 2,
            Self::SupportsStepDirection => 1 << 3,
            Self::IsDiscreteBased => 1 << 4,
            Self::IsWidthBased => 1 << 5,
            Self::Is3dBased => 1 << 6,
            Self::IsLineBased => 1 << 7,
            Self::IsOhlcBased => 1 << 8,
            Self::IsVertical => 1 << 9,
        }
    }
}

/// Bitmask of [`DrawerCapability`] values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DrawerCapabilities {
    bits: u16,
}

impl DrawerCapabilities {
    #[must_use]
    pub const fn none() -> Self {
        Self { bits: 0 }
    }

    #[must_use]
    pub const fn with(self, capability: DrawerCapability) -> Self {
        Self {
            bits: self.bits | capability.bit(),
        }
    }

    #[must_use]
    pub const fn without(self, capability: DrawerCapability) -> Self {
        Self {
            bits: self.bits & !capability.bit(),
        }
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    #[must_use]
    pub const fn contains(self, capability: DrawerCapability) -> bool {
        (self.bits & capability.bit()) != 0
    }

    #[must_use]
    pub const fn bits(self) -> u16 {
        self.bits
    }

    #[must_use]
    pub const fn needs_zero(self) -> bool {
        self.contains(DrawerCapability::NeedsZero)
    }

    #[must_use]
    pub const fn supports_stack(self) -> bool {
        self.contains(DrawerCapability::SupportsStack)
    }

    #[must_use]
    pub const fn supports_connecting_missing(self) -> bool {
        self.contains(DrawerCapability::SupportsConnectingMissing)
    }

    #[must_use]
    pub const fn is_discrete_based(self) -> bool {
        self.contains(DrawerCapability::IsDiscreteBased)
    }

    #[must_use]
    pub const fn is_width_based(self) -> bool {
        self.contains(DrawerCapability::IsWidthBased)
    }

    #[must_use]
    pub const fn is_3d_based(self) -> bool {
        self.contains(DrawerCapability::Is3dBased)
    }
}

impl From<DrawerCapability> for DrawerCapabilities {
    fn from(capability: DrawerCapability) -> Self {
        Self::none().with(capability)
    }
}

impl BitOr for DrawerCapabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOr<DrawerCapability> for DrawerCapabilities {
    type Output = Self;

    fn bitor(self, rhs: DrawerCapability) -> Self {
        self.with(rhs)
    }
}

impl BitOr for DrawerCapability {
    type Output = DrawerCapabilities;

    fn bitor(self, rhs: Self) -> DrawerCapabilities {
        DrawerCapabilities::none().with(self).with(rhs)
    }
}

impl fmt::Debug for DrawerCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DrawerCapabilities({:#x})", self.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_compose_in_const_context() {
        const AREA: DrawerCapabilities = DrawerCapabilities::none()
            .with(DrawerCapability::NeedsZero)
            .with(DrawerCapability::SupportsStack);
        assert!(AREA.needs_zero());
        assert!(AREA.supports_stack());
        assert!(!AREA.is_3d_based());
        assert!(!AREA.without(DrawerCapability::NeedsZero).needs_zero());
        assert_eq!(
            DrawerCapability::NeedsZero | DrawerCapability::SupportsStack,
            AREA
        );
    }
}
