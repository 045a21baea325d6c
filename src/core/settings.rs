//! Declarative settings schema.
//!
//! Each setting is declared once with its type, default, normalizer and the
//! states/signals a change triggers. [`settings_schema!`] expands that table
//! into a typed, serde-enabled struct with getters, invalidating setters and a
//! static descriptor table.

use crate::core::states::{SignalMask, StateMask};

/// Invalidation policy of one declared setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingDescriptor {
    pub name: &'static str,
    pub states: StateMask,
    pub signals: SignalMask,
}

/// Non-negative, finite normalizer used by width-like settings.
#[must_use]
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Clamps a ratio into `[0, 1]`, treating NaN as 0.
#[must_use]
pub fn unit_ratio(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

macro_rules! settings_schema {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident / $setter:ident : $ty:ty = $default:expr,
                    normalize = $normalize:expr,
                    states = [$($state:ident),* $(,)?],
                    signals = [$($signal:ident),* $(,)?];
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field: $ty,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $($field: $default,)*
                }
            }
        }

        impl $name {
            pub const DESCRIPTORS: &'static [$crate::core::settings::SettingDescriptor] = &[
                $(
                    $crate::core::settings::SettingDescriptor {
                        name: stringify!($field),
                        states: $crate::core::states::StateMask::none()
                            $(.with($crate::core::states::ConsistencyState::$state))*,
                        signals: $crate::core::states::SignalMask::none()
                            $(.with($crate::core::states::Signal::$signal))*,
                    },
                )*
            ];

            #[must_use]
            pub fn descriptor(name: &str) -> Option<&'static $crate::core::settings::SettingDescriptor> {
                Self::DESCRIPTORS.iter().find(|descriptor| descriptor.name == name)
            }

            $(
                #[must_use]
                pub fn $field(&self) -> $ty {
                    self.$field.clone()
                }

                /// Stores the normalized value and invalidates `core` when it changed.
                pub fn $setter(
                    &mut self,
                    core: &$crate::core::stateful::StatefulCore,
                    value: $ty,
                ) -> bool {
                    let normalize: fn($ty) -> $ty = $normalize;
                    let value = normalize(value);
                    if self.$field == value {
                        return false;
                    }
                    self.$field = value;
                    core.invalidate(
                        $crate::core::states::StateMask::none()
                            $(.with($crate::core::states::ConsistencyState::$state))*,
                        $crate::core::states::SignalMask::none()
                            $(.with($crate::core::states::Signal::$signal))*,
                    );
                    true
                }
            )*
        }
    };
}

pub(crate) use settings_schema;

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::core::stateful::StatefulCore;
    use crate::core::states::{ConsistencyState, Signal, SignalMask, StateMask};

    use super::{non_negative, settings_schema};

    settings_schema! {
        struct ProbeSettings {
            thickness / set_thickness: f64 = 1.0,
                normalize = non_negative,
                states = [Appearance],
                signals = [NeedsRedraw];
            enabled / set_enabled: bool = true,
                normalize = std::convert::identity,
                states = [Enabled, Bounds],
                signals = [NeedsRedraw, BoundsChanged];
        }
    }

    #[test]
    fn descriptors_follow_declaration() {
        let descriptor = ProbeSettings::descriptor("enabled").expect("declared setting");
        assert_eq!(descriptor.states, ConsistencyState::Enabled | ConsistencyState::Bounds);
        assert_eq!(descriptor.signals, Signal::NeedsRedraw | Signal::BoundsChanged);
        assert_eq!(ProbeSettings::DESCRIPTORS.len(), 2);
    }

    #[test]
    fn setter_normalizes_and_skips_unchanged_values() {
        let core = StatefulCore::new("sample", StateMask::VISUAL, SignalMask::all());
        core.mark_consistent(StateMask::VISUAL);
        let calls = Rc::new(Cell::new(0_u32));
        let counter = Rc::clone(&calls);
        core.listen_signals(SignalMask::all(), move |_| counter.set(counter.get() + 1));

        let mut settings = ProbeSettings::default();
        assert!(settings.set_thickness(&core, -3.0));
        assert_eq!(settings.thickness(), 0.0);
        assert!(!settings.set_thickness(&core, -1.0));
        assert_eq!(calls.get(), 1);
        assert!(core.has_invalidation_state(ConsistencyState::Appearance));
    }
}
