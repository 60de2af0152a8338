//! Policy source: which subsystems participate in sleep mode.

use crate::error::CapabilityError;
use crate::subsystems::{InterruptionFilter, RingerMode, SubsystemId};

/// Supplies the per-subsystem participation flags and the ringer selector.
///
/// The engine reads policy fresh on every activation and deactivation, so
/// implementations should reflect the current externally stored values
/// rather than cache them. A read failure is treated as "does not
/// participate" for that subsystem.
pub trait PolicySource: Send + Sync {
    /// Whether `id` participates in the next transition.
    fn participates(&self, id: SubsystemId) -> Result<bool, CapabilityError>;

    /// The ringer behavior selected for sleep mode.
    fn ringer_behavior(&self) -> Result<RingerBehavior, CapabilityError>;
}

/// The policy-selected ringer behavior while sleep mode is active.
///
/// Stored externally as an integer selector; `0` means the ringer pair is
/// left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RingerBehavior {
    /// Ringer pair does not participate.
    #[default]
    Untouched,
    /// Vibrate, interruptions unfiltered.
    Vibrate,
    /// Audible ring, priority interruptions only.
    PriorityOnly,
    /// Silent, interruptions unfiltered.
    Silent,
}

impl RingerBehavior {
    /// Map the raw stored selector (0-3) to a behavior.
    ///
    /// Out-of-range selectors fall back to [`RingerBehavior::Untouched`].
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Vibrate,
            2 => Self::PriorityOnly,
            3 => Self::Silent,
            _ => Self::Untouched,
        }
    }

    /// The (ringer mode, interruption filter) pair this behavior applies,
    /// or `None` when the ringer pair is left untouched.
    pub fn targets(self) -> Option<(RingerMode, InterruptionFilter)> {
        match self {
            Self::Untouched => None,
            Self::Vibrate => Some((RingerMode::Vibrate, InterruptionFilter::Off)),
            Self::PriorityOnly => Some((RingerMode::Normal, InterruptionFilter::PriorityOnly)),
            Self::Silent => Some((RingerMode::Silent, InterruptionFilter::Off)),
        }
    }
}
