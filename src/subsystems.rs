//! Subsystem identities and capability-provider interfaces.

use crate::error::CapabilityError;

// =============================================================================
// Subsystem Identity
// =============================================================================

/// Identifies one device subsystem the sleep mode may suspend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubsystemId {
    /// Wi-Fi radio power.
    Wifi,
    /// Bluetooth radio power.
    Bluetooth,
    /// Mobile data on the active subscription.
    CellularData,
    /// Positioning service.
    Location,
    /// Always-on display.
    AlwaysOnDisplay,
    /// Aggressive idle/battery management.
    IdleManager,
    /// Extra-dark color adjustment.
    ColorAdjustment,
    /// Alarm scheduling guard.
    AlarmGuard,
    /// Wakelock guard.
    WakelockGuard,
    /// Ringer and interruption-filter pair.
    Ringer,
}

impl SubsystemId {
    /// Human-readable name, used in log output.
    pub fn name(self) -> &'static str {
        match self {
            Self::Wifi => "Wi-Fi",
            Self::Bluetooth => "Bluetooth",
            Self::CellularData => "cellular data",
            Self::Location => "location",
            Self::AlwaysOnDisplay => "always-on display",
            Self::IdleManager => "idle manager",
            Self::ColorAdjustment => "color adjustment",
            Self::AlarmGuard => "alarm guard",
            Self::WakelockGuard => "wakelock guard",
            Self::Ringer => "ringer",
        }
    }
}

impl std::fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Capability Provider Traits
// =============================================================================

/// An on/off subsystem (radios, positioning).
///
/// Both calls may block on a cross-process round trip; callers must not
/// issue them from a context that cannot block.
pub trait Switch: Send + Sync {
    /// Read the current power state.
    fn is_enabled(&self) -> Result<bool, CapabilityError>;

    /// Set the power state.
    fn set_enabled(&self, enabled: bool) -> Result<(), CapabilityError>;
}

/// An integer-valued settings-backed subsystem.
pub trait Setting: Send + Sync {
    /// Read the current value.
    fn get(&self) -> Result<i32, CapabilityError>;

    /// Write a new value.
    fn set(&self, value: i32) -> Result<(), CapabilityError>;
}

/// The ringer/interruption pair.
///
/// The two channels are independent at the provider level but the engine
/// always captures and restores them together; an inconsistent pair leaves
/// the device in a misleading audio state.
pub trait RingerControl: Send + Sync {
    /// Read the current ringer mode.
    fn ringer_mode(&self) -> Result<RingerMode, CapabilityError>;

    /// Set the ringer mode.
    fn set_ringer_mode(&self, mode: RingerMode) -> Result<(), CapabilityError>;

    /// Read the current interruption filter.
    fn interruption_filter(&self) -> Result<InterruptionFilter, CapabilityError>;

    /// Set the interruption filter.
    fn set_interruption_filter(&self, filter: InterruptionFilter) -> Result<(), CapabilityError>;
}

// =============================================================================
// Ringer State Values
// =============================================================================

/// Ringer mode as reported by the audio service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingerMode {
    /// No ring, no vibration.
    Silent,
    /// Vibrate only.
    Vibrate,
    /// Audible ring.
    Normal,
}

impl RingerMode {
    /// Map a raw audio-service value (0-2) to a ringer mode.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Silent),
            1 => Some(Self::Vibrate),
            2 => Some(Self::Normal),
            _ => None,
        }
    }

    /// The raw audio-service value for this mode.
    pub fn as_raw(self) -> i32 {
        match self {
            Self::Silent => 0,
            Self::Vibrate => 1,
            Self::Normal => 2,
        }
    }
}

/// Notification interruption filter (zen mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionFilter {
    /// All interruptions allowed.
    Off,
    /// Only priority interruptions.
    PriorityOnly,
    /// No interruptions at all.
    TotalSilence,
    /// Alarms only.
    AlarmsOnly,
}

impl InterruptionFilter {
    /// Map a raw zen value (0-3) to a filter.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Off),
            1 => Some(Self::PriorityOnly),
            2 => Some(Self::TotalSilence),
            3 => Some(Self::AlarmsOnly),
            _ => None,
        }
    }

    /// The raw zen value for this filter.
    pub fn as_raw(self) -> i32 {
        match self {
            Self::Off => 0,
            Self::PriorityOnly => 1,
            Self::TotalSilence => 2,
            Self::AlarmsOnly => 3,
        }
    }
}

// =============================================================================
// Capability Bundle
// =============================================================================

/// The full set of capability providers the engine drives.
///
/// One provider per subsystem; each is a narrow read/write interface over
/// state the engine does not own. Hosts assemble this from their platform
/// services; tests assemble it from [`MockDevice`](crate::MockDevice).
pub struct Capabilities {
    /// Wi-Fi radio.
    pub wifi: Box<dyn Switch>,
    /// Bluetooth radio.
    pub bluetooth: Box<dyn Switch>,
    /// Mobile data.
    pub cellular_data: Box<dyn Switch>,
    /// Positioning service.
    pub location: Box<dyn Switch>,
    /// Always-on display setting.
    pub always_on_display: Box<dyn Setting>,
    /// Idle manager setting.
    pub idle_manager: Box<dyn Setting>,
    /// Extra-dark color adjustment setting.
    pub color_adjustment: Box<dyn Setting>,
    /// Alarm guard setting.
    pub alarm_guard: Box<dyn Setting>,
    /// Wakelock guard setting.
    pub wakelock_guard: Box<dyn Setting>,
    /// Ringer/interruption pair.
    pub ringer: Box<dyn RingerControl>,
}

impl Capabilities {
    /// Switch subsystems in the fixed processing order.
    pub(crate) fn switches(&self) -> [(SubsystemId, &dyn Switch); 4] {
        [
            (SubsystemId::Wifi, &*self.wifi),
            (SubsystemId::Bluetooth, &*self.bluetooth),
            (SubsystemId::CellularData, &*self.cellular_data),
            (SubsystemId::Location, &*self.location),
        ]
    }

    /// Settings subsystems in the fixed processing order.
    pub(crate) fn settings(&self) -> [(SubsystemId, &dyn Setting); 5] {
        [
            (SubsystemId::AlwaysOnDisplay, &*self.always_on_display),
            (SubsystemId::IdleManager, &*self.idle_manager),
            (SubsystemId::ColorAdjustment, &*self.color_adjustment),
            (SubsystemId::AlarmGuard, &*self.alarm_guard),
            (SubsystemId::WakelockGuard, &*self.wakelock_guard),
        ]
    }

    /// Look up a switch provider by id.
    pub(crate) fn switch(&self, id: SubsystemId) -> Option<&dyn Switch> {
        self.switches()
            .into_iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, switch)| switch)
    }

    /// Look up a setting provider by id.
    pub(crate) fn setting(&self, id: SubsystemId) -> Option<&dyn Setting> {
        self.settings()
            .into_iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, setting)| setting)
    }
}
