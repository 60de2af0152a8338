//! Mock collaborators for testing.
//!
//! These stand in for the platform services behind the capability
//! providers, the policy store, the presentation surface and the trigger
//! flag, so engine behavior can be tested without a device.

use crate::error::CapabilityError;
use crate::policy::{PolicySource, RingerBehavior};
use crate::presenter::{PresentationSink, StatusIndicator, TransientDuration};
use crate::subsystems::{
    Capabilities, InterruptionFilter, RingerControl, RingerMode, Setting, SubsystemId, Switch,
};
use crate::trigger::{TriggerCallback, TriggerSource};

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

// =============================================================================
// Mock Device
// =============================================================================

/// An in-memory device holding every subsystem's state.
///
/// [`capabilities`](MockDevice::capabilities) hands out providers that all
/// share this device's state, so a test can inspect and mutate subsystem
/// values while an engine owns the providers. Reads and writes can be made
/// to fail per subsystem to exercise the engine's best-effort paths.
///
/// # Example
///
/// ```
/// use nocturne_core::{MockDevice, SubsystemId};
///
/// let device = MockDevice::new();
/// assert!(device.switch(SubsystemId::Wifi));
/// device.set_switch(SubsystemId::Wifi, false);
/// assert!(!device.switch(SubsystemId::Wifi));
/// ```
#[derive(Clone)]
pub struct MockDevice {
    inner: Arc<Mutex<DeviceInner>>,
}

struct DeviceInner {
    switches: HashMap<SubsystemId, bool>,
    settings: HashMap<SubsystemId, i32>,
    ringer_mode: RingerMode,
    interruption_filter: InterruptionFilter,
    fail_reads: HashSet<SubsystemId>,
    fail_writes: HashSet<SubsystemId>,
    write_counts: HashMap<SubsystemId, usize>,
}

const SWITCH_IDS: [SubsystemId; 4] = [
    SubsystemId::Wifi,
    SubsystemId::Bluetooth,
    SubsystemId::CellularData,
    SubsystemId::Location,
];

const SETTING_IDS: [SubsystemId; 5] = [
    SubsystemId::AlwaysOnDisplay,
    SubsystemId::IdleManager,
    SubsystemId::ColorAdjustment,
    SubsystemId::AlarmGuard,
    SubsystemId::WakelockGuard,
];

impl MockDevice {
    /// Create a device with all radios on, all settings at 0, ringer
    /// normal and interruptions off.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(DeviceInner {
                switches: SWITCH_IDS.iter().map(|id| (*id, true)).collect(),
                settings: SETTING_IDS.iter().map(|id| (*id, 0)).collect(),
                ringer_mode: RingerMode::Normal,
                interruption_filter: InterruptionFilter::Off,
                fail_reads: HashSet::new(),
                fail_writes: HashSet::new(),
                write_counts: HashMap::new(),
            })),
        }
    }

    /// Build the capability bundle backed by this device.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            wifi: self.switch_provider(SubsystemId::Wifi),
            bluetooth: self.switch_provider(SubsystemId::Bluetooth),
            cellular_data: self.switch_provider(SubsystemId::CellularData),
            location: self.switch_provider(SubsystemId::Location),
            always_on_display: self.setting_provider(SubsystemId::AlwaysOnDisplay),
            idle_manager: self.setting_provider(SubsystemId::IdleManager),
            color_adjustment: self.setting_provider(SubsystemId::ColorAdjustment),
            alarm_guard: self.setting_provider(SubsystemId::AlarmGuard),
            wakelock_guard: self.setting_provider(SubsystemId::WakelockGuard),
            ringer: Box::new(MockRinger {
                inner: Arc::clone(&self.inner),
            }),
        }
    }

    fn switch_provider(&self, id: SubsystemId) -> Box<dyn Switch> {
        Box::new(MockSwitch {
            id,
            inner: Arc::clone(&self.inner),
        })
    }

    fn setting_provider(&self, id: SubsystemId) -> Box<dyn Setting> {
        Box::new(MockSetting {
            id,
            inner: Arc::clone(&self.inner),
        })
    }

    /// Current state of a switch subsystem.
    pub fn switch(&self, id: SubsystemId) -> bool {
        self.inner.lock().unwrap().switches.get(&id).copied().unwrap_or(false)
    }

    /// Directly set a switch, as an external actor would (not counted as a
    /// provider write, not subject to injected failures).
    pub fn set_switch(&self, id: SubsystemId, enabled: bool) {
        self.inner.lock().unwrap().switches.insert(id, enabled);
    }

    /// Current value of a settings subsystem.
    pub fn setting(&self, id: SubsystemId) -> i32 {
        self.inner.lock().unwrap().settings.get(&id).copied().unwrap_or(0)
    }

    /// Directly set a settings value, as an external actor would.
    pub fn set_setting(&self, id: SubsystemId, value: i32) {
        self.inner.lock().unwrap().settings.insert(id, value);
    }

    /// Current ringer mode.
    pub fn ringer_mode(&self) -> RingerMode {
        self.inner.lock().unwrap().ringer_mode
    }

    /// Directly set the ringer mode, as an external actor would.
    pub fn set_ringer_mode(&self, mode: RingerMode) {
        self.inner.lock().unwrap().ringer_mode = mode;
    }

    /// Current interruption filter.
    pub fn interruption_filter(&self) -> InterruptionFilter {
        self.inner.lock().unwrap().interruption_filter
    }

    /// Directly set the interruption filter, as an external actor would.
    pub fn set_interruption_filter(&self, filter: InterruptionFilter) {
        self.inner.lock().unwrap().interruption_filter = filter;
    }

    /// Make provider reads for `id` fail.
    pub fn fail_reads(&self, id: SubsystemId, fail: bool) {
        let mut inner = self.inner.lock().unwrap();
        if fail {
            inner.fail_reads.insert(id);
        } else {
            inner.fail_reads.remove(&id);
        }
    }

    /// Make provider writes for `id` fail.
    pub fn fail_writes(&self, id: SubsystemId, fail: bool) {
        let mut inner = self.inner.lock().unwrap();
        if fail {
            inner.fail_writes.insert(id);
        } else {
            inner.fail_writes.remove(&id);
        }
    }

    /// Number of provider write attempts against `id`. Ringer counts each
    /// of the two channels separately.
    pub fn write_count(&self, id: SubsystemId) -> usize {
        self.inner.lock().unwrap().write_counts.get(&id).copied().unwrap_or(0)
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceInner {
    fn check_read(&self, id: SubsystemId) -> Result<(), CapabilityError> {
        if self.fail_reads.contains(&id) {
            return Err(CapabilityError::Unavailable(id.name()));
        }
        Ok(())
    }

    fn record_write(&mut self, id: SubsystemId) -> Result<(), CapabilityError> {
        *self.write_counts.entry(id).or_insert(0) += 1;
        if self.fail_writes.contains(&id) {
            return Err(CapabilityError::Rejected {
                subsystem: id.name(),
                code: -1,
            });
        }
        Ok(())
    }
}

struct MockSwitch {
    id: SubsystemId,
    inner: Arc<Mutex<DeviceInner>>,
}

impl Switch for MockSwitch {
    fn is_enabled(&self) -> Result<bool, CapabilityError> {
        let inner = self.inner.lock().unwrap();
        inner.check_read(self.id)?;
        Ok(inner.switches.get(&self.id).copied().unwrap_or(false))
    }

    fn set_enabled(&self, enabled: bool) -> Result<(), CapabilityError> {
        let mut inner = self.inner.lock().unwrap();
        inner.record_write(self.id)?;
        inner.switches.insert(self.id, enabled);
        Ok(())
    }
}

struct MockSetting {
    id: SubsystemId,
    inner: Arc<Mutex<DeviceInner>>,
}

impl Setting for MockSetting {
    fn get(&self) -> Result<i32, CapabilityError> {
        let inner = self.inner.lock().unwrap();
        inner.check_read(self.id)?;
        Ok(inner.settings.get(&self.id).copied().unwrap_or(0))
    }

    fn set(&self, value: i32) -> Result<(), CapabilityError> {
        let mut inner = self.inner.lock().unwrap();
        inner.record_write(self.id)?;
        inner.settings.insert(self.id, value);
        Ok(())
    }
}

struct MockRinger {
    inner: Arc<Mutex<DeviceInner>>,
}

impl RingerControl for MockRinger {
    fn ringer_mode(&self) -> Result<RingerMode, CapabilityError> {
        let inner = self.inner.lock().unwrap();
        inner.check_read(SubsystemId::Ringer)?;
        Ok(inner.ringer_mode)
    }

    fn set_ringer_mode(&self, mode: RingerMode) -> Result<(), CapabilityError> {
        let mut inner = self.inner.lock().unwrap();
        inner.record_write(SubsystemId::Ringer)?;
        inner.ringer_mode = mode;
        Ok(())
    }

    fn interruption_filter(&self) -> Result<InterruptionFilter, CapabilityError> {
        let inner = self.inner.lock().unwrap();
        inner.check_read(SubsystemId::Ringer)?;
        Ok(inner.interruption_filter)
    }

    fn set_interruption_filter(&self, filter: InterruptionFilter) -> Result<(), CapabilityError> {
        let mut inner = self.inner.lock().unwrap();
        inner.record_write(SubsystemId::Ringer)?;
        inner.interruption_filter = filter;
        Ok(())
    }
}

// =============================================================================
// Mock Policy
// =============================================================================

/// A mutable in-memory policy store.
///
/// Defaults match a fresh install: every subsystem participates and the
/// ringer selector is 0 (untouched). Clones share the same store, so a test
/// can flip policy after handing a clone to the engine.
#[derive(Clone)]
pub struct MockPolicy {
    inner: Arc<Mutex<PolicyInner>>,
}

struct PolicyInner {
    participates: HashMap<SubsystemId, bool>,
    ringer: RingerBehavior,
    fail_reads: HashSet<SubsystemId>,
    fail_ringer_read: bool,
}

impl MockPolicy {
    /// Create a policy with all subsystems participating and the ringer
    /// untouched.
    pub fn new() -> Self {
        let participates = [
            SubsystemId::Wifi,
            SubsystemId::Bluetooth,
            SubsystemId::CellularData,
            SubsystemId::Location,
            SubsystemId::AlwaysOnDisplay,
            SubsystemId::IdleManager,
            SubsystemId::ColorAdjustment,
            SubsystemId::AlarmGuard,
            SubsystemId::WakelockGuard,
        ]
        .iter()
        .map(|id| (*id, true))
        .collect();

        Self {
            inner: Arc::new(Mutex::new(PolicyInner {
                participates,
                ringer: RingerBehavior::Untouched,
                fail_reads: HashSet::new(),
                fail_ringer_read: false,
            })),
        }
    }

    /// Set a subsystem's participation flag.
    pub fn set_participates(&self, id: SubsystemId, participates: bool) {
        self.inner.lock().unwrap().participates.insert(id, participates);
    }

    /// Set the ringer behavior selector.
    pub fn set_ringer_behavior(&self, behavior: RingerBehavior) {
        self.inner.lock().unwrap().ringer = behavior;
    }

    /// Make participation reads for `id` fail.
    pub fn fail_reads(&self, id: SubsystemId, fail: bool) {
        let mut inner = self.inner.lock().unwrap();
        if fail {
            inner.fail_reads.insert(id);
        } else {
            inner.fail_reads.remove(&id);
        }
    }

    /// Make the ringer selector read fail.
    pub fn fail_ringer_read(&self, fail: bool) {
        self.inner.lock().unwrap().fail_ringer_read = fail;
    }
}

impl Default for MockPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicySource for MockPolicy {
    fn participates(&self, id: SubsystemId) -> Result<bool, CapabilityError> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_reads.contains(&id) {
            return Err(CapabilityError::Unavailable("policy store"));
        }
        Ok(inner.participates.get(&id).copied().unwrap_or(false))
    }

    fn ringer_behavior(&self) -> Result<RingerBehavior, CapabilityError> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_ringer_read {
            return Err(CapabilityError::Unavailable("policy store"));
        }
        Ok(inner.ringer)
    }
}

// =============================================================================
// Mock Presentation Sink
// =============================================================================

/// A presentation event captured by [`MockSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// A transient message was shown.
    Transient {
        /// Message text.
        text: String,
        /// Duration hint.
        duration: TransientDuration,
    },
    /// A persistent indicator was shown.
    Persistent(StatusIndicator),
    /// A persistent indicator was cancelled.
    Cancelled(u32),
}

/// Records every presentation request for later inspection.
///
/// Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MockSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl MockSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured events, in order.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Texts of the captured transient messages, in order.
    pub fn transient_texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Transient { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// The most recently shown persistent indicator, if any.
    pub fn last_persistent(&self) -> Option<StatusIndicator> {
        self.events()
            .into_iter()
            .rev()
            .find_map(|event| match event {
                SinkEvent::Persistent(indicator) => Some(indicator),
                _ => None,
            })
    }

    /// Ids of cancelled indicators, in order.
    pub fn cancelled_ids(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Cancelled(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Drop all captured events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl PresentationSink for MockSink {
    fn show_transient(&self, text: &str, duration: TransientDuration) {
        self.events.lock().unwrap().push(SinkEvent::Transient {
            text: text.to_string(),
            duration,
        });
    }

    fn show_persistent(&self, indicator: StatusIndicator) {
        self.events.lock().unwrap().push(SinkEvent::Persistent(indicator));
    }

    fn cancel_persistent(&self, id: u32) {
        self.events.lock().unwrap().push(SinkEvent::Cancelled(id));
    }
}

// =============================================================================
// Mock Trigger Source
// =============================================================================

/// An in-memory enabled flag with change notification.
///
/// Clones share the same flag; [`set`](MockTrigger::set) stores the value
/// and fires every registered callback.
#[derive(Clone, Default)]
pub struct MockTrigger {
    inner: Arc<Mutex<TriggerInner>>,
}

#[derive(Default)]
struct TriggerInner {
    flag: bool,
    callbacks: Vec<TriggerCallback>,
}

impl MockTrigger {
    /// Create a trigger with the flag off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new flag value and notify subscribers.
    pub fn set(&self, enabled: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.flag = enabled;
        for callback in &inner.callbacks {
            callback();
        }
    }

    /// Fire subscribers without changing the flag, as a coalesced or stale
    /// notification would.
    pub fn notify(&self) {
        let inner = self.inner.lock().unwrap();
        for callback in &inner.callbacks {
            callback();
        }
    }
}

impl TriggerSource for MockTrigger {
    fn read(&self) -> bool {
        self.inner.lock().unwrap().flag
    }

    fn subscribe(&self, callback: TriggerCallback) {
        self.inner.lock().unwrap().callbacks.push(callback);
    }
}

// =============================================================================
// Mock Readiness
// =============================================================================

/// A readiness gate a test can flip.
///
/// Clones share the same flag. Starts ready.
#[derive(Clone)]
pub struct MockReadiness {
    ready: Arc<Mutex<bool>>,
}

impl MockReadiness {
    /// Create a gate that reports ready.
    pub fn new() -> Self {
        Self {
            ready: Arc::new(Mutex::new(true)),
        }
    }

    /// Set readiness.
    pub fn set_ready(&self, ready: bool) {
        *self.ready.lock().unwrap() = ready;
    }
}

impl Default for MockReadiness {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::engine::SystemReadiness for MockReadiness {
    fn is_ready(&self) -> bool {
        *self.ready.lock().unwrap()
    }
}
