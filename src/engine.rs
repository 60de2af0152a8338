//! Sleep mode engine: the snapshot/apply/restore state machine.

use crate::policy::{PolicySource, RingerBehavior};
use crate::presenter::{IndicatorAction, PresentationSink, StatusIndicator, TransientDuration};
use crate::subsystems::{Capabilities, InterruptionFilter, RingerMode, SubsystemId};

use log::{debug, info, warn};

/// Id of the persistent status indicator shown while the mode is active.
pub const SLEEP_INDICATOR_ID: u32 = 727;

const ENABLED_MESSAGE: &str = "Sleep mode enabled";
const DISABLED_MESSAGE: &str = "Sleep mode disabled";
const INDICATOR_TITLE: &str = "Sleep mode";
const INDICATOR_BODY: &str = "Sleep mode is active. Tap to turn off.";
const INDICATOR_ICON: &str = "ic_sleep";

// =============================================================================
// System Readiness
// =============================================================================

/// Readiness gate consulted before any transition.
///
/// A transition requested while the system is not ready is dropped without
/// committing the desired-state flag, so a later trigger can retry it.
pub trait SystemReadiness: Send + Sync {
    /// Whether the system can currently apply subsystem changes.
    fn is_ready(&self) -> bool;
}

/// A readiness gate that always reports ready.
pub struct AlwaysReady;

impl SystemReadiness for AlwaysReady {
    fn is_ready(&self) -> bool {
        true
    }
}

// =============================================================================
// Snapshot (engine-private)
// =============================================================================

/// Captured pre-activation values, keyed by subsystem.
///
/// An entry exists exactly for the subsystems the engine altered during the
/// current activation; restore never touches anything else. Owned by the
/// engine for a single enable/disable cycle and never exposed.
#[derive(Debug, Default)]
struct Snapshot {
    switches: Vec<(SubsystemId, bool)>,
    settings: Vec<(SubsystemId, i32)>,
    ringer: Option<RingerSnapshot>,
}

#[derive(Debug, Clone, Copy)]
struct RingerSnapshot {
    mode: RingerMode,
    filter: InterruptionFilter,
}

// =============================================================================
// Mode Engine
// =============================================================================

/// The sleep mode engine.
///
/// Holds the activation flag and the snapshot of captured subsystem states,
/// and executes the activate/deactivate protocol against the capability
/// providers. The engine holds no lock: callers must serialize
/// [`set_desired_state`](ModeEngine::set_desired_state) invocations, which
/// [`TriggerObserver`](crate::TriggerObserver) does by funneling them
/// through a single worker thread.
///
/// # Example
///
/// ```
/// use nocturne_core::{AlwaysReady, MockDevice, MockPolicy, MockSink, ModeEngine, SubsystemId};
///
/// let device = MockDevice::new();
/// let mut engine = ModeEngine::new(
///     device.capabilities(),
///     Box::new(MockPolicy::new()),
///     Box::new(MockSink::new()),
///     Box::new(AlwaysReady),
/// );
///
/// engine.set_desired_state(true);
/// assert!(engine.is_active());
/// assert!(!device.switch(SubsystemId::Wifi));
///
/// engine.set_desired_state(false);
/// assert!(device.switch(SubsystemId::Wifi));
/// ```
pub struct ModeEngine {
    capabilities: Capabilities,
    policy: Box<dyn PolicySource>,
    sink: Box<dyn PresentationSink>,
    readiness: Box<dyn SystemReadiness>,
    active: bool,
    snapshot: Snapshot,
}

impl ModeEngine {
    /// Create an engine over the given collaborators.
    ///
    /// The engine starts inactive with an empty snapshot.
    pub fn new(
        capabilities: Capabilities,
        policy: Box<dyn PolicySource>,
        sink: Box<dyn PresentationSink>,
        readiness: Box<dyn SystemReadiness>,
    ) -> Self {
        Self {
            capabilities,
            policy,
            sink,
            readiness,
            active: false,
            snapshot: Snapshot::default(),
        }
    }

    /// Whether sleep mode is currently active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Drive the engine toward the desired state.
    ///
    /// A value equal to the current state is a no-op: repeated identical
    /// triggers never re-capture or re-apply. The readiness gate runs
    /// before the flag commit, so `is_active() == true` always means the
    /// activation sequence ran. This call never fails; per-subsystem
    /// provider errors are logged and swallowed.
    pub fn set_desired_state(&mut self, enabled: bool) {
        if self.active == enabled {
            debug!("desired state unchanged ({}), ignoring", enabled);
            return;
        }
        if !self.readiness.is_ready() {
            info!("system not ready, dropping transition to {}", enabled);
            return;
        }

        self.active = enabled;
        if enabled {
            self.activate();
        } else {
            self.deactivate();
        }
    }

    /// Read a participation flag, treating a failed read as "skip".
    fn participates(&self, id: SubsystemId) -> bool {
        match self.policy.participates(id) {
            Ok(flag) => flag,
            Err(err) => {
                warn!("policy read for {} failed, skipping: {}", id, err);
                false
            }
        }
    }

    /// Read the ringer selector, treating a failed read as "untouched".
    fn ringer_behavior(&self) -> RingerBehavior {
        match self.policy.ringer_behavior() {
            Ok(behavior) => behavior,
            Err(err) => {
                warn!("ringer policy read failed, leaving ringer untouched: {}", err);
                RingerBehavior::Untouched
            }
        }
    }

    fn activate(&mut self) {
        info!("activating sleep mode");
        let mut snapshot = Snapshot::default();

        for (id, switch) in self.capabilities.switches() {
            if !self.participates(id) {
                continue;
            }
            let previous = match switch.is_enabled() {
                Ok(enabled) => enabled,
                Err(err) => {
                    warn!("failed to read {} state, capturing off: {}", id, err);
                    false
                }
            };
            snapshot.switches.push((id, previous));
            debug!("suspending {} (was {})", id, if previous { "on" } else { "off" });
            if let Err(err) = switch.set_enabled(false) {
                warn!("failed to suspend {}: {}", id, err);
            }
        }

        for (id, setting) in self.capabilities.settings() {
            if !self.participates(id) {
                continue;
            }
            let previous = match setting.get() {
                Ok(value) => value,
                Err(err) => {
                    warn!("failed to read {} value, capturing 0: {}", id, err);
                    0
                }
            };
            snapshot.settings.push((id, previous));
            let target = suppressed_value(id);
            debug!("setting {} to {} (was {})", id, target, previous);
            if let Err(err) = setting.set(target) {
                warn!("failed to set {}: {}", id, err);
            }
        }

        if let Some((mode, filter)) = self.ringer_behavior().targets() {
            let ringer = &*self.capabilities.ringer;
            let previous = RingerSnapshot {
                mode: ringer.ringer_mode().unwrap_or_else(|err| {
                    warn!("failed to read ringer mode, capturing normal: {}", err);
                    RingerMode::Normal
                }),
                filter: ringer.interruption_filter().unwrap_or_else(|err| {
                    warn!("failed to read interruption filter, capturing off: {}", err);
                    InterruptionFilter::Off
                }),
            };
            snapshot.ringer = Some(previous);
            debug!("applying ringer pair {:?}/{:?}", mode, filter);
            if let Err(err) = ringer.set_ringer_mode(mode) {
                warn!("failed to set ringer mode: {}", err);
            }
            if let Err(err) = ringer.set_interruption_filter(filter) {
                warn!("failed to set interruption filter: {}", err);
            }
        }

        self.snapshot = snapshot;

        self.sink
            .show_transient(ENABLED_MESSAGE, TransientDuration::Long);
        self.sink.show_persistent(StatusIndicator {
            id: SLEEP_INDICATOR_ID,
            title: INDICATOR_TITLE.to_string(),
            body: INDICATOR_BODY.to_string(),
            icon: INDICATOR_ICON,
            action: IndicatorAction::DisableMode,
        });
    }

    fn deactivate(&mut self) {
        info!("deactivating sleep mode");
        let snapshot = std::mem::take(&mut self.snapshot);

        // Restoration is keyed off snapshot membership: a subsystem that
        // dropped out of policy since activation is still restored.
        for (id, previous) in snapshot.switches {
            let Some(switch) = self.capabilities.switch(id) else {
                continue;
            };
            if switch.is_enabled().ok() == Some(previous) {
                debug!("{} already {}, skipping restore", id, if previous { "on" } else { "off" });
                continue;
            }
            debug!("restoring {} to {}", id, if previous { "on" } else { "off" });
            if let Err(err) = switch.set_enabled(previous) {
                warn!("failed to restore {}: {}", id, err);
            }
        }

        // Settings subsystems restore without a live-value comparison.
        for (id, previous) in snapshot.settings {
            let Some(setting) = self.capabilities.setting(id) else {
                continue;
            };
            debug!("restoring {} to {}", id, previous);
            if let Err(err) = setting.set(previous) {
                warn!("failed to restore {}: {}", id, err);
            }
        }

        // The ringer pair keeps the double gate: snapshot entry plus a
        // currently non-zero selector. Both channels are rewritten when
        // either live value drifted from its captured value.
        if let Some(previous) = snapshot.ringer {
            if self.ringer_behavior() != RingerBehavior::Untouched {
                let ringer = &*self.capabilities.ringer;
                let mode_drifted = ringer.ringer_mode().ok() != Some(previous.mode);
                let filter_drifted = ringer.interruption_filter().ok() != Some(previous.filter);
                if mode_drifted || filter_drifted {
                    debug!("restoring ringer pair {:?}/{:?}", previous.mode, previous.filter);
                    if let Err(err) = ringer.set_ringer_mode(previous.mode) {
                        warn!("failed to restore ringer mode: {}", err);
                    }
                    if let Err(err) = ringer.set_interruption_filter(previous.filter) {
                        warn!("failed to restore interruption filter: {}", err);
                    }
                } else {
                    debug!("ringer pair unchanged, skipping restore");
                }
            }
        }

        self.sink
            .show_transient(DISABLED_MESSAGE, TransientDuration::Long);
        self.sink.cancel_persistent(SLEEP_INDICATOR_ID);
    }
}

/// The value a settings subsystem is driven to while the mode is active.
fn suppressed_value(id: SubsystemId) -> i32 {
    match id {
        SubsystemId::AlwaysOnDisplay => 0,
        _ => 1,
    }
}
