//! Sleep mode controller.
//!
//! When toggled on, sleep mode suspends a policy-selected set of device
//! subsystems (radios, positioning, cellular data, always-on display,
//! idle management, color adjustment, alarm/wakelock guards, and the
//! ringer/interruption pair) and records what it changed. When toggled
//! off, it restores exactly what it changed and nothing else.
//!
//! The crate owns only the orchestration: reading and writing individual
//! subsystem states goes through the narrow [`Switch`], [`Setting`] and
//! [`RingerControl`] provider interfaces a host wires to its platform
//! services, bundled into [`Capabilities`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use nocturne_core::{
//!     AlwaysReady, MockDevice, MockPolicy, MockSink, MockTrigger, ModeEngine, TriggerObserver,
//! };
//!
//! let device = MockDevice::new();
//! let trigger = MockTrigger::new();
//!
//! let engine = ModeEngine::new(
//!     device.capabilities(),
//!     Box::new(MockPolicy::new()),
//!     Box::new(MockSink::new()),
//!     Box::new(AlwaysReady),
//! );
//!
//! // The observer owns the engine and applies every change of the
//! // externally stored flag on its own worker thread.
//! let _observer = TriggerObserver::watch(engine, Arc::new(trigger.clone()));
//! trigger.set(true);
//! ```
//!
//! # Testing
//!
//! Every external collaborator has an in-memory mock ([`MockDevice`],
//! [`MockPolicy`], [`MockSink`], [`MockTrigger`], [`MockReadiness`]), so
//! engine behavior can be exercised without a device:
//!
//! ```
//! use nocturne_core::{AlwaysReady, MockDevice, MockPolicy, MockSink, ModeEngine, SubsystemId};
//!
//! let device = MockDevice::new();
//! let mut engine = ModeEngine::new(
//!     device.capabilities(),
//!     Box::new(MockPolicy::new()),
//!     Box::new(MockSink::new()),
//!     Box::new(AlwaysReady),
//! );
//! engine.set_desired_state(true);
//! assert!(!device.switch(SubsystemId::Bluetooth));
//! ```

#![warn(missing_docs)]

mod engine;
mod error;
mod mock;
mod policy;
mod presenter;
mod subsystems;
mod trigger;

// Re-export public API
pub use engine::{AlwaysReady, ModeEngine, SLEEP_INDICATOR_ID, SystemReadiness};
pub use error::CapabilityError;
pub use mock::{MockDevice, MockPolicy, MockReadiness, MockSink, MockTrigger, SinkEvent};
pub use policy::{PolicySource, RingerBehavior};
pub use presenter::{IndicatorAction, PresentationSink, StatusIndicator, TransientDuration};
pub use subsystems::{
    Capabilities, InterruptionFilter, RingerControl, RingerMode, Setting, SubsystemId, Switch,
};
pub use trigger::{TriggerCallback, TriggerObserver, TriggerSource};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn engine_with(device: &MockDevice, policy: &MockPolicy, sink: &MockSink) -> ModeEngine {
        ModeEngine::new(
            device.capabilities(),
            Box::new(policy.clone()),
            Box::new(sink.clone()),
            Box::new(AlwaysReady),
        )
    }

    fn wait_until(condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("condition not met within 2s");
    }

    const SWITCHES: [SubsystemId; 4] = [
        SubsystemId::Wifi,
        SubsystemId::Bluetooth,
        SubsystemId::CellularData,
        SubsystemId::Location,
    ];

    const SETTINGS: [SubsystemId; 5] = [
        SubsystemId::AlwaysOnDisplay,
        SubsystemId::IdleManager,
        SubsystemId::ColorAdjustment,
        SubsystemId::AlarmGuard,
        SubsystemId::WakelockGuard,
    ];

    #[test]
    fn test_activation_suspends_participating_subsystems() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        policy.set_ringer_behavior(RingerBehavior::Vibrate);
        let mut engine = engine_with(&device, &policy, &sink);

        engine.set_desired_state(true);

        assert!(engine.is_active());
        for id in SWITCHES {
            assert!(!device.switch(id), "{id} should be off");
        }
        assert_eq!(device.setting(SubsystemId::AlwaysOnDisplay), 0);
        assert_eq!(device.setting(SubsystemId::IdleManager), 1);
        assert_eq!(device.setting(SubsystemId::ColorAdjustment), 1);
        assert_eq!(device.setting(SubsystemId::AlarmGuard), 1);
        assert_eq!(device.setting(SubsystemId::WakelockGuard), 1);
        assert_eq!(device.ringer_mode(), RingerMode::Vibrate);
        assert_eq!(device.interruption_filter(), InterruptionFilter::Off);
    }

    #[test]
    fn test_toggle_restores_previous_state() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        policy.set_ringer_behavior(RingerBehavior::Silent);

        // Non-default pre-state to catch restores to a hardcoded value.
        device.set_switch(SubsystemId::Bluetooth, false);
        device.set_switch(SubsystemId::Location, false);
        device.set_setting(SubsystemId::AlwaysOnDisplay, 1);
        device.set_setting(SubsystemId::AlarmGuard, 1);
        device.set_ringer_mode(RingerMode::Vibrate);
        device.set_interruption_filter(InterruptionFilter::PriorityOnly);

        let mut engine = engine_with(&device, &policy, &sink);
        engine.set_desired_state(true);
        engine.set_desired_state(false);

        assert!(!engine.is_active());
        assert!(device.switch(SubsystemId::Wifi));
        assert!(!device.switch(SubsystemId::Bluetooth));
        assert!(device.switch(SubsystemId::CellularData));
        assert!(!device.switch(SubsystemId::Location));
        assert_eq!(device.setting(SubsystemId::AlwaysOnDisplay), 1);
        assert_eq!(device.setting(SubsystemId::IdleManager), 0);
        assert_eq!(device.setting(SubsystemId::ColorAdjustment), 0);
        assert_eq!(device.setting(SubsystemId::AlarmGuard), 1);
        assert_eq!(device.setting(SubsystemId::WakelockGuard), 0);
        assert_eq!(device.ringer_mode(), RingerMode::Vibrate);
        assert_eq!(device.interruption_filter(), InterruptionFilter::PriorityOnly);
    }

    #[test]
    fn test_redundant_enable_is_a_noop() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        let mut engine = engine_with(&device, &policy, &sink);

        engine.set_desired_state(true);
        let writes = device.write_count(SubsystemId::Wifi);
        let events = sink.events().len();

        engine.set_desired_state(true);

        assert_eq!(device.write_count(SubsystemId::Wifi), writes);
        assert_eq!(sink.events().len(), events);
    }

    #[test]
    fn test_disable_without_enable_is_a_noop() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        let mut engine = engine_with(&device, &policy, &sink);

        engine.set_desired_state(false);

        assert!(!engine.is_active());
        assert!(sink.events().is_empty());
        for id in SWITCHES.iter().chain(SETTINGS.iter()) {
            assert_eq!(device.write_count(*id), 0);
        }
    }

    #[test]
    fn test_non_participating_subsystems_untouched() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        policy.set_participates(SubsystemId::Bluetooth, false);
        policy.set_participates(SubsystemId::IdleManager, false);

        let mut engine = engine_with(&device, &policy, &sink);
        engine.set_desired_state(true);
        engine.set_desired_state(false);

        assert_eq!(device.write_count(SubsystemId::Bluetooth), 0);
        assert_eq!(device.write_count(SubsystemId::IdleManager), 0);
        assert!(device.switch(SubsystemId::Bluetooth));
        assert_eq!(device.setting(SubsystemId::IdleManager), 0);
    }

    #[test]
    fn test_restore_is_keyed_off_snapshot_not_current_policy() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        policy.set_participates(SubsystemId::Bluetooth, false);
        let mut engine = engine_with(&device, &policy, &sink);

        engine.set_desired_state(true);

        // Policy flips both ways between activation and deactivation.
        policy.set_participates(SubsystemId::Bluetooth, true);
        policy.set_participates(SubsystemId::Wifi, false);
        engine.set_desired_state(false);

        // Captured at activation: restored despite dropping out of policy.
        assert!(device.switch(SubsystemId::Wifi));
        assert_eq!(device.write_count(SubsystemId::Wifi), 2);
        // Never captured: joining the policy later does not invent a restore.
        assert_eq!(device.write_count(SubsystemId::Bluetooth), 0);
    }

    #[test]
    fn test_ringer_pair_restored_after_external_change() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        policy.set_ringer_behavior(RingerBehavior::Vibrate);
        device.set_ringer_mode(RingerMode::Silent);

        let mut engine = engine_with(&device, &policy, &sink);
        engine.set_desired_state(true);
        assert_eq!(device.ringer_mode(), RingerMode::Vibrate);

        // User flips the ringer while the mode is active; the engine still
        // rewrites its captured pair on the way out.
        device.set_ringer_mode(RingerMode::Normal);
        engine.set_desired_state(false);

        assert_eq!(device.ringer_mode(), RingerMode::Silent);
        assert_eq!(device.interruption_filter(), InterruptionFilter::Off);
    }

    #[test]
    fn test_ringer_priority_behavior_sets_pair() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        policy.set_ringer_behavior(RingerBehavior::PriorityOnly);
        device.set_ringer_mode(RingerMode::Vibrate);

        let mut engine = engine_with(&device, &policy, &sink);
        engine.set_desired_state(true);

        assert_eq!(device.ringer_mode(), RingerMode::Normal);
        assert_eq!(device.interruption_filter(), InterruptionFilter::PriorityOnly);

        engine.set_desired_state(false);
        assert_eq!(device.ringer_mode(), RingerMode::Vibrate);
        assert_eq!(device.interruption_filter(), InterruptionFilter::Off);
    }

    #[test]
    fn test_ringer_restore_skipped_when_pair_unchanged() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        policy.set_ringer_behavior(RingerBehavior::Vibrate);

        let mut engine = engine_with(&device, &policy, &sink);
        engine.set_desired_state(true);
        assert_eq!(device.write_count(SubsystemId::Ringer), 2);

        // External actor puts the pair back to exactly the captured values.
        device.set_ringer_mode(RingerMode::Normal);
        engine.set_desired_state(false);

        assert_eq!(device.write_count(SubsystemId::Ringer), 2);
    }

    #[test]
    fn test_ringer_restore_gated_on_current_selector() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        policy.set_ringer_behavior(RingerBehavior::Vibrate);

        let mut engine = engine_with(&device, &policy, &sink);
        engine.set_desired_state(true);

        policy.set_ringer_behavior(RingerBehavior::Untouched);
        engine.set_desired_state(false);

        // Selector moved to 0 mid-mode: the pair is left as sleep mode set it.
        assert_eq!(device.ringer_mode(), RingerMode::Vibrate);
        assert_eq!(device.write_count(SubsystemId::Ringer), 2);
    }

    #[test]
    fn test_partial_write_failure_does_not_block_other_subsystems() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        device.fail_writes(SubsystemId::Wifi, true);

        let mut engine = engine_with(&device, &policy, &sink);
        engine.set_desired_state(true);

        assert!(engine.is_active());
        assert!(device.switch(SubsystemId::Wifi), "failed write leaves Wi-Fi on");
        assert!(!device.switch(SubsystemId::Bluetooth));
        assert!(!device.switch(SubsystemId::Location));
        assert_eq!(device.setting(SubsystemId::IdleManager), 1);
        assert!(sink.last_persistent().is_some());
    }

    #[test]
    fn test_capture_failure_falls_back_and_still_applies() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        device.fail_reads(SubsystemId::Wifi, true);

        let mut engine = engine_with(&device, &policy, &sink);
        engine.set_desired_state(true);
        assert!(!device.switch(SubsystemId::Wifi), "apply proceeds past a failed read");

        // The fallback captured value (off) is what restore drives toward.
        device.fail_reads(SubsystemId::Wifi, false);
        device.set_switch(SubsystemId::Wifi, true);
        engine.set_desired_state(false);

        assert!(!device.switch(SubsystemId::Wifi));
    }

    #[test]
    fn test_policy_read_failure_fails_closed() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        policy.fail_reads(SubsystemId::CellularData, true);
        policy.fail_ringer_read(true);
        policy.set_ringer_behavior(RingerBehavior::Silent);

        let mut engine = engine_with(&device, &policy, &sink);
        engine.set_desired_state(true);

        assert!(device.switch(SubsystemId::CellularData));
        assert_eq!(device.write_count(SubsystemId::CellularData), 0);
        assert_eq!(device.ringer_mode(), RingerMode::Normal);
        assert_eq!(device.write_count(SubsystemId::Ringer), 0);
    }

    #[test]
    fn test_readiness_gates_before_flag_commit() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        let readiness = MockReadiness::new();
        readiness.set_ready(false);
        let mut engine = ModeEngine::new(
            device.capabilities(),
            Box::new(policy.clone()),
            Box::new(sink.clone()),
            Box::new(readiness.clone()),
        );

        engine.set_desired_state(true);

        // Dropped transition leaves the flag uncommitted, so the same
        // request succeeds once the system is ready.
        assert!(!engine.is_active());
        assert!(device.switch(SubsystemId::Wifi));
        assert!(sink.events().is_empty());

        readiness.set_ready(true);
        engine.set_desired_state(true);
        assert!(engine.is_active());
        assert!(!device.switch(SubsystemId::Wifi));
    }

    #[test]
    fn test_switch_restore_skips_redundant_write() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        let mut engine = engine_with(&device, &policy, &sink);

        engine.set_desired_state(true);
        assert_eq!(device.write_count(SubsystemId::Wifi), 1);

        // External actor already turned Wi-Fi back on.
        device.set_switch(SubsystemId::Wifi, true);
        engine.set_desired_state(false);

        assert!(device.switch(SubsystemId::Wifi));
        assert_eq!(device.write_count(SubsystemId::Wifi), 1);
    }

    #[test]
    fn test_setting_restore_writes_unconditionally() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        device.set_setting(SubsystemId::AlwaysOnDisplay, 1);
        let mut engine = engine_with(&device, &policy, &sink);

        engine.set_desired_state(true);
        assert_eq!(device.setting(SubsystemId::AlwaysOnDisplay), 0);
        assert_eq!(device.write_count(SubsystemId::AlwaysOnDisplay), 1);

        // Settings values skip the readback comparison: even with the live
        // value already back at the captured one, the restore writes.
        device.set_setting(SubsystemId::AlwaysOnDisplay, 1);
        engine.set_desired_state(false);

        assert_eq!(device.setting(SubsystemId::AlwaysOnDisplay), 1);
        assert_eq!(device.write_count(SubsystemId::AlwaysOnDisplay), 2);
    }

    #[test]
    fn test_empty_policy_touches_nothing_but_still_presents() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        for id in SWITCHES.iter().chain(SETTINGS.iter()) {
            policy.set_participates(*id, false);
        }
        let mut engine = engine_with(&device, &policy, &sink);

        engine.set_desired_state(true);
        engine.set_desired_state(false);

        for id in SWITCHES.iter().chain(SETTINGS.iter()) {
            assert_eq!(device.write_count(*id), 0);
        }
        assert_eq!(device.write_count(SubsystemId::Ringer), 0);
        assert_eq!(sink.cancelled_ids(), vec![SLEEP_INDICATOR_ID]);
    }

    #[test]
    fn test_presentation_lifecycle() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        let mut engine = engine_with(&device, &policy, &sink);

        engine.set_desired_state(true);
        let indicator = sink.last_persistent().expect("indicator shown");
        assert_eq!(indicator.id, SLEEP_INDICATOR_ID);
        assert_eq!(indicator.action, IndicatorAction::DisableMode);
        assert_eq!(indicator.title, "Sleep mode");

        engine.set_desired_state(false);
        assert_eq!(
            sink.transient_texts(),
            vec!["Sleep mode enabled".to_string(), "Sleep mode disabled".to_string()]
        );
        assert_eq!(sink.cancelled_ids(), vec![SLEEP_INDICATOR_ID]);
    }

    #[test]
    fn test_enable_scenario_with_mixed_policy() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        policy.set_participates(SubsystemId::Location, false);
        policy.set_ringer_behavior(RingerBehavior::Vibrate);

        let mut engine = engine_with(&device, &policy, &sink);
        engine.set_desired_state(true);

        assert!(!device.switch(SubsystemId::Wifi));
        assert!(device.switch(SubsystemId::Location));
        assert_eq!(device.ringer_mode(), RingerMode::Vibrate);
        assert_eq!(device.interruption_filter(), InterruptionFilter::Off);

        engine.set_desired_state(false);

        assert!(device.switch(SubsystemId::Wifi));
        assert!(device.switch(SubsystemId::Location));
        assert_eq!(device.write_count(SubsystemId::Location), 0);
        assert_eq!(device.ringer_mode(), RingerMode::Normal);
        assert_eq!(device.interruption_filter(), InterruptionFilter::Off);
    }

    #[test]
    fn test_ringer_selector_mapping() {
        assert_eq!(RingerBehavior::from_raw(0), RingerBehavior::Untouched);
        assert_eq!(RingerBehavior::from_raw(1), RingerBehavior::Vibrate);
        assert_eq!(RingerBehavior::from_raw(2), RingerBehavior::PriorityOnly);
        assert_eq!(RingerBehavior::from_raw(3), RingerBehavior::Silent);
        assert_eq!(RingerBehavior::from_raw(7), RingerBehavior::Untouched);

        assert_eq!(RingerMode::from_raw(1), Some(RingerMode::Vibrate));
        assert_eq!(RingerMode::from_raw(5), None);
        assert_eq!(InterruptionFilter::from_raw(1), Some(InterruptionFilter::PriorityOnly));
        assert_eq!(InterruptionFilter::from_raw(9), None);
    }

    #[test]
    fn test_observer_initial_sync_applies_current_flag() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        let trigger = MockTrigger::new();
        trigger.set(true);

        let engine = engine_with(&device, &policy, &sink);
        let _observer = TriggerObserver::watch(engine, Arc::new(trigger.clone()));

        wait_until(|| !device.switch(SubsystemId::Wifi));
    }

    #[test]
    fn test_observer_follows_flag_changes() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        let trigger = MockTrigger::new();

        let engine = engine_with(&device, &policy, &sink);
        let _observer = TriggerObserver::watch(engine, Arc::new(trigger.clone()));

        trigger.set(true);
        wait_until(|| !device.switch(SubsystemId::Wifi));

        trigger.set(false);
        wait_until(|| device.switch(SubsystemId::Wifi));
        assert_eq!(device.write_count(SubsystemId::Wifi), 2);
    }

    #[test]
    fn test_observer_rereads_on_spurious_notifications() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        let trigger = MockTrigger::new();

        let engine = engine_with(&device, &policy, &sink);
        let _observer = TriggerObserver::watch(engine, Arc::new(trigger.clone()));

        trigger.set(true);
        wait_until(|| !device.switch(SubsystemId::Wifi));

        // Coalesced/stale notifications with an unchanged flag must not
        // re-run the activation sequence.
        trigger.notify();
        trigger.notify();
        thread::sleep(Duration::from_millis(50));

        assert_eq!(device.write_count(SubsystemId::Wifi), 1);
        assert_eq!(sink.transient_texts().len(), 1);
    }

    #[test]
    fn test_dropped_observer_ignores_notifications() {
        let device = MockDevice::new();
        let policy = MockPolicy::new();
        let sink = MockSink::new();
        let trigger = MockTrigger::new();

        let engine = engine_with(&device, &policy, &sink);
        let observer = TriggerObserver::watch(engine, Arc::new(trigger.clone()));
        drop(observer);

        trigger.set(true);
        thread::sleep(Duration::from_millis(50));

        assert!(device.switch(SubsystemId::Wifi));
        assert!(sink.events().is_empty());
    }
}
