//! Example: drive a sleep mode cycle against the in-memory device.
//!
//! Run with: `cargo run --example toggle_sleep`

use nocturne_core::{
    AlwaysReady, MockDevice, MockPolicy, MockSink, ModeEngine, RingerBehavior, SubsystemId,
};

fn main() {
    // Initialize logging (optional)
    env_logger::init();

    let device = MockDevice::new();
    let policy = MockPolicy::new();
    let sink = MockSink::new();
    policy.set_ringer_behavior(RingerBehavior::Vibrate);

    let mut engine = ModeEngine::new(
        device.capabilities(),
        Box::new(policy),
        Box::new(sink.clone()),
        Box::new(AlwaysReady),
    );

    println!(
        "Before: wifi={}, ringer={:?}",
        device.switch(SubsystemId::Wifi),
        device.ringer_mode()
    );

    engine.set_desired_state(true);
    println!(
        "Active: wifi={}, ringer={:?}",
        device.switch(SubsystemId::Wifi),
        device.ringer_mode()
    );

    engine.set_desired_state(false);
    println!(
        "Restored: wifi={}, ringer={:?}",
        device.switch(SubsystemId::Wifi),
        device.ringer_mode()
    );

    for text in sink.transient_texts() {
        println!("toast: {}", text);
    }
}
