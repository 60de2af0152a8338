//! Trigger source and the observer that drives the engine from it.

use crate::engine::ModeEngine;

use crossbeam_channel::{Receiver, Sender};
use log::{debug, trace, warn};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Callback registered with a [`TriggerSource`].
pub type TriggerCallback = Box<dyn Fn() + Send + Sync>;

/// The externally stored "sleep mode enabled" flag.
///
/// Notifications carry no payload beyond "the flag may have changed";
/// consumers must re-read the flag. Stale or coalesced notifications are
/// therefore harmless.
pub trait TriggerSource: Send + Sync {
    /// Read the current value of the enabled flag.
    fn read(&self) -> bool;

    /// Register a change callback. Registration is one-shot for the
    /// lifetime of the source; there is no unsubscribe.
    fn subscribe(&self, callback: TriggerCallback);
}

enum ObserverEvent {
    Sync,
    Stop,
}

/// Watches a [`TriggerSource`] and feeds the engine from a single worker.
///
/// On construction the observer registers with the source once, then
/// performs an initial synchronization. Every notification (and the initial
/// sync) re-reads the flag and calls
/// [`ModeEngine::set_desired_state`] on a dedicated worker thread fed by a
/// single-consumer queue, which is what gives the engine its serialized
/// transition path. Dropping the observer stops the worker; notifications
/// arriving afterwards are ignored.
pub struct TriggerObserver {
    events: Sender<ObserverEvent>,
    worker: Option<JoinHandle<()>>,
}

impl TriggerObserver {
    /// Take ownership of the engine and start watching the source.
    pub fn watch(engine: ModeEngine, source: Arc<dyn TriggerSource>) -> Self {
        let (events, queue) = crossbeam_channel::unbounded();

        let notify = events.clone();
        source.subscribe(Box::new(move || {
            trace!("trigger notification");
            // Send can only fail after the observer is dropped.
            if notify.send(ObserverEvent::Sync).is_err() {
                debug!("trigger fired after observer shutdown, ignoring");
            }
        }));

        // Initial synchronization: pick up the flag value that was current
        // before we started watching.
        let _ = events.send(ObserverEvent::Sync);

        let worker = std::thread::spawn(move || run_worker(engine, source, queue));

        Self {
            events,
            worker: Some(worker),
        }
    }
}

impl Drop for TriggerObserver {
    fn drop(&mut self) {
        let _ = self.events.send(ObserverEvent::Stop);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("trigger worker panicked");
            }
        }
    }
}

fn run_worker(mut engine: ModeEngine, source: Arc<dyn TriggerSource>, queue: Receiver<ObserverEvent>) {
    debug!("trigger worker started");
    for event in queue.iter() {
        match event {
            ObserverEvent::Sync => {
                // Never trust a push payload; the flag is re-read on every
                // wakeup.
                let enabled = source.read();
                engine.set_desired_state(enabled);
            }
            ObserverEvent::Stop => break,
        }
    }
    debug!("trigger worker stopped");
}
