//! Presentation sink: user-visible side effects of a transition.

/// Receives the engine's fire-and-forget presentation requests.
///
/// Implementations must dispatch asynchronously relative to the caller: a
/// transition never blocks on, or fails because of, showing a message.
pub trait PresentationSink: Send + Sync {
    /// Show a transient message.
    fn show_transient(&self, text: &str, duration: TransientDuration);

    /// Show (or replace) a persistent status indicator.
    fn show_persistent(&self, indicator: StatusIndicator);

    /// Cancel a persistent status indicator by id.
    fn cancel_persistent(&self, id: u32);
}

/// Duration hint for a transient message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientDuration {
    /// Brief display.
    Short,
    /// Extended display.
    Long,
}

/// A persistent, ongoing status indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusIndicator {
    /// Stable indicator id, also used to cancel it.
    pub id: u32,
    /// Title line.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Icon resource name.
    pub icon: &'static str,
    /// What tapping the indicator does.
    pub action: IndicatorAction,
}

/// Action attached to a persistent indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorAction {
    /// Force-disable sleep mode, equivalent to writing the externally
    /// stored enabled flag to `false`.
    DisableMode,
}
