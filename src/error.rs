//! Error types for capability providers.

/// Errors returned by capability providers and the policy source.
///
/// The mode engine never propagates these to its caller: per-subsystem
/// failures are logged and the transition continues with the remaining
/// subsystems.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// The backing service for a subsystem is not available.
    #[error("{0} service unavailable")]
    Unavailable(&'static str),

    /// The provider refused the request.
    #[error("{subsystem} rejected the request (code {code})")]
    Rejected {
        /// The subsystem name.
        subsystem: &'static str,
        /// Provider-specific failure code.
        code: i32,
    },

    /// A value read back from the provider was outside the known range.
    #[error("unexpected {subsystem} value {value}")]
    UnexpectedValue {
        /// The subsystem name.
        subsystem: &'static str,
        /// The raw value reported by the provider.
        value: i32,
    },

    /// An I/O error occurred talking to the provider.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
