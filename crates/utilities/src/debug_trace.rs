//! Tracing for the hot loops of the term crates. The messages are only
//! compiled in with the `terma_debug-trace` feature, since formatting terms on
//! every unification step is far too expensive otherwise.

/// Forwards to [log::trace] when the `terma_debug-trace` feature is enabled,
/// and expands to nothing otherwise.
///
/// # Examples
///
/// ```
/// use terma_utilities::debug_trace;
///
/// let step = 3;
/// debug_trace!("unification step {step}");
/// ```
#[macro_export]
#[cfg(feature = "terma_debug-trace")]
macro_rules! debug_trace {
    ($($arg:tt)*) => {
        {
            log::trace!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "terma_debug-trace"))]
macro_rules! debug_trace {
    ($($arg:tt)*) => {{}};
}
