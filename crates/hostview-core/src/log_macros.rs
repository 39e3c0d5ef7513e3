//! Feature-gated logging macros
//!
//! With the `tracing` feature (on by default) these forward to the matching
//! `tracing` macro. Without it they expand to nothing.
//!
//! Crates that invoke these macros must depend on `tracing` themselves.

/// Log at error level through `tracing`
#[cfg(feature = "tracing")]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        tracing::error!($($arg)*)
    };
}

/// Log at error level; expands to nothing without the `tracing` feature
#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {};
}

/// Log at warn level through `tracing`
#[cfg(feature = "tracing")]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        tracing::warn!($($arg)*)
    };
}

/// Log at warn level; expands to nothing without the `tracing` feature
#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

/// Log at info level through `tracing`
#[cfg(feature = "tracing")]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        tracing::info!($($arg)*)
    };
}

/// Log at info level; expands to nothing without the `tracing` feature
#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

/// Log at debug level through `tracing`
#[cfg(feature = "tracing")]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

/// Log at debug level; expands to nothing without the `tracing` feature
#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}
