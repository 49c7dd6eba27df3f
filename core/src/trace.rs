//! Tracing utilities for index introspection.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site.

/// Emit a debug-level event after a catalog read.
///
/// ```ignore
/// index_trace_catalog!("public.users", rows.len());
/// ```
#[macro_export]
macro_rules! index_trace_catalog {
    ($table:expr, $rows:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(table = %$table, rows = $rows, "drizzle_indexes.catalog");
    };
}

/// Emit a warn-level event for an index whose definition did not parse.
///
/// ```ignore
/// index_trace_failure!(&error);
/// ```
#[macro_export]
macro_rules! index_trace_failure {
    ($error:expr) => {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            table = %$error.table,
            index = %$error.index,
            reason = %$error.reason,
            "drizzle_indexes.unparsed_index"
        );
    };
}
