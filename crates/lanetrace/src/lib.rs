//! Lane-indented debug output for concurrent programs.
//!
//! When several threads print to the console at once, their lines interleave
//! and become hard to follow. This crate assigns each thread a _lane_ the
//! first time it prints something and indents all of that thread's output by
//! the lane index, so each thread's output lines up in its own column.
//!
//! ```text
//!
//! Lane| 1
//! |||
//! main started
//!
//!         Lane| 2
//!         |||
//!         worker started
//! main waiting
//!         worker done
//! ```
//!
//! Most programs use the process-wide tracer through the [`msg!`] and
//! [`debug_block!`] macros. A [`Tracer`] can also be constructed explicitly
//! to write somewhere other than standard output or to identify execution
//! units some other way, such as tasks in an async runtime.
//!
//! # Example
//!
//! ```
//! lanetrace::msg!("loaded ", 3, " files");
//! lanetrace::debug_block!("checking cache", "cache is warm");
//!
//! // Turn off debug blocks without touching the call sites.
//! lanetrace::set_debug_statements_enabled(false);
//! lanetrace::debug_block!("this is not printed");
//! ```
//!
//! # Configuration
//!
//! The process-wide tracer starts with everything enabled. Call
//! [`init_from_env()`] to read `LANETRACE_DEBUG_STATEMENTS`,
//! `LANETRACE_LANE_MARKING`, and `LANETRACE_INDENT_UNIT`.
//!
//! # Caveats
//!
//! Lanes are never reclaimed. A program that spawns many short-lived threads
//! will keep allocating new lanes, each indented further than the last.

use std::fmt;

use lazy_static::lazy_static;

mod config;
mod errors;
mod lanes;
mod tracer;
mod unit;

pub use crate::config::{DEFAULT_INDENT_UNIT, ENV_PREFIX, Toggle, TraceConfig};
pub use errors::ConfigError;
pub use lanes::{Lane, LaneRegistry};
pub use tracer::Tracer;
pub use unit::{ExecutionUnitId, ThreadIdIntrospection, ThreadLocalCounter, UnitIdSource};

lazy_static! {
    /// Process-wide tracer that writes to standard output.
    static ref GLOBAL: Tracer = Tracer::stdout();
}

/// Returns the process-wide tracer.
pub fn global() -> &'static Tracer {
    &GLOBAL
}

/// Sets whether the process-wide tracer prints debug blocks.
pub fn set_debug_statements_enabled(enabled: bool) {
    GLOBAL.set_debug_statements_enabled(enabled);
}

/// Sets whether the process-wide tracer indents output by lane.
pub fn set_lane_marking_enabled(enabled: bool) {
    GLOBAL.set_lane_marking_enabled(enabled);
}

/// Prints one line to the process-wide tracer. See [`Tracer::emit_message()`].
pub fn emit_message(parts: &[&dyn fmt::Display]) {
    GLOBAL.emit_message(parts);
}

/// Prints a debug block to the process-wide tracer. See
/// [`Tracer::emit_debug()`].
pub fn emit_debug(statement: &str, more_statements: &[&str]) {
    GLOBAL.emit_debug(statement, more_statements);
}

/// Loads [`TraceConfig`] from the environment and applies it to the
/// process-wide tracer.
pub fn init_from_env() -> Result<TraceConfig, ConfigError> {
    let config = TraceConfig::from_env()?;
    GLOBAL.apply_config(&config);
    log::debug!("loaded trace configuration {config:?}");
    Ok(config)
}

/// Prints one line made of the arguments concatenated with no separator.
///
/// Arguments may be anything that implements [`std::fmt::Display`]. Prefix
/// the arguments with `tracer =>` to use a specific [`Tracer`] instead of the
/// process-wide one.
///
/// ```
/// let n = 4;
/// lanetrace::msg!("spawning ", n, " workers");
///
/// let tracer = lanetrace::Tracer::new(Vec::new(), lanetrace::ThreadLocalCounter);
/// lanetrace::msg!(tracer => "spawning ", n, " workers");
/// ```
#[macro_export]
macro_rules! msg {
    ($tracer:expr => $($part:expr),* $(,)?) => {
        $tracer.emit_message(&[$(&$part as &dyn ::std::fmt::Display),*])
    };
    ($($part:expr),* $(,)?) => {
        $crate::emit_message(&[$(&$part as &dyn ::std::fmt::Display),*])
    };
}

/// Prints a block of debug statements, unless debug statements are disabled.
///
/// Each statement may be a `&str` or a `String`. Prefix the statements with
/// `tracer =>` to use a specific [`Tracer`] instead of the process-wide one.
///
/// ```
/// let key = "alpha";
/// lanetrace::debug_block!("acquiring lock", format!("key = {key}"));
/// ```
#[macro_export]
macro_rules! debug_block {
    ($tracer:expr => $stmt:expr $(, $more:expr)* $(,)?) => {
        $tracer.emit_debug(
            ::std::convert::AsRef::<str>::as_ref(&$stmt),
            &[$(::std::convert::AsRef::<str>::as_ref(&$more)),*],
        )
    };
    ($stmt:expr $(, $more:expr)* $(,)?) => {
        $crate::emit_debug(
            ::std::convert::AsRef::<str>::as_ref(&$stmt),
            &[$(::std::convert::AsRef::<str>::as_ref(&$more)),*],
        )
    };
}

#[cfg(test)]
mod tests;
