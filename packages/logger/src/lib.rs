//! Simple to ``stderr`` logger.
//!
//! ``trace``, ``debug`` and ``info`` lines are gated on the ``debug`` feature of the
//! crate that invokes the macro, so a library can stay silent unless its user opts in.
//! ``warn`` and ``error`` lines are always printed.

/// Timestamp related functions.
///
/// This module is used by the generated macros in external crates; so this has
/// to be public in scope.
#[cfg(feature = "debug")]
pub mod timestamp {
    use chrono::Utc;

    /// Generate the current timestamp.
    pub fn now() -> String {
        Utc::now().to_rfc3339()
    }
}

/// The prefix for a log line: the current timestamp followed by a space.
#[cfg(feature = "debug")]
pub fn stamp() -> String {
    format!("{} ", timestamp::now())
}

/// The prefix for a log line; empty without timestamps.
#[cfg(not(feature = "debug"))]
pub fn stamp() -> String {
    String::new()
}

#[doc(hidden)]
#[macro_export]
macro_rules! __emit {
    ($label:literal, $head:literal, $body:literal, $($arg:tt)+) => {
        eprintln!(
            concat!(
                "\x1b[1m\x1b[38:5:", $head, "m", $label,
                "\x1b[39m | \x1b[22m\x1b[38:5:", $body, "m{}{}\x1b[39m"
            ),
            $crate::stamp(),
            format_args!($($arg)+)
        )
    };
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)+) => {{
        #[cfg(feature = "debug")]
        $crate::__emit!("TRACE", "240", "240", $($arg)+);
    }};
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {{
        #[cfg(feature = "debug")]
        $crate::__emit!("DEBUG", "245", "245", $($arg)+);
    }};
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {{
        #[cfg(feature = "debug")]
        $crate::__emit!("INFO ", "15", "7", $($arg)+);
    }};
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {{
        $crate::__emit!("WARN ", "11", "228", $($arg)+);
    }};
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {{
        $crate::__emit!("ERROR", "9", "160", $($arg)+);
    }};
}
