#[doc(hidden)]
#[macro_export]
macro_rules! __sv_log {
    ($kind:expr, $sink:ident, $($arg:tt)*) => {{
        let msg = format!("{}", format_args!($($arg)*));
        let redacted = $crate::print::auto_redact(&msg);
        if $crate::print::is_print() {
            $crate::print::print_to_terminal(&redacted, $kind);
        }
        $crate::print::$sink(&redacted, $kind);
    }};
}

/// Print an informational message.
///
/// `info!(no_log, ...)` keeps the line out of the log file
/// (it still lands in the in-memory buffer).
#[macro_export]
macro_rules! info {
    (no_log, $($arg:tt)*) => {
        $crate::__sv_log!($crate::print::LogType::Info, print_to_memory, $($arg)*)
    };
    ($($arg:tt)*) => {
        $crate::__sv_log!($crate::print::LogType::Info, print_to_file, $($arg)*)
    };
}

/// Print an error message
#[macro_export]
macro_rules! err {
    (no_log, $($arg:tt)*) => {
        $crate::__sv_log!($crate::print::LogType::Error, print_to_memory, $($arg)*)
    };
    ($($arg:tt)*) => {
        $crate::__sv_log!($crate::print::LogType::Error, print_to_file, $($arg)*)
    };
}

/// Print a point message, i.e. a small step in some process
#[macro_export]
macro_rules! pt {
    (no_log, $($arg:tt)*) => {
        $crate::__sv_log!($crate::print::LogType::Point, print_to_memory, $($arg)*)
    };
    ($($arg:tt)*) => {
        $crate::__sv_log!($crate::print::LogType::Point, print_to_file, $($arg)*)
    };
}
