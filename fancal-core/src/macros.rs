//! Crate-internal macros for optional logging and host responses.

// Optional logging facade
#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

// Format a response line into a bounded buffer and hand it to the host's
// responder. Lines longer than RESPONSE_LINE_CAP are truncated, not dropped.
macro_rules! respond_info {
    ($ctx:expr, $($arg:tt)*) => {{
        let mut line = heapless::String::<{ crate::constants::RESPONSE_LINE_CAP }>::new();
        let _ = core::fmt::Write::write_fmt(&mut line, core::format_args!($($arg)*));
        $ctx.responder.info(line.as_str());
    }};
}

macro_rules! respond_error {
    ($ctx:expr, $($arg:tt)*) => {{
        let mut line = heapless::String::<{ crate::constants::RESPONSE_LINE_CAP }>::new();
        let _ = core::fmt::Write::write_fmt(&mut line, core::format_args!($($arg)*));
        $ctx.responder.error(line.as_str());
    }};
}
