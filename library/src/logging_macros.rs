// Wrappers around crate::log's logging functions that prepend "[patcher]" to the log message.
//
// Under #[cfg(test)] these print instead so test output shows what the
// patcher was doing when an assertion failed.

#[cfg(test)]
#[macro_export]
macro_rules! patcher_info {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        println!(concat!("[patcher] ", $fmt), $($($arg)*)?)
    };
}

#[cfg(not(test))]
#[macro_export]
macro_rules! patcher_info {
    // patcher_info!("a {} event", "log")
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::info!(concat!("[patcher] ", $fmt), $($($arg)*)?)
    };
}

#[cfg(test)]
#[macro_export]
macro_rules! patcher_debug {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        println!(concat!("[patcher] ", $fmt), $($($arg)*)?)
    };
}

#[cfg(not(test))]
#[macro_export]
macro_rules! patcher_debug {
    // patcher_debug!("a {} event", "log")
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::debug!(concat!("[patcher] ", $fmt), $($($arg)*)?)
    };
}

#[cfg(test)]
#[macro_export]
macro_rules! patcher_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        println!(concat!("[patcher] ", $fmt), $($($arg)*)?)
    };
}

#[cfg(not(test))]
#[macro_export]
macro_rules! patcher_warn {
    // patcher_warn!("a {} event", "log")
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::warn!(concat!("[patcher] ", $fmt), $($($arg)*)?)
    };
}

#[cfg(test)]
#[macro_export]
macro_rules! patcher_error {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        println!(concat!("[patcher] ", $fmt), $($($arg)*)?)
    };
}

#[cfg(not(test))]
#[macro_export]
macro_rules! patcher_error {
    // patcher_error!("a {} event", "log")
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::error!(concat!("[patcher] ", $fmt), $($($arg)*)?)
    };
}
