//! Sable compiler crash handler.
//!
//! Internal invariant violations inside the compiler are raised as panics
//! prefixed with [ICE_PREFIX], the crash handler turns them into an internal
//! compiler error report with a backtrace.
use std::{io::Write, panic::PanicHookInfo, process::exit, sync::atomic, thread};

use backtrace::Backtrace;

const BUG_REPORT_MSG: &str = "This is a compiler bug, please file a bug report with the";
const BUG_REPORT_HINT: &str = "target triple and the signature that was being lowered";

/// Prefix carried by every panic message that denotes a broken internal
/// invariant.
pub const ICE_PREFIX: &str = "internal compiler error";

/// Abort compilation because an internal invariant does not hold.
#[macro_export]
macro_rules! ice {
    ($($arg:tt)*) => {
        ::std::panic!("{}: {}", $crate::crash::ICE_PREFIX, ::std::format_args!($($arg)*))
    };
}

/// The Sable compiler crash handler. Only the first panicking thread prints
/// the report; the process exits with a non-zero status afterwards.
///
/// # Registering the handler
/// ```ignore
/// use std::panic;
/// use sable_utils::crash::crash_handler;
///
/// panic::set_hook(Box::new(crash_handler));
/// ```
pub fn crash_handler(info: &PanicHookInfo) {
    static PANIC_ONCE: atomic::AtomicBool = atomic::AtomicBool::new(false);

    if !PANIC_ONCE.swap(true, atomic::Ordering::SeqCst) {
        let stderr = std::io::stderr();
        let mut stderr = stderr.lock();

        let _ = write!(&mut stderr, "Sorry :^(\nInternal Compiler Error");

        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str));

        match message {
            Some(message) => match message.strip_prefix(ICE_PREFIX) {
                Some(rest) => {
                    let _ = writeln!(&mut stderr, "{rest}\n");
                }
                None => {
                    let _ = writeln!(&mut stderr, ": {message}\n");
                }
            },
            None => {
                let _ = writeln!(&mut stderr, "\n");
            }
        }

        if let Some(location) = info.location() {
            let _ = writeln!(
                &mut stderr,
                "Occurred at '{}:{}:{}'",
                location.file(),
                location.line(),
                location.column()
            );
        }

        let backtrace = Backtrace::new();

        if let Some(name) = thread::current().name() {
            let _ = writeln!(&mut stderr, "Backtrace for thread \"{name}\":\n{backtrace:?}");
        } else {
            let _ = writeln!(&mut stderr, "Backtrace:\n{backtrace:?}");
        }

        let _ = writeln!(&mut stderr, "{BUG_REPORT_MSG}\n{BUG_REPORT_HINT}\n");
    }

    exit(1);
}
