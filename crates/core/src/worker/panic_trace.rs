use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic;
use std::sync::Once;

static INSTALL: Once = Once::new();

thread_local! {
    static LAST_PANIC: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Replace the default panic hook with one that logs the panic and keeps
/// its location and backtrace for the next `take` on the same thread.
pub fn install() {
    INSTALL.call_once(|| {
        panic::set_hook(Box::new(|info| {
            let trace = format!("{info}\n\nstack backtrace:\n{}", Backtrace::force_capture());
            log::error!("{info}");
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(trace));
        }));
    });
}

/// The trace recorded by the most recent panic on this thread, if any.
pub fn take() -> Option<String> {
    LAST_PANIC.with(|slot| slot.borrow_mut().take())
}

/// Message carried by a caught panic payload.
pub fn payload_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
