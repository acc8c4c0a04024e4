//! Stopping the minimization on SIGINT.
use std::sync::{atomic::AtomicBool, Arc, OnceLock};

static INTERRUPT: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Set `flag` on the first SIGINT. A second SIGINT terminates the process.
pub fn install(flag: Arc<AtomicBool>) {
    if INTERRUPT.set(flag).is_err() {
        return;
    }
    install_handler();
}

#[cfg(unix)]
fn install_handler() {
    use std::sync::atomic::Ordering;

    extern "C" fn handle_sigint(_: libc::c_int) {
        if let Some(flag) = INTERRUPT.get() {
            flag.store(true, Ordering::Relaxed);
        }
        unsafe {
            libc::signal(libc::SIGINT, libc::SIG_DFL);
        }
    }

    unsafe {
        libc::signal(
            libc::SIGINT,
            handle_sigint as extern "C" fn(libc::c_int) as libc::sighandler_t,
        );
    }
}

#[cfg(not(unix))]
fn install_handler() {
    log::warn!("interrupting the minimization is not supported on this platform");
}
