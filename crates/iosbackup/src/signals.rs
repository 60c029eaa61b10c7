//! SIGINT / SIGTERM handling
//!
//! The handler only flips an atomic; the session driver polls
//! [`InterruptFlag`] between blocking steps and winds down on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

static SIGNALLED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_termination_signal(_: libc::c_int) {
    SIGNALLED.store(true, Ordering::SeqCst);
}

/// Cooperative cancellation flag
///
/// A flag from [`install`] also reports delivered SIGINT/SIGTERM; one from
/// [`InterruptFlag::new`] is set only through [`InterruptFlag::set`].
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    local: Arc<AtomicBool>,
    watch_signals: bool,
}

impl InterruptFlag {
    /// Flag that ignores process signals
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether cancellation was requested
    pub fn is_set(&self) -> bool {
        self.local.load(Ordering::SeqCst) || (self.watch_signals && SIGNALLED.load(Ordering::SeqCst))
    }

    /// Request cancellation
    pub fn set(&self) {
        self.local.store(true, Ordering::SeqCst);
    }
}

/// Install handlers for SIGINT and SIGTERM
pub fn install() -> nix::Result<InterruptFlag> {
    let action = SigAction::new(
        SigHandler::Handler(on_termination_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only stores to a static atomic, which is
        // async-signal-safe, and it replaces no handler we depend on.
        unsafe { sigaction(signal, &action) }?;
    }
    tracing::debug!("termination signal handlers installed");
    Ok(InterruptFlag {
        local: Arc::new(AtomicBool::new(false)),
        watch_signals: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = InterruptFlag::new();
        let other = flag.clone();
        assert!(!other.is_set());
        flag.set();
        assert!(other.is_set());
    }

    #[test]
    fn test_plain_flag_ignores_signal_state() {
        let flag = InterruptFlag::new();
        SIGNALLED.store(true, Ordering::SeqCst);
        let unaffected = !flag.is_set();
        SIGNALLED.store(false, Ordering::SeqCst);
        assert!(unaffected);
    }
}
