use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Printed when a run stops because the operator pressed Ctrl-C
pub const INTERRUPTED_MESSAGE: &str = "operation interrupted by user: exiting";

/// Shared stop flag, set from a signal handler and polled by the pruner
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Record one Ctrl-C press. Returns true when the flag was already set,
    /// meaning the run did not stop after the first press.
    pub fn press(&self) -> bool {
        self.0.swap(true, Ordering::SeqCst)
    }

    /// Trigger this flag on Ctrl-C. Only one handler may be installed per process.
    ///
    /// The first press lets the current remote call finish and the pruner
    /// stop at its next check. A second press exits at once with status 0,
    /// for when a connect or listing is stuck on a silent server.
    pub fn install_ctrlc_handler(&self) -> Result<(), ctrlc::Error> {
        let flag = self.clone();
        ctrlc::set_handler(move || {
            if flag.press() {
                eprintln!("{}", INTERRUPTED_MESSAGE);
                std::process::exit(0);
            }
            tracing::warn!("interrupt received, stopping after the current remote call (Ctrl-C again to quit now)");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let a = Interrupt::new();
        let b = a.clone();
        assert!(!b.is_triggered());
        a.trigger();
        assert!(b.is_triggered());
    }

    #[test]
    fn test_second_press_is_reported() {
        let interrupt = Interrupt::new();
        assert!(!interrupt.press());
        assert!(interrupt.is_triggered());
        assert!(interrupt.press());
    }
}
