//! Local exclusion guard for the drawing session.
//!
//! A single-holder advisory lock scoped to one peer. The runtime is
//! single-threaded cooperative, so this never guards against parallel
//! mutation; it serializes *logical* operations (capturing vs. clearing)
//! and exposes a busy state the UI can observe.

/// Advisory single-holder lock. Acquire never blocks: if the guard is
/// already held the requesting operation is rejected and must no-op.
#[derive(Debug, Default)]
pub struct SessionGuard {
    held: bool,
}

impl SessionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to take the guard. Returns `false` (and leaves the holder
    /// undisturbed) if it is already held.
    pub fn try_acquire(&mut self) -> bool {
        if self.held {
            log::debug!("session guard contended; operation rejected");
            return false;
        }
        self.held = true;
        true
    }

    /// Release the guard. Idempotent: releasing an unheld guard is a no-op.
    pub fn release(&mut self) {
        self.held = false;
    }

    /// Whether the guard is currently held (UI busy indicator).
    pub fn is_held(&self) -> bool {
        self.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release() {
        let mut guard = SessionGuard::new();
        assert!(!guard.is_held());

        assert!(guard.try_acquire());
        assert!(guard.is_held());

        guard.release();
        assert!(!guard.is_held());
    }

    #[test]
    fn test_second_acquire_rejected() {
        let mut guard = SessionGuard::new();
        assert!(guard.try_acquire());
        assert!(!guard.try_acquire());
        assert!(guard.is_held());
    }

    #[test]
    fn test_release_idempotent() {
        let mut guard = SessionGuard::new();
        guard.release();
        guard.release();
        assert!(!guard.is_held());
        assert!(guard.try_acquire());
    }
}
