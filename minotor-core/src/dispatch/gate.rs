//! Control gate held while background jobs run

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Enabled when no dispatched job is outstanding.
///
/// Cloning yields another handle to the same gate.
#[derive(Debug, Clone, Default)]
pub struct ControlGate {
    outstanding: Arc<AtomicUsize>,
}

impl ControlGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.outstanding() == 0
    }

    /// Jobs dispatched whose completion has not been dropped yet
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Disable the gate until the returned guard is dropped.
    pub fn hold(&self) -> GateGuard {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        GateGuard {
            outstanding: Arc::clone(&self.outstanding),
        }
    }
}

/// Keeps its [`ControlGate`] disabled while alive.
#[derive(Debug)]
#[must_use = "the gate re-enables as soon as the guard is dropped"]
pub struct GateGuard {
    outstanding: Arc<AtomicUsize>,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_counts_guards() {
        let gate = ControlGate::new();
        assert!(gate.is_enabled());

        let first = gate.hold();
        let second = gate.clone().hold();
        assert!(!gate.is_enabled());
        assert_eq!(gate.outstanding(), 2);

        drop(first);
        assert!(!gate.is_enabled());
        drop(second);
        assert!(gate.is_enabled());
    }
}
