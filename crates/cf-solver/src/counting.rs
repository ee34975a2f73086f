//! Call-counting solver wrapper.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::adapter::{CellSolver, IntegrationRequest};
use crate::outcome::SolverOutcome;
use crate::profile::ProfileKind;

/// Wraps a solver and counts invocations per profile.
pub struct CountingSolver<S> {
    inner: S,
    default_calls: AtomicUsize,
    safe_calls: AtomicUsize,
}

impl<S> CountingSolver<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            default_calls: AtomicUsize::new(0),
            safe_calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.default_calls() + self.safe_calls()
    }

    pub fn default_calls(&self) -> usize {
        self.default_calls.load(Ordering::Relaxed)
    }

    pub fn safe_calls(&self) -> usize {
        self.safe_calls.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.default_calls.store(0, Ordering::Relaxed);
        self.safe_calls.store(0, Ordering::Relaxed);
    }
}

impl<S: CellSolver> CellSolver for CountingSolver<S> {
    fn integrate(&self, request: &IntegrationRequest<'_>) -> SolverOutcome {
        match request.profile.kind {
            ProfileKind::Default => self.default_calls.fetch_add(1, Ordering::Relaxed),
            ProfileKind::Safe => self.safe_calls.fetch_add(1, Ordering::Relaxed),
        };
        self.inner.integrate(request)
    }
}
