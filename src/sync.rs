//! Synchronization primitives for search control.
//!
//! Cancellation is cooperative everywhere in the engine: search code polls a
//! flag at recursion and loop boundaries and unwinds normally when it is set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A thread-safe stop flag for controlling search termination.
///
/// Wraps `Arc<AtomicBool>` so the same flag can be shared between the
/// caller, a deadline timer, and any number of search workers.
#[derive(Clone, Debug)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    /// Create a new stop flag (initially not stopped).
    #[must_use]
    pub fn new() -> Self {
        StopFlag(Arc::new(AtomicBool::new(false)))
    }

    /// Check if the stop flag is set.
    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Set the stop flag.
    #[inline]
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Clear the stop flag.
    #[inline]
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

impl Default for StopFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// A cancellation scope for speculative parallel search.
///
/// Scopes form a chain: cancelling a node's scope cancels every scope created
/// beneath it, so a beta cutoff at one node tears down that node's sibling
/// subtrees without touching unrelated branches.
pub struct CancelScope<'a> {
    flag: AtomicBool,
    parent: Option<&'a CancelScope<'a>>,
}

impl<'a> CancelScope<'a> {
    /// Create a root scope with no parent.
    #[must_use]
    pub fn root() -> Self {
        CancelScope {
            flag: AtomicBool::new(false),
            parent: None,
        }
    }

    /// Create a scope nested under `self`.
    #[must_use]
    pub fn child(&'a self) -> CancelScope<'a> {
        CancelScope {
            flag: AtomicBool::new(false),
            parent: Some(self),
        }
    }

    /// Cancel this scope and, transitively, every scope nested under it.
    #[inline]
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Check whether this scope or any ancestor has been cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        let mut scope = Some(self);
        while let Some(s) = scope {
            if s.flag.load(Ordering::Relaxed) {
                return true;
            }
            scope = s.parent;
        }
        false
    }
}
