#![forbid(unsafe_code)]

//! Recoverable-fault reporting boundary.
//!
//! Element hooks are host code and may fail; the routing layer must never
//! let such a fault escape to the platform or suppress the terminal native
//! callback. Every phase handler catches hook faults at its boundary, wraps
//! them as [`RoutingFault`], and hands them to the process-wide
//! [`FaultSink`] owned by the input context.
//!
//! Two sinks are provided: [`TracingFaultSink`] (the default, reports via
//! `tracing::warn!`) and [`CollectingFaultSink`] (retains faults for
//! inspection, shared-handle semantics for tests and diagnostics).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::event::{ElementId, TouchPhase};

/// Boxed source error produced by a failing element hook.
pub type FaultSource = Box<dyn std::error::Error + Send + Sync>;

/// A recoverable fault raised while routing one phase batch.
#[derive(Debug)]
pub struct RoutingFault {
    /// The native phase being processed when the fault occurred.
    pub phase: TouchPhase,
    /// The element whose routing raised the fault.
    pub element: ElementId,
    source: FaultSource,
}

impl RoutingFault {
    /// Wrap a hook failure with its routing context.
    #[must_use]
    pub fn new(phase: TouchPhase, element: ElementId, source: FaultSource) -> Self {
        Self {
            phase,
            element,
            source,
        }
    }

    /// The underlying hook error.
    #[must_use]
    pub fn source_err(&self) -> &(dyn std::error::Error + 'static) {
        self.source.as_ref()
    }
}

impl fmt::Display for RoutingFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pointer routing fault in {:?} on {}: {}",
            self.phase, self.element, self.source
        )
    }
}

impl std::error::Error for RoutingFault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Process-wide sink for recoverable routing faults.
pub trait FaultSink {
    /// Report one fault. Must not fail and must not panic.
    fn report(&mut self, fault: RoutingFault);
}

/// Default sink: reports faults through `tracing::warn!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFaultSink;

impl FaultSink for TracingFaultSink {
    fn report(&mut self, fault: RoutingFault) {
        tracing::warn!(
            phase = ?fault.phase,
            element = %fault.element,
            error = %fault.source_err(),
            "recoverable pointer routing fault"
        );
    }
}

/// Sink that retains reported faults.
///
/// Clones share the same backing store, so a test can keep one handle and
/// hand another to the input context.
#[derive(Debug, Clone, Default)]
pub struct CollectingFaultSink {
    faults: Rc<RefCell<Vec<RoutingFault>>>,
}

impl CollectingFaultSink {
    /// Create an empty collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of faults reported so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.faults.borrow().len()
    }

    /// True if nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faults.borrow().is_empty()
    }

    /// Take all reported faults, leaving the sink empty.
    #[must_use]
    pub fn drain(&self) -> Vec<RoutingFault> {
        self.faults.borrow_mut().drain(..).collect()
    }
}

impl FaultSink for CollectingFaultSink {
    fn report(&mut self, fault: RoutingFault) {
        self.faults.borrow_mut().push(fault);
    }
}
