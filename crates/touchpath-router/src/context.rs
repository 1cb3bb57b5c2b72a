#![forbid(unsafe_code)]

//! Root input context.
//!
//! One [`InputContext`] per input root owns everything that would otherwise
//! be process-wide mutable state: the session registry (and with it the
//! next-pointer-id counter), the arbiter arena, the global routing
//! suspension flag, the frame counter, and the fault sink. The host constructs it explicitly
//! and passes it to every routing call, which keeps initialization and
//! teardown visible and testable. There are no hidden globals anywhere in
//! the crate.

use std::fmt;

use touchpath_core::event::FrameId;
use touchpath_core::fault::{FaultSink, RoutingFault, TracingFaultSink};
use touchpath_core::session::PointerSessionRegistry;

use crate::arbiter::ArbiterArena;

/// Shared routing state for one input root.
pub struct InputContext {
    /// Live pointer sessions.
    pub sessions: PointerSessionRegistry,
    /// Arbiters of every registered scrollable surface.
    pub arbiters: ArbiterArena,
    suspended: bool,
    frame: FrameId,
    faults: Box<dyn FaultSink>,
}

impl fmt::Debug for InputContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputContext")
            .field("active_sessions", &self.sessions.active_sessions())
            .field("suspended", &self.suspended)
            .finish_non_exhaustive()
    }
}

impl Default for InputContext {
    fn default() -> Self {
        Self::new()
    }
}

impl InputContext {
    /// Create a context reporting faults through [`TracingFaultSink`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_fault_sink(Box::new(TracingFaultSink))
    }

    /// Create a context with an explicit fault sink.
    #[must_use]
    pub fn with_fault_sink(faults: Box<dyn FaultSink>) -> Self {
        Self {
            sessions: PointerSessionRegistry::new(),
            arbiters: ArbiterArena::new(),
            suspended: false,
            frame: FrameId::ZERO,
            faults,
        }
    }

    /// Allocate the frame id for the next phase occurrence. Every native
    /// re-delivery of one occurrence up the chain must reuse the same id;
    /// hosts whose platform already numbers occurrences can ignore this.
    pub fn next_frame(&mut self) -> FrameId {
        self.frame = FrameId::new(self.frame.0 + 1);
        self.frame
    }

    /// Suspend or resume pointer routing (boundary signal, e.g. while a
    /// modal overlay owns input). Checked only at Began: touches already in
    /// flight still get their terminal cleanup.
    pub fn set_pointers_suspended(&mut self, suspended: bool) {
        if self.suspended != suspended {
            tracing::debug!(suspended, "pointer routing suspension changed");
        }
        self.suspended = suspended;
    }

    /// Whether pointer routing is currently suspended.
    #[inline]
    #[must_use]
    pub const fn pointers_suspended(&self) -> bool {
        self.suspended
    }

    /// Report a recoverable routing fault to the sink.
    pub fn report_fault(&mut self, fault: RoutingFault) {
        self.faults.report(fault);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use touchpath_core::event::{ElementId, TouchPhase};
    use touchpath_core::fault::CollectingFaultSink;

    #[test]
    fn suspension_toggles() {
        let mut ctx = InputContext::new();
        assert!(!ctx.pointers_suspended());
        ctx.set_pointers_suspended(true);
        assert!(ctx.pointers_suspended());
        ctx.set_pointers_suspended(false);
        assert!(!ctx.pointers_suspended());
    }

    #[test]
    fn faults_reach_the_sink() {
        let sink = CollectingFaultSink::new();
        let mut ctx = InputContext::with_fault_sink(Box::new(sink.clone()));
        ctx.report_fault(RoutingFault::new(
            TouchPhase::Moved,
            ElementId::new(1),
            "boom".into(),
        ));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn frame_ids_are_strictly_increasing_from_one() {
        let mut ctx = InputContext::new();
        let a = ctx.next_frame();
        let b = ctx.next_frame();
        assert_eq!(a, touchpath_core::FrameId::new(1));
        assert!(b > a);
    }

    #[test]
    fn debug_is_summary_only() {
        let ctx = InputContext::new();
        let dbg = format!("{ctx:?}");
        assert!(dbg.contains("InputContext"));
        assert!(dbg.contains("active_sessions"));
    }
}
