#![forbid(unsafe_code)]

//! Per-element event routing: native phases in, pointer events out.
//!
//! One [`EventRouter`] exists per interactive element. Each native phase
//! handler processes a batch of touch records in a single call and returns
//! the [`NativePropagation`] decision the host must apply to its native
//! chain.
//!
//! # State Machine
//!
//! - **Began** acquires a session per record, captures the Down state on
//!   the originating element, and routes Enter then Down, unless the same
//!   phase occurrence was already absorbed in managed code (frame-id
//!   dedup while the event bubbles natively).
//! - **Moved** recomputes over/out from the hit-test and routes a Move.
//! - **Ended** synthesizes the missing Move for flick-style touches, then
//!   routes Up and Exited, and releases the element's lease.
//! - **Cancelled** routes a single Cancel and releases, mirroring Ended's
//!   cleanup without Up/Exited or Move synthesis.
//!
//! # Invariants
//!
//! 1. Within one phase call, records are processed in native delivery
//!    order; Enter precedes Down; a synthesized Move precedes Up; Up
//!    precedes Exited.
//! 2. Every completed gesture routes at least one Move.
//! 3. Began never stops native bubbling: suppression of managed
//!    re-delivery is tracked per-session via frame ids, so scroll
//!    containers that rely on native bubbling keep receiving the stream.
//! 4. Terminal phases always release leases and manipulation-active state,
//!    fault or no fault.
//!
//! # Failure Modes
//!
//! - A hook fault terminates managed routing for the rest of the batch, is
//!   reported to the context's fault sink, and never suppresses the
//!   native-propagation decision: the host platform always gets its
//!   terminal callback.
//! - Records whose handle has no live session (Began was suspended, or a
//!   duplicate Cancel) are skipped silently.

use touchpath_core::event::{
    ElementId, FrameId, NativePropagation, PointerEventArgs, TouchPhase, TouchRecord,
};
use touchpath_core::fault::{FaultSource, RoutingFault};
use touchpath_core::manipulation::{GestureIntent, Manipulation, ManipulationMode};

use crate::arbiter::SurfaceId;
use crate::context::InputContext;
use crate::tree::{AncestorWalk, PointerTarget};

/// Routing state for one interactive element.
#[derive(Debug)]
pub struct EventRouter {
    element: ElementId,
    manipulation_mode: ManipulationMode,
    can_drag: bool,
    subscriptions: Vec<SurfaceId>,
    is_manipulating: bool,
}

impl EventRouter {
    /// Create a router for `element` with the default manipulation mode
    /// (`System`, not draggable) and no ancestor subscriptions.
    #[must_use]
    pub fn new(element: ElementId) -> Self {
        Self {
            element,
            manipulation_mode: ManipulationMode::System,
            can_drag: false,
            subscriptions: Vec::new(),
            is_manipulating: false,
        }
    }

    /// The element this router belongs to.
    #[inline]
    #[must_use]
    pub const fn element(&self) -> ElementId {
        self.element
    }

    /// Current manipulation mode.
    #[inline]
    #[must_use]
    pub const fn manipulation_mode(&self) -> ManipulationMode {
        self.manipulation_mode
    }

    /// Whether the element is drag-capable.
    #[inline]
    #[must_use]
    pub const fn can_drag(&self) -> bool {
        self.can_drag
    }

    /// Whether a manipulation of this element is currently suppressing
    /// ancestor cancel-ability.
    #[inline]
    #[must_use]
    pub const fn is_manipulating(&self) -> bool {
        self.is_manipulating
    }

    /// Currently subscribed ancestor surfaces, nearest first.
    #[must_use]
    pub fn subscriptions(&self) -> &[SurfaceId] {
        &self.subscriptions
    }

    // -----------------------------------------------------------------
    // Native phase handlers
    // -----------------------------------------------------------------

    /// Handle a native Began batch.
    ///
    /// Returns [`NativePropagation::Stop`] only while pointer routing is
    /// globally suspended (which also prevents session creation, so the
    /// touch's later phases become no-ops); otherwise always Forward.
    pub fn touches_began(
        &mut self,
        ctx: &mut InputContext,
        target: &mut dyn PointerTarget,
        frame: FrameId,
        touches: &[TouchRecord],
    ) -> NativePropagation {
        if ctx.pointers_suspended() {
            tracing::trace!(element = %self.element, "routing suspended, Began dropped");
            return NativePropagation::Stop;
        }
        tracing::trace!(element = %self.element, ?frame, count = touches.len(), "touches began");

        if self.manipulation_mode == ManipulationMode::None {
            // Gestures disabled on this element: suppress ancestor
            // scrollers directly on pointer pressed.
            self.notify_manipulation_started(ctx);
        }

        let mut handled_any = false;
        let mut faulted = false;
        for record in touches {
            let session = ctx.sessions.acquire(self.element, record.handle);
            let args = PointerEventArgs::from_record(session.id(), frame, record, self.element);

            // Only the first element to see the touch (the topmost target)
            // captures the Down state.
            if session.down_args.is_none() {
                session.down_args = Some(args.clone());
            }

            // This occurrence already went through managed routing further
            // down the chain.
            if session.last_managed_only_frame >= frame {
                continue;
            }

            if !faulted {
                match Self::route_enter_down(target, &args) {
                    Ok(handled) => handled_any |= handled,
                    Err(source) => {
                        ctx.report_fault(RoutingFault::new(TouchPhase::Began, self.element, source));
                        faulted = true;
                    }
                }
            }
            if handled_any && let Some(session) = ctx.sessions.get_mut(record.handle) {
                session.last_managed_only_frame = frame;
            }
        }

        // Never stop native bubbling of Began: if ancestors miss it, the
        // platform will not deliver Moved/Ended to them at all.
        NativePropagation::Forward
    }

    /// Handle a native Moved batch.
    pub fn touches_moved(
        &mut self,
        ctx: &mut InputContext,
        target: &mut dyn PointerTarget,
        frame: FrameId,
        touches: &[TouchRecord],
    ) -> NativePropagation {
        let mut handled_any = false;
        for record in touches {
            let Some(session) = ctx.sessions.get_mut(record.handle) else {
                continue;
            };
            // Kept on the session: the platform does implicit captures, so
            // this move reaches every element leasing the session.
            session.had_move = true;
            let args = PointerEventArgs::from_record(session.id(), frame, record, self.element);

            // No native enter/exit notifications exist; over/out is
            // recomputed from the hit-test on every move.
            let is_over = target.is_over(record.position);
            match target.on_pointer_move(&args, is_over) {
                Ok(handled) => handled_any |= handled,
                Err(source) => {
                    ctx.report_fault(RoutingFault::new(TouchPhase::Moved, self.element, source));
                    break;
                }
            }
        }
        Self::propagation_unless(handled_any)
    }

    /// Handle a native Ended batch.
    pub fn touches_ended(
        &mut self,
        ctx: &mut InputContext,
        target: &mut dyn PointerTarget,
        frame: FrameId,
        touches: &[TouchRecord],
    ) -> NativePropagation {
        tracing::trace!(element = %self.element, ?frame, count = touches.len(), "touches ended");
        let mut handled_any = false;
        let mut faulted = false;
        for record in touches {
            let Some(session) = ctx.sessions.get_mut(record.handle) else {
                continue;
            };
            let needs_synth = !session.had_move;
            // The synthesized move bubbles in managed code too; flip the
            // flag before routing so ancestors do not synthesize again.
            session.had_move = true;
            let down = if needs_synth {
                session.down_args.clone()
            } else {
                None
            };
            let args = PointerEventArgs::from_record(session.id(), frame, record, self.element);

            if !faulted {
                match Self::route_up_exited(target, &args, down.as_ref()) {
                    Ok(handled) => handled_any |= handled,
                    Err(source) => {
                        ctx.report_fault(RoutingFault::new(TouchPhase::Ended, self.element, source));
                        faulted = true;
                    }
                }
            }

            // Guaranteed cleanup, fault or not.
            ctx.sessions.release(self.element, record.handle);
        }

        self.notify_manipulation_ended(ctx);
        Self::propagation_unless(handled_any)
    }

    /// Handle a native Cancelled batch.
    ///
    /// Mirrors Ended's cleanup without the Up/Exited routing or Move
    /// synthesis. Every cancellation is treated as system-initiated capture
    /// loss: the platform does not distinguish reasons, and the usual one
    /// is an ancestor scroll view claiming the gesture.
    pub fn touches_cancelled(
        &mut self,
        ctx: &mut InputContext,
        target: &mut dyn PointerTarget,
        frame: FrameId,
        touches: &[TouchRecord],
    ) -> NativePropagation {
        let mut handled_any = false;
        let mut faulted = false;
        for record in touches {
            let Some(session) = ctx.sessions.get_mut(record.handle) else {
                continue;
            };
            let args = PointerEventArgs::from_record(session.id(), frame, record, self.element);

            if !faulted {
                match target.on_pointer_cancel(&args, true) {
                    Ok(handled) => handled_any |= handled,
                    Err(source) => {
                        ctx.report_fault(RoutingFault::new(
                            TouchPhase::Cancelled,
                            self.element,
                            source,
                        ));
                        faulted = true;
                    }
                }
            }

            ctx.sessions.release(self.element, record.handle);
        }

        self.notify_manipulation_ended(ctx);
        Self::propagation_unless(handled_any)
    }

    fn route_enter_down(
        target: &mut dyn PointerTarget,
        args: &PointerEventArgs,
    ) -> Result<bool, FaultSource> {
        let mut handled = target.on_pointer_enter(args)?;
        handled |= target.on_pointer_down(args)?;
        Ok(handled)
    }

    fn route_up_exited(
        target: &mut dyn PointerTarget,
        args: &PointerEventArgs,
        down: Option<&PointerEventArgs>,
    ) -> Result<bool, FaultSource> {
        if let Some(down) = down {
            // Fast flicks can arrive as Began immediately followed by
            // Ended, but manipulation detection needs at least one Move
            // per gesture; synthesize it from the captured Down to the
            // final position. Its handled result is unrelated to the Up
            // and deliberately ignored.
            let synth = PointerEventArgs::merged(down, args);
            target.on_pointer_move(&synth, true)?;
        }
        let mut handled = target.on_pointer_up(args)?;
        handled |= target.on_pointer_exited(args)?;
        Ok(handled)
    }

    const fn propagation_unless(handled_any: bool) -> NativePropagation {
        if handled_any {
            NativePropagation::Stop
        } else {
            NativePropagation::Forward
        }
    }

    // -----------------------------------------------------------------
    // Ancestor arbiter subscriptions
    // -----------------------------------------------------------------

    /// The element entered the tree; build its ancestor subscriptions.
    pub fn on_loaded(&mut self, ctx: &mut InputContext, tree: &dyn AncestorWalk) {
        self.prepare_subscriptions(ctx, tree);
    }

    /// The element left the tree; end any pending manipulation and release
    /// every subscription.
    pub fn on_unloaded(&mut self, ctx: &mut InputContext) {
        self.release_subscriptions(ctx);
    }

    /// Change the manipulation mode. The ancestor walk may be invoked
    /// early in the element's life, so no state is diffed between the old
    /// and new mode: the subscription set is released and rebuilt.
    pub fn set_manipulation_mode(
        &mut self,
        mode: ManipulationMode,
        ctx: &mut InputContext,
        tree: &dyn AncestorWalk,
    ) {
        self.manipulation_mode = mode;
        self.prepare_subscriptions(ctx, tree);
    }

    /// Change drag capability; rebuilds subscriptions like a mode change.
    pub fn set_can_drag(
        &mut self,
        can_drag: bool,
        ctx: &mut InputContext,
        tree: &dyn AncestorWalk,
    ) {
        self.can_drag = can_drag;
        self.prepare_subscriptions(ctx, tree);
    }

    fn prepare_subscriptions(&mut self, ctx: &mut InputContext, tree: &dyn AncestorWalk) {
        self.release_subscriptions(ctx);

        // An element that leaves every gesture to the platform has no
        // reason to suppress ancestor delays.
        if self.manipulation_mode != ManipulationMode::System || self.can_drag {
            self.subscriptions = ctx.arbiters.collect_ancestors(tree, self.element);
            tracing::debug!(
                element = %self.element,
                surfaces = self.subscriptions.len(),
                "subscribed to ancestor touch arbiters"
            );
            for id in &self.subscriptions {
                if let Some(arbiter) = ctx.arbiters.get_mut(*id) {
                    arbiter.register_child_listener();
                }
            }
        }
    }

    fn release_subscriptions(&mut self, ctx: &mut InputContext) {
        // End any pending manipulation first, while the subscriptions that
        // were promoted by it are still present.
        self.notify_manipulation_ended(ctx);
        for id in std::mem::take(&mut self.subscriptions) {
            if let Some(arbiter) = ctx.arbiters.get_mut(id) {
                arbiter.unregister_child_listener();
            }
        }
    }

    // -----------------------------------------------------------------
    // Gesture recognizer notifications
    // -----------------------------------------------------------------

    /// Feed a gesture-recognizer lifecycle notification into arbitration.
    ///
    /// `DragReady` maps to started rather than starting: the press was held
    /// long enough that any move will begin the drag, so ancestors must
    /// already be prevented from cancelling the stream.
    pub fn on_gesture_intent(&mut self, ctx: &mut InputContext, intent: &GestureIntent) {
        match intent {
            GestureIntent::ManipulationConfigured(manipulation) => {
                self.notify_manipulation_starting(ctx, manipulation);
            }
            GestureIntent::ManipulationStarted
            | GestureIntent::DragReady
            | GestureIntent::DragStarted => self.notify_manipulation_started(ctx),
            GestureIntent::ManipulationCompleted
            | GestureIntent::ManipulationAborted
            | GestureIntent::DragCompleted
            | GestureIntent::DragAborted => self.notify_manipulation_ended(ctx),
        }
    }

    fn notify_manipulation_starting(&mut self, ctx: &mut InputContext, manipulation: &Manipulation) {
        if self.is_manipulating || self.subscriptions.is_empty() {
            return;
        }
        let mut promoted = false;
        for id in &self.subscriptions {
            if let Some(arbiter) = ctx.arbiters.get_mut(*id) {
                promoted |= arbiter.manipulation_starting(manipulation);
            }
        }
        self.is_manipulating = promoted;
    }

    fn notify_manipulation_started(&mut self, ctx: &mut InputContext) {
        if self.is_manipulating || self.subscriptions.is_empty() {
            return;
        }
        self.is_manipulating = true;
        for id in &self.subscriptions {
            if let Some(arbiter) = ctx.arbiters.get_mut(*id) {
                arbiter.manipulation_started();
            }
        }
    }

    fn notify_manipulation_ended(&mut self, ctx: &mut InputContext) {
        if !self.is_manipulating || self.subscriptions.is_empty() {
            return;
        }
        self.is_manipulating = false;
        for id in &self.subscriptions {
            if let Some(arbiter) = ctx.arbiters.get_mut(*id) {
                arbiter.manipulation_ended();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::ScrollSurface;
    use std::collections::HashMap;
    use touchpath_core::manipulation::ManipulationCaps;

    const CHILD: ElementId = ElementId::new(10);
    const INNER_SV: ElementId = ElementId::new(20);
    const OUTER_SV: ElementId = ElementId::new(30);

    /// child → inner scroll view → outer scroll view → root.
    fn fixture() -> (InputContext, HashMap<ElementId, ElementId>, ScrollSurface, ScrollSurface) {
        let mut ctx = InputContext::new();
        let mut tree = HashMap::new();
        tree.insert(CHILD, INNER_SV);
        tree.insert(INNER_SV, OUTER_SV);
        tree.insert(OUTER_SV, ElementId::new(1));

        let inner = ScrollSurface::new();
        let outer = ScrollSurface::new();
        ctx.arbiters
            .register_surface(INNER_SV, Box::new(inner.clone()));
        ctx.arbiters
            .register_surface(OUTER_SV, Box::new(outer.clone()));
        (ctx, tree, inner, outer)
    }

    #[test]
    fn system_mode_without_drag_never_subscribes() {
        let (mut ctx, tree, inner, outer) = fixture();
        let mut router = EventRouter::new(CHILD);
        router.on_loaded(&mut ctx, &tree);
        assert!(router.subscriptions().is_empty());
        assert!(inner.can_delay());
        assert!(outer.can_delay());
    }

    #[test]
    fn custom_mode_subscribes_both_ancestors() {
        let (mut ctx, tree, inner, outer) = fixture();
        let mut router = EventRouter::new(CHILD);
        router.set_manipulation_mode(
            ManipulationMode::Custom(ManipulationCaps::TRANSLATE_X),
            &mut ctx,
            &tree,
        );
        assert_eq!(router.subscriptions(), &[INNER_SV, OUTER_SV]);
        assert!(!inner.can_delay());
        assert!(!outer.can_delay());

        router.on_unloaded(&mut ctx);
        assert!(router.subscriptions().is_empty());
        assert!(inner.can_delay());
        assert!(outer.can_delay());
    }

    #[test]
    fn drag_capability_alone_subscribes() {
        let (mut ctx, tree, inner, _outer) = fixture();
        let mut router = EventRouter::new(CHILD);
        router.set_can_drag(true, &mut ctx, &tree);
        assert_eq!(router.subscriptions().len(), 2);
        assert!(!inner.can_delay());

        router.set_can_drag(false, &mut ctx, &tree);
        assert!(router.subscriptions().is_empty());
        assert!(inner.can_delay());
    }

    #[test]
    fn mode_change_rebuilds_without_duplicate_registration() {
        let (mut ctx, tree, inner, _outer) = fixture();
        let mut router = EventRouter::new(CHILD);
        router.set_manipulation_mode(
            ManipulationMode::Custom(ManipulationCaps::TRANSLATE_Y),
            &mut ctx,
            &tree,
        );
        router.set_manipulation_mode(ManipulationMode::None, &mut ctx, &tree);
        assert_eq!(ctx.arbiters.get(INNER_SV).unwrap().listeners(), 1);
        assert!(!inner.can_delay());

        router.set_manipulation_mode(ManipulationMode::System, &mut ctx, &tree);
        assert_eq!(ctx.arbiters.get(INNER_SV).unwrap().listeners(), 0);
        assert!(inner.can_delay());
    }

    #[test]
    fn conflicting_candidate_promotes_until_ended() {
        let (mut ctx, tree, inner, outer) = fixture();
        let mut router = EventRouter::new(CHILD);
        router.set_can_drag(true, &mut ctx, &tree);

        let vertical = Manipulation::new(ManipulationCaps::TRANSLATE_Y);
        router.on_gesture_intent(&mut ctx, &GestureIntent::ManipulationConfigured(vertical));
        assert!(router.is_manipulating());
        assert!(!inner.can_cancel());
        assert!(!outer.can_cancel());

        router.on_gesture_intent(&mut ctx, &GestureIntent::ManipulationCompleted);
        assert!(!router.is_manipulating());
        assert!(inner.can_cancel());
        assert!(outer.can_cancel());
    }

    #[test]
    fn non_conflicting_candidate_changes_nothing() {
        let (mut ctx, tree, inner, _outer) = fixture();
        let mut router = EventRouter::new(CHILD);
        router.set_can_drag(true, &mut ctx, &tree);

        let rotate = Manipulation::new(ManipulationCaps::ROTATE);
        router.on_gesture_intent(&mut ctx, &GestureIntent::ManipulationConfigured(rotate));
        assert!(!router.is_manipulating());
        assert!(inner.can_cancel());
    }

    #[test]
    fn started_family_is_edge_triggered() {
        let (mut ctx, tree, inner, _outer) = fixture();
        let mut router = EventRouter::new(CHILD);
        router.set_can_drag(true, &mut ctx, &tree);

        router.on_gesture_intent(&mut ctx, &GestureIntent::DragReady);
        router.on_gesture_intent(&mut ctx, &GestureIntent::DragStarted);
        // Second start is absorbed; one ended fully restores.
        assert_eq!(ctx.arbiters.get(INNER_SV).unwrap().active_listeners(), 1);
        router.on_gesture_intent(&mut ctx, &GestureIntent::DragCompleted);
        assert!(inner.can_cancel());
        assert!(!router.is_manipulating());
    }

    #[test]
    fn unload_ends_pending_manipulation_before_unregister() {
        let (mut ctx, tree, inner, _outer) = fixture();
        let mut router = EventRouter::new(CHILD);
        router.set_can_drag(true, &mut ctx, &tree);
        router.on_gesture_intent(&mut ctx, &GestureIntent::DragStarted);
        assert!(!inner.can_cancel());

        router.on_unloaded(&mut ctx);
        assert!(inner.can_cancel(), "pending manipulation ended on unload");
        assert!(inner.can_delay(), "listener unregistered on unload");
        assert_eq!(ctx.arbiters.get(INNER_SV).unwrap().active_listeners(), 0);
    }

    #[test]
    fn surfaces_removed_mid_subscription_are_skipped() {
        let (mut ctx, tree, _inner, _outer) = fixture();
        let mut router = EventRouter::new(CHILD);
        router.set_can_drag(true, &mut ctx, &tree);
        // The inner surface tears down while the child is still subscribed.
        ctx.arbiters.unregister_surface(INNER_SV);
        // Both notification and release tolerate the gone surface.
        router.on_gesture_intent(&mut ctx, &GestureIntent::DragStarted);
        router.on_unloaded(&mut ctx);
        assert_eq!(ctx.arbiters.get(OUTER_SV).unwrap().listeners(), 0);
    }
}
