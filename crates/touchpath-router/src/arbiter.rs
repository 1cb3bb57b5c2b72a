#![forbid(unsafe_code)]

//! Manipulation arbitration: touch-delay/cancel policy per ancestor surface.
//!
//! A scrollable ancestor normally *delays* delivering touches to its
//! content (to decide whether the gesture is a scroll) and may *cancel*
//! in-progress content touches once it recognizes its own gesture. A
//! descendant that wants to own gestures itself (a slider thumb, a drag
//! handle) must suppress both behaviors on every qualifying ancestor while
//! it is active, and restore them exactly when it is done.
//!
//! [`TouchArbiter`] makes that safe under multiple concurrent listeners by
//! reference counting:
//!
//! - `listeners`: descendants registered as manipulation-capable; the
//!   surface's delay is disabled while the count is non-zero.
//! - `active_listeners`: descendants currently tracking a manipulation;
//!   the surface's cancel-ability is disabled while non-zero.
//!
//! Surface flag writes happen only on the 0↔1 transitions.
//!
//! # Failure Modes
//!
//! - Decrementing a counter already at zero is a caller contract violation
//!   (an unmatched unregister/ended). It saturates with a `tracing::warn!`
//!   rather than panicking: a panic inside event delivery would break the
//!   always-forward guarantee.
//! - Asking the arena for a surface that never registered the capability is
//!   a structural tree-building mistake and surfaces as a hard
//!   [`ArbiterError`] from [`ArbiterArena::expect_mut`]; the common
//!   "not supported, skip it" path uses the `Option`-returning lookups.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use touchpath_core::event::ElementId;
use touchpath_core::manipulation::Manipulation;

use crate::tree::AncestorWalk;

/// Identity of a surface in the arbiter arena. Surfaces are elements of the
/// host tree that registered delay/cancel capability.
pub type SurfaceId = ElementId;

/// Capability interface a container exposes to participate in arbitration.
///
/// Implemented only by surface kinds that can actually delay or cancel
/// their own touch delivery (a scrollable presenter, a virtualized list's
/// panel, an embedded web surface). Non-qualifying containers simply never
/// register and are skipped transparently during ancestor collection.
pub trait ArbiterSurface {
    /// Apply the delay policy to the native container.
    fn set_can_delay(&mut self, can_delay: bool);

    /// Apply the cancel policy to the native container.
    fn set_can_cancel(&mut self, can_cancel: bool);

    /// Does the candidate manipulation conflict with this surface's own
    /// gesture? For scrollable surfaces that is any horizontal translate,
    /// vertical translate, or drag.
    fn conflicts_with(&self, manipulation: &Manipulation) -> bool {
        manipulation.translates_x() || manipulation.translates_y() || manipulation.is_drag()
    }
}

/// Reference-counted delay/cancel policy controller for one surface.
pub struct TouchArbiter {
    listeners: u32,
    active_listeners: u32,
    surface: Box<dyn ArbiterSurface>,
}

impl fmt::Debug for TouchArbiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TouchArbiter")
            .field("listeners", &self.listeners)
            .field("active_listeners", &self.active_listeners)
            .finish_non_exhaustive()
    }
}

impl TouchArbiter {
    /// Wrap a surface. Counters start at zero: delay and cancel enabled.
    #[must_use]
    pub fn new(surface: Box<dyn ArbiterSurface>) -> Self {
        Self {
            listeners: 0,
            active_listeners: 0,
            surface,
        }
    }

    /// A descendant starts listening to touches for manipulations; the 0→1
    /// transition disables the surface's touch-delay.
    ///
    /// The caller must pair this with exactly one
    /// [`unregister_child_listener`](Self::unregister_child_listener)
    /// across its load/unload lifecycle.
    pub fn register_child_listener(&mut self) {
        if self.listeners == 0 {
            self.surface.set_can_delay(false);
        }
        self.listeners += 1;
    }

    /// A descendant stops listening; the 1→0 transition re-enables delay.
    pub fn unregister_child_listener(&mut self) {
        if self.listeners == 0 {
            tracing::warn!("unmatched unregister_child_listener ignored");
            return;
        }
        self.listeners -= 1;
        if self.listeners == 0 {
            self.surface.set_can_delay(true);
        }
    }

    /// A descendant's manipulation candidate may start. If it conflicts
    /// with this surface's own gesture, promotes state as if
    /// [`manipulation_started`](Self::manipulation_started) had been called
    /// and returns true; the caller must then eventually call
    /// [`manipulation_ended`](Self::manipulation_ended). Otherwise returns
    /// false and changes nothing.
    pub fn manipulation_starting(&mut self, manipulation: &Manipulation) -> bool {
        if self.surface.conflicts_with(manipulation) {
            self.manipulation_started();
            true
        } else {
            false
        }
    }

    /// A descendant started tracking a manipulation; the 0→1 transition
    /// disables the surface's ability to cancel in-flight content touches.
    pub fn manipulation_started(&mut self) {
        if self.active_listeners == 0 {
            self.surface.set_can_cancel(false);
        }
        self.active_listeners += 1;
    }

    /// A manipulation ended (success or failure); the 1→0 transition
    /// re-enables cancel-ability.
    pub fn manipulation_ended(&mut self) {
        if self.active_listeners == 0 {
            tracing::warn!("unmatched manipulation_ended ignored");
            return;
        }
        self.active_listeners -= 1;
        if self.active_listeners == 0 {
            self.surface.set_can_cancel(true);
        }
    }

    /// Descendants registered as manipulation-capable.
    #[inline]
    #[must_use]
    pub const fn listeners(&self) -> u32 {
        self.listeners
    }

    /// Descendants currently tracking a manipulation.
    #[inline]
    #[must_use]
    pub const fn active_listeners(&self) -> u32 {
        self.active_listeners
    }

    /// Derived policy: the surface may delay content touches.
    #[inline]
    #[must_use]
    pub const fn can_delay(&self) -> bool {
        self.listeners == 0
    }

    /// Derived policy: the surface may cancel in-flight content touches.
    #[inline]
    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        self.active_listeners == 0
    }
}

/// Hard failure for genuine arbitration protocol misuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbiterError {
    /// The surface never registered arbitration capability; requesting it
    /// indicates a structural tree-building mistake, not a runtime
    /// condition.
    UnsupportedSurface(SurfaceId),
}

impl fmt::Display for ArbiterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSurface(id) => write!(
                f,
                "{id} does not support touch arbitration (only scrollable content does)"
            ),
        }
    }
}

impl std::error::Error for ArbiterError {}

/// Arena of arbiters keyed by stable surface identity.
///
/// An arbiter's lifetime is tied to the surface's own registration and
/// teardown, not to whichever descendants happen to reference it.
#[derive(Debug, Default)]
pub struct ArbiterArena {
    arbiters: AHashMap<SurfaceId, TouchArbiter>,
}

impl ArbiterArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `surface` as arbitration-capable. Re-registering an id
    /// replaces the previous arbiter with a fresh one.
    pub fn register_surface(&mut self, id: SurfaceId, surface: Box<dyn ArbiterSurface>) {
        if self
            .arbiters
            .insert(id, TouchArbiter::new(surface))
            .is_some()
        {
            tracing::warn!(surface = %id, "surface re-registered, arbiter state reset");
        }
    }

    /// Tear the surface's arbiter down. Unknown ids are no-ops.
    pub fn unregister_surface(&mut self, id: SurfaceId) {
        self.arbiters.remove(&id);
    }

    /// Whether `id` registered arbitration capability.
    #[must_use]
    pub fn is_surface(&self, id: SurfaceId) -> bool {
        self.arbiters.contains_key(&id)
    }

    /// The arbiter for `id`, if the surface supports arbitration.
    #[must_use]
    pub fn get(&self, id: SurfaceId) -> Option<&TouchArbiter> {
        self.arbiters.get(&id)
    }

    /// Mutable lookup; `None` on the common "not supported" path.
    pub fn get_mut(&mut self, id: SurfaceId) -> Option<&mut TouchArbiter> {
        self.arbiters.get_mut(&id)
    }

    /// Mutable lookup that treats an unsupported surface as misuse.
    pub fn expect_mut(&mut self, id: SurfaceId) -> Result<&mut TouchArbiter, ArbiterError> {
        self.arbiters
            .get_mut(&id)
            .ok_or(ArbiterError::UnsupportedSurface(id))
    }

    /// Walk `element`'s ancestor chain once and collect every registered
    /// surface, nearest first. Non-qualifying ancestors are skipped
    /// transparently; the walk continues to the tree root.
    #[must_use]
    pub fn collect_ancestors(
        &self,
        tree: &dyn AncestorWalk,
        element: ElementId,
    ) -> Vec<SurfaceId> {
        let mut out = Vec::new();
        let mut current = element;
        while let Some(parent) = tree.parent_of(current) {
            if self.is_surface(parent) {
                out.push(parent);
            }
            current = parent;
        }
        out
    }
}

/// Ready-made [`ArbiterSurface`] for scroll-view-like containers: a pair of
/// delay/cancel flags behind a shared handle, readable by the host while
/// the boxed surface lives in the arena.
///
/// Both flags start true, matching a native scroll container's defaults.
#[derive(Debug, Clone, Default)]
pub struct ScrollSurface {
    flags: Rc<RefCell<ScrollFlags>>,
}

#[derive(Debug)]
struct ScrollFlags {
    can_delay: bool,
    can_cancel: bool,
}

impl Default for ScrollFlags {
    fn default() -> Self {
        Self {
            can_delay: true,
            can_cancel: true,
        }
    }
}

impl ScrollSurface {
    /// Create a surface with delay and cancel enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current delay flag.
    #[must_use]
    pub fn can_delay(&self) -> bool {
        self.flags.borrow().can_delay
    }

    /// Current cancel flag.
    #[must_use]
    pub fn can_cancel(&self) -> bool {
        self.flags.borrow().can_cancel
    }
}

impl ArbiterSurface for ScrollSurface {
    fn set_can_delay(&mut self, can_delay: bool) {
        self.flags.borrow_mut().can_delay = can_delay;
    }

    fn set_can_cancel(&mut self, can_cancel: bool) {
        self.flags.borrow_mut().can_cancel = can_cancel;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use touchpath_core::manipulation::ManipulationCaps;

    fn arbiter() -> (TouchArbiter, ScrollSurface) {
        let surface = ScrollSurface::new();
        (TouchArbiter::new(Box::new(surface.clone())), surface)
    }

    fn manip(caps: ManipulationCaps) -> Manipulation {
        Manipulation::new(caps)
    }

    #[test]
    fn register_disables_delay_on_first_listener_only() {
        let (mut arb, surface) = arbiter();
        assert!(surface.can_delay());
        arb.register_child_listener();
        assert!(!surface.can_delay());
        arb.register_child_listener();
        assert!(!surface.can_delay());
        arb.unregister_child_listener();
        assert!(!surface.can_delay(), "one listener still registered");
        arb.unregister_child_listener();
        assert!(surface.can_delay(), "last unregister restores delay");
        assert_eq!(arb.listeners(), 0);
    }

    #[test]
    fn unmatched_unregister_saturates() {
        let (mut arb, surface) = arbiter();
        arb.unregister_child_listener();
        assert_eq!(arb.listeners(), 0);
        assert!(surface.can_delay());
        // A later balanced pair still behaves.
        arb.register_child_listener();
        assert!(!surface.can_delay());
        arb.unregister_child_listener();
        assert!(surface.can_delay());
    }

    #[test]
    fn starting_conflicts_for_translate_and_drag_only() {
        for caps in [
            ManipulationCaps::TRANSLATE_X,
            ManipulationCaps::TRANSLATE_Y,
            ManipulationCaps::DRAG,
        ] {
            let (mut arb, surface) = arbiter();
            assert!(arb.manipulation_starting(&manip(caps)), "{caps:?}");
            assert!(!surface.can_cancel());
            arb.manipulation_ended();
            assert!(surface.can_cancel());
        }
        for caps in [
            ManipulationCaps::empty(),
            ManipulationCaps::ROTATE,
            ManipulationCaps::SCALE,
            ManipulationCaps::ROTATE | ManipulationCaps::SCALE,
        ] {
            let (mut arb, surface) = arbiter();
            assert!(!arb.manipulation_starting(&manip(caps)), "{caps:?}");
            assert!(surface.can_cancel());
            assert_eq!(arb.active_listeners(), 0);
        }
    }

    #[test]
    fn started_ended_toggle_cancel_on_boundary() {
        let (mut arb, surface) = arbiter();
        arb.manipulation_started();
        arb.manipulation_started();
        assert!(!surface.can_cancel());
        arb.manipulation_ended();
        assert!(!surface.can_cancel());
        arb.manipulation_ended();
        assert!(surface.can_cancel());
        // Unmatched end is ignored.
        arb.manipulation_ended();
        assert_eq!(arb.active_listeners(), 0);
    }

    #[test]
    fn derived_flags_follow_counters() {
        let (mut arb, _surface) = arbiter();
        assert!(arb.can_delay() && arb.can_cancel());
        arb.register_child_listener();
        arb.manipulation_started();
        assert!(!arb.can_delay() && !arb.can_cancel());
    }

    #[test]
    fn arena_expect_mut_rejects_unregistered_surface() {
        let mut arena = ArbiterArena::new();
        let id = ElementId::new(5);
        let err = arena.expect_mut(id).unwrap_err();
        assert_eq!(err, ArbiterError::UnsupportedSurface(id));
        assert!(err.to_string().contains("element#5"));

        arena.register_surface(id, Box::new(ScrollSurface::new()));
        assert!(arena.expect_mut(id).is_ok());
    }

    #[test]
    fn arena_lifecycle_is_noop_tolerant() {
        let mut arena = ArbiterArena::new();
        let id = ElementId::new(7);
        arena.unregister_surface(id);
        arena.register_surface(id, Box::new(ScrollSurface::new()));
        assert!(arena.is_surface(id));
        arena.unregister_surface(id);
        assert!(arena.get(id).is_none());
    }

    #[test]
    fn reregistering_resets_arbiter_state() {
        let mut arena = ArbiterArena::new();
        let id = ElementId::new(7);
        arena.register_surface(id, Box::new(ScrollSurface::new()));
        arena.get_mut(id).unwrap().register_child_listener();
        assert_eq!(arena.get(id).unwrap().listeners(), 1);
        arena.register_surface(id, Box::new(ScrollSurface::new()));
        assert_eq!(arena.get(id).unwrap().listeners(), 0);
    }

    #[test]
    fn collect_ancestors_skips_non_surfaces_up_to_root() {
        // 5 -> 4 -> 3 -> 2 -> 1; surfaces at 4 and 2.
        let mut tree = HashMap::new();
        for (child, parent) in [(5u64, 4u64), (4, 3), (3, 2), (2, 1)] {
            tree.insert(ElementId::new(child), ElementId::new(parent));
        }
        let mut arena = ArbiterArena::new();
        arena.register_surface(ElementId::new(4), Box::new(ScrollSurface::new()));
        arena.register_surface(ElementId::new(2), Box::new(ScrollSurface::new()));
        // Registered but not an ancestor of 5:
        arena.register_surface(ElementId::new(9), Box::new(ScrollSurface::new()));

        let collected = arena.collect_ancestors(&tree, ElementId::new(5));
        assert_eq!(collected, vec![ElementId::new(4), ElementId::new(2)]);

        // The element itself being a surface does not subscribe to itself.
        let collected = arena.collect_ancestors(&tree, ElementId::new(4));
        assert_eq!(collected, vec![ElementId::new(2)]);
    }
}
