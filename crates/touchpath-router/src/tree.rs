#![forbid(unsafe_code)]

//! Element-tree collaborator seams.
//!
//! The element tree itself is not implemented here: the host supplies
//! parent traversal through [`AncestorWalk`] and per-element behavior
//! through [`PointerTarget`]. Routing only ever walks upward and calls
//! hooks; it never enumerates children or mutates the tree.

use touchpath_core::event::{ElementId, PointerEventArgs};
use touchpath_core::fault::FaultSource;
use touchpath_core::geometry::Point;

/// Upward traversal of the host's element tree.
///
/// Ancestry must be acyclic; the walk ends at the first element with no
/// parent (the tree root).
pub trait AncestorWalk {
    /// The parent of `element`, or `None` at the root.
    fn parent_of(&self, element: ElementId) -> Option<ElementId>;
}

/// Any child-to-parent map works as an ancestor walk; handy for hosts that
/// mirror their tree into a map, and for tests.
impl<S: std::hash::BuildHasher> AncestorWalk for std::collections::HashMap<ElementId, ElementId, S> {
    fn parent_of(&self, element: ElementId) -> Option<ElementId> {
        self.get(&element).copied()
    }
}

/// Per-element pointer hooks and hit-testing.
///
/// Each hook returns `Ok(true)` when the event was handled (or is bubbling)
/// in managed code, which is what drives frame-id suppression and the
/// native-propagation decision. A hook failure is a recoverable fault: it
/// is reported to the input context's fault sink and never reaches the
/// host platform.
///
/// All hooks except the hit-test default to "not handled", so an element
/// only implements what it reacts to.
pub trait PointerTarget {
    /// Is `position` currently over this element? Recomputed on every Move
    /// since the platform has no per-element enter/exit notifications.
    fn is_over(&self, position: Point) -> bool;

    /// Pointer came over the element (precedes Down within a Began batch).
    fn on_pointer_enter(&mut self, args: &PointerEventArgs) -> Result<bool, FaultSource> {
        let _ = args;
        Ok(false)
    }

    /// Pointer made contact.
    fn on_pointer_down(&mut self, args: &PointerEventArgs) -> Result<bool, FaultSource> {
        let _ = args;
        Ok(false)
    }

    /// Pointer moved. `is_over` carries the over/out transition computed
    /// from the hit-test; synthesized Moves (flick normalization) are
    /// delivered with `is_over = true`.
    fn on_pointer_move(
        &mut self,
        args: &PointerEventArgs,
        is_over: bool,
    ) -> Result<bool, FaultSource> {
        let _ = (args, is_over);
        Ok(false)
    }

    /// Pointer lifted.
    fn on_pointer_up(&mut self, args: &PointerEventArgs) -> Result<bool, FaultSource> {
        let _ = args;
        Ok(false)
    }

    /// Pointer left the element (follows Up within an Ended batch).
    fn on_pointer_exited(&mut self, args: &PointerEventArgs) -> Result<bool, FaultSource> {
        let _ = args;
        Ok(false)
    }

    /// The pointer stream was taken away. `swallowed_by_system` is always
    /// true today: the platform does not say why it cancelled, and the
    /// usual reason is an ancestor scroll view claiming the gesture.
    fn on_pointer_cancel(
        &mut self,
        args: &PointerEventArgs,
        swallowed_by_system: bool,
    ) -> Result<bool, FaultSource> {
        let _ = (args, swallowed_by_system);
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn hashmap_walk_follows_parents_to_root() {
        let mut tree = HashMap::new();
        tree.insert(ElementId::new(3), ElementId::new(2));
        tree.insert(ElementId::new(2), ElementId::new(1));
        assert_eq!(tree.parent_of(ElementId::new(3)), Some(ElementId::new(2)));
        assert_eq!(tree.parent_of(ElementId::new(2)), Some(ElementId::new(1)));
        assert_eq!(tree.parent_of(ElementId::new(1)), None);
    }

    #[test]
    fn default_hooks_do_not_handle() {
        struct Passive;
        impl PointerTarget for Passive {
            fn is_over(&self, _position: Point) -> bool {
                true
            }
        }
        let mut p = Passive;
        let args = PointerEventArgs::from_record(
            touchpath_core::PointerId::new(0),
            touchpath_core::FrameId::new(1),
            &touchpath_core::TouchRecord::new(
                touchpath_core::TouchHandle::new(1),
                Point::ZERO,
                0,
            ),
            ElementId::new(1),
        );
        assert!(!p.on_pointer_enter(&args).unwrap());
        assert!(!p.on_pointer_down(&args).unwrap());
        assert!(!p.on_pointer_move(&args, true).unwrap());
        assert!(!p.on_pointer_up(&args).unwrap());
        assert!(!p.on_pointer_exited(&args).unwrap());
        assert!(!p.on_pointer_cancel(&args, true).unwrap());
    }
}
