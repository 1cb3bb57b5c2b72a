#![forbid(unsafe_code)]

//! Canonical pointer/touch event types.
//!
//! Native input arrives as batches of [`TouchRecord`]s, one batch per phase
//! occurrence ([`TouchPhase`]). The router normalizes each record into
//! [`PointerEventArgs`] carrying the stable [`PointerId`] of the touch's
//! session, and dispatches it to the element's pointer hooks as one of the
//! routed [`PointerEventKind`]s.
//!
//! # Design Notes
//!
//! - All identities are opaque newtypes; the library never interprets their
//!   numeric values.
//! - [`FrameId`] is a monotonic marker for one logical phase occurrence as
//!   it bubbles through the native chain; it is how re-delivery of the same
//!   occurrence to an ancestor is detected.
//! - Timestamps are host-reported and opaque; only their ordering matters.

use crate::geometry::Point;

/// Identity of one element in the host's element tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl ElementId {
    /// Create an element identity.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl core::fmt::Display for ElementId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Opaque identity of one native touch, as reported by the host platform.
///
/// Stable for the lifetime of a single physical contact; may be recycled by
/// the platform afterwards. This is the registry key for sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TouchHandle(pub u64);

impl TouchHandle {
    /// Wrap a raw native touch identity.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Stable logical pointer identity assigned by the session registry.
///
/// Unique among currently active sessions only; once the registry becomes
/// empty the numbering restarts at 0, so the first touch after a quiescent
/// period always gets id 0 (double-tap detection compares ids across
/// separate touch sequences).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u32);

impl PointerId {
    /// Create a pointer identity.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

impl core::fmt::Display for PointerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ptr#{}", self.0)
    }
}

/// Monotonic marker for one logical phase occurrence.
///
/// The host assigns the same frame id to every native re-delivery of one
/// phase occurrence as it bubbles up the chain; a strictly later occurrence
/// gets a strictly greater id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FrameId(pub u64);

impl FrameId {
    /// The zero frame, ordered before every real occurrence.
    pub const ZERO: Self = Self(0);

    /// Create a frame id.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Native touch phases, in host delivery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    /// A contact started.
    Began,
    /// A contact moved.
    Moved,
    /// A contact lifted normally.
    Ended,
    /// The system took the contact away (scroll kicked in, call arrived...).
    Cancelled,
}

/// One native touch record inside a phase batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchRecord {
    /// Opaque per-touch identity.
    pub handle: TouchHandle,
    /// Position in surface-local coordinates.
    pub position: Point,
    /// Host-reported timestamp, opaque units, ordering only.
    pub timestamp: u64,
}

impl TouchRecord {
    /// Create a touch record.
    #[inline]
    #[must_use]
    pub const fn new(handle: TouchHandle, position: Point, timestamp: u64) -> Self {
        Self {
            handle,
            position,
            timestamp,
        }
    }
}

/// Routed pointer event kinds, as delivered to element hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    /// Pointer came over the element.
    Enter,
    /// Pointer made contact.
    Down,
    /// Pointer moved (possibly synthesized for fast flicks).
    Move,
    /// Pointer lifted.
    Up,
    /// Pointer left the element.
    Exited,
    /// Pointer stream was taken away by the system.
    Cancel,
}

/// Arguments of one routed pointer event.
///
/// Built once per native record and shared by every event routed for that
/// record. The instance captured at the first Down (`down_args` on the
/// session) belongs to the originating element and is reused to synthesize
/// a Move when a flick ends without any native Moved.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEventArgs {
    /// Stable pointer identity of the session.
    pub pointer: PointerId,
    /// Phase occurrence this event was routed for.
    pub frame: FrameId,
    /// Current position.
    pub position: Point,
    /// Previous position, present only on synthesized Moves (the captured
    /// Down position).
    pub previous_position: Option<Point>,
    /// Host-reported timestamp of the underlying record.
    pub timestamp: u64,
    /// The element the event was first routed to (topmost target).
    pub original_source: ElementId,
}

impl PointerEventArgs {
    /// Build event args for one native record routed by `original_source`.
    #[must_use]
    pub fn from_record(
        pointer: PointerId,
        frame: FrameId,
        record: &TouchRecord,
        original_source: ElementId,
    ) -> Self {
        Self {
            pointer,
            frame,
            position: record.position,
            previous_position: None,
            timestamp: record.timestamp,
            original_source,
        }
    }

    /// Merge the captured Down args with the current record's args into the
    /// args of a synthesized Move: current identity, position, and
    /// timestamp, with the Down's position as `previous_position` and the
    /// Down's `original_source` (the topmost target of the gesture).
    #[must_use]
    pub fn merged(previous: &Self, current: &Self) -> Self {
        Self {
            pointer: current.pointer,
            frame: current.frame,
            position: current.position,
            previous_position: Some(previous.position),
            timestamp: current.timestamp,
            original_source: previous.original_source,
        }
    }
}

/// What the host should do with its native chain after a phase handler ran.
///
/// Suppression of managed re-delivery is tracked per-session via frame ids,
/// never by stopping native bubbling, so containers that rely on native
/// bubbling (scroll views) keep working even when a descendant handled the
/// event in managed code. `Stop` is returned only where the original
/// behavior genuinely ends the native chain (suspended Began, or a fully
/// managed-handled Moved/Ended/Cancelled).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "the host must apply this to its native chain"]
pub enum NativePropagation {
    /// Invoke the platform's base implementation (continue native bubbling).
    Forward,
    /// Do not invoke the platform's base implementation.
    Stop,
}

impl NativePropagation {
    /// `true` if the native chain should continue.
    #[inline]
    #[must_use]
    pub const fn is_forward(self) -> bool {
        matches!(self, Self::Forward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(handle: u64, x: f64, y: f64, ts: u64) -> TouchRecord {
        TouchRecord::new(TouchHandle::new(handle), Point::new(x, y), ts)
    }

    #[test]
    fn from_record_carries_identity_and_position() {
        let rec = record(7, 3.0, 4.0, 100);
        let args =
            PointerEventArgs::from_record(PointerId::new(2), FrameId::new(9), &rec, ElementId::new(1));
        assert_eq!(args.pointer, PointerId::new(2));
        assert_eq!(args.frame, FrameId::new(9));
        assert_eq!(args.position, Point::new(3.0, 4.0));
        assert_eq!(args.previous_position, None);
        assert_eq!(args.timestamp, 100);
        assert_eq!(args.original_source, ElementId::new(1));
    }

    #[test]
    fn merged_uses_down_position_as_previous() {
        let down = PointerEventArgs::from_record(
            PointerId::new(0),
            FrameId::new(1),
            &record(7, 10.0, 10.0, 50),
            ElementId::new(42),
        );
        let up = PointerEventArgs::from_record(
            PointerId::new(0),
            FrameId::new(3),
            &record(7, 25.0, 12.0, 90),
            ElementId::new(43),
        );
        let synth = PointerEventArgs::merged(&down, &up);
        assert_eq!(synth.previous_position, Some(Point::new(10.0, 10.0)));
        assert_eq!(synth.position, Point::new(25.0, 12.0));
        assert_eq!(synth.frame, FrameId::new(3));
        assert_eq!(synth.timestamp, 90);
        // The synthesized move belongs to the gesture's topmost target.
        assert_eq!(synth.original_source, ElementId::new(42));
    }

    #[test]
    fn frame_ids_order() {
        assert!(FrameId::ZERO < FrameId::new(1));
        assert!(FrameId::new(5) >= FrameId::new(5));
    }

    #[test]
    fn propagation_accessor() {
        assert!(NativePropagation::Forward.is_forward());
        assert!(!NativePropagation::Stop.is_forward());
    }

    #[test]
    fn display_formats() {
        assert_eq!(ElementId::new(3).to_string(), "element#3");
        assert_eq!(PointerId::new(0).to_string(), "ptr#0");
    }
}
