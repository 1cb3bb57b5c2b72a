#![forbid(unsafe_code)]

//! Core: pointer event vocabulary, touch sessions, and fault reporting.
//!
//! # Role in Touchpath
//! `touchpath-core` is the vocabulary layer. It owns the identity newtypes,
//! the native touch record and routed pointer event types, the manipulation
//! capability model, and the lease-counted session registry that maps an
//! opaque native touch identity to a stable logical pointer for the
//! duration of a contact.
//!
//! # Primary responsibilities
//! - **Event model**: native [`TouchRecord`](event::TouchRecord)s in,
//!   routed [`PointerEventArgs`](event::PointerEventArgs) out.
//! - **PointerSessionRegistry**: one session per physical contact,
//!   shared by every element observing it, destroyed with the last lease.
//! - **Manipulation model**: capability flags and gesture intents used by
//!   the arbitration layer.
//! - **Fault sink**: the sole error-surface boundary for recoverable
//!   routing faults.
//!
//! # How it fits in the system
//! The routing layer (`touchpath-router`) consumes these types and drives
//! per-element phase handlers. Nothing in this crate touches the element
//! tree; parent traversal and hit-testing stay on the host's side of the
//! trait seams defined by the router.

pub mod event;
pub mod fault;
pub mod geometry;
pub mod manipulation;
pub mod session;

pub use event::{
    ElementId, FrameId, NativePropagation, PointerEventArgs, PointerEventKind, PointerId,
    TouchHandle, TouchPhase, TouchRecord,
};
pub use fault::{CollectingFaultSink, FaultSink, FaultSource, RoutingFault, TracingFaultSink};
pub use geometry::Point;
pub use manipulation::{GestureIntent, Manipulation, ManipulationCaps, ManipulationMode};
pub use session::{PointerSession, PointerSessionRegistry};
