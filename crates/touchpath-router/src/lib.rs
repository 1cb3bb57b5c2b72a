#![forbid(unsafe_code)]

//! Routing: per-element phase handlers and scroll-conflict arbitration.
//!
//! # Role in Touchpath
//! `touchpath-router` turns the native touch phases (Began, Moved, Ended,
//! Cancelled) into the routed pointer event sequence (Enter, Down, Move,
//! Up, Exited, Cancel) and arbitrates gesture ownership between elements
//! and their scrollable ancestors.
//!
//! # Primary responsibilities
//! - **EventRouter**: one per interactive element; drives the phase state
//!   machine, frame-id dedup, flick Move synthesis, and the
//!   native-propagation decision.
//! - **TouchArbiter / ArbiterArena**: lease-counted delay/cancel policy on
//!   scrollable surfaces, keyed by stable surface id.
//! - **InputContext**: root-owned shared state (sessions, arbiters,
//!   suspension flag, fault sink); no globals.
//! - **Trait seams**: [`tree::AncestorWalk`] for upward tree traversal and
//!   [`tree::PointerTarget`] for per-element hooks, both supplied by the
//!   host.
//!
//! # How it fits in the system
//! The host's platform glue feeds each element's native phase callbacks
//! into its [`EventRouter`] and applies the returned propagation decision
//! to the native responder chain. Scrollable containers register an
//! [`ArbiterSurface`] in the context's arena at load and unregister it at
//! unload.

pub mod arbiter;
pub mod context;
pub mod router;
pub mod tree;

pub use arbiter::{ArbiterArena, ArbiterError, ArbiterSurface, ScrollSurface, SurfaceId, TouchArbiter};
pub use context::InputContext;
pub use router::EventRouter;
pub use tree::{AncestorWalk, PointerTarget};
