#![forbid(unsafe_code)]

//! Pointer session registry: one logical session per physical contact.
//!
//! A session is the shared identity of one continuous touch, independent of
//! how many elements observe it while it bubbles. Each observing element
//! takes a *lease* on the session; the session lives exactly as long as at
//! least one lease is held.
//!
//! # Invariants
//!
//! 1. A session exists iff its native handle has at least one lease.
//! 2. A session's [`PointerId`] is assigned at creation and never changes
//!    while leases > 0.
//! 3. No two live sessions share a pointer id.
//! 4. When the registry becomes empty the id counter resets to 0, so the
//!    first touch after a quiescent period always gets id 0. The counter is
//!    *not* reset per-session: ids can reappear mid-multi-touch when
//!    sessions end and restart in overlapping frames. Double-tap detection
//!    relies on both halves of this behavior.
//!
//! # Failure Modes
//!
//! - Releasing a lease that was never taken, or a handle with no session,
//!   is a benign no-op; the host may deliver Cancel more than once.

use ahash::{AHashMap, AHashSet};

use crate::event::{ElementId, FrameId, PointerEventArgs, PointerId, TouchHandle};

/// Shared state of one continuous physical contact.
#[derive(Debug)]
pub struct PointerSession {
    id: PointerId,
    native: TouchHandle,
    leases: AHashSet<ElementId>,

    /// Event state captured at the first Down, assigned by the originating
    /// (topmost) element only; used to synthesize a Move for flicks that
    /// never produced a native Moved.
    pub down_args: Option<PointerEventArgs>,

    /// True once any Move has been routed for this session. Kept on the
    /// session rather than per element because the platform does implicit
    /// captures: a move is delivered to every element leasing the session.
    pub had_move: bool,

    /// Last frame occurrence fully absorbed by managed routing; ancestors
    /// receiving the same occurrence through native bubbling skip it.
    pub last_managed_only_frame: FrameId,
}

impl PointerSession {
    fn new(id: PointerId, native: TouchHandle) -> Self {
        Self {
            id,
            native,
            leases: AHashSet::new(),
            down_args: None,
            had_move: false,
            last_managed_only_frame: FrameId::ZERO,
        }
    }

    /// Stable pointer identity of this session.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> PointerId {
        self.id
    }

    /// The native handle this session is keyed by.
    #[inline]
    #[must_use]
    pub const fn native(&self) -> TouchHandle {
        self.native
    }

    /// Number of elements currently observing this session.
    #[inline]
    #[must_use]
    pub fn lease_count(&self) -> usize {
        self.leases.len()
    }
}

/// Registry of live pointer sessions, keyed by native touch handle.
///
/// Single-threaded by design: all mutation happens on the event-delivery
/// sequence, so correctness rests entirely on every `acquire` having
/// exactly one matching `release` per element.
#[derive(Debug, Default)]
pub struct PointerSessionRegistry {
    sessions: AHashMap<TouchHandle, PointerSession>,
    next_id: u32,
}

impl PointerSessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the session for `handle` and lease it to `element`.
    ///
    /// Repeated calls during one touch's lifetime return the same session,
    /// whichever element in the bubbling chain asks.
    pub fn acquire(&mut self, element: ElementId, handle: TouchHandle) -> &mut PointerSession {
        let next_id = &mut self.next_id;
        let session = self.sessions.entry(handle).or_insert_with(|| {
            let id = PointerId::new(*next_id);
            *next_id += 1;
            tracing::debug!(pointer = %id, ?handle, "pointer session created");
            PointerSession::new(id, handle)
        });
        session.leases.insert(element);
        session
    }

    /// Look up the session for `handle` without creating one.
    #[must_use]
    pub fn get(&self, handle: TouchHandle) -> Option<&PointerSession> {
        self.sessions.get(&handle)
    }

    /// Mutable lookup without creation.
    pub fn get_mut(&mut self, handle: TouchHandle) -> Option<&mut PointerSession> {
        self.sessions.get_mut(&handle)
    }

    /// Release `element`'s lease on `handle`.
    ///
    /// Destroys the session when the last lease goes; resets the id counter
    /// to 0 when the registry becomes globally empty. Unknown handles and
    /// never-leased elements are no-ops.
    pub fn release(&mut self, element: ElementId, handle: TouchHandle) {
        let Some(session) = self.sessions.get_mut(&handle) else {
            return;
        };
        if !session.leases.remove(&element) {
            return;
        }
        if session.leases.is_empty() {
            let id = session.id;
            self.sessions.remove(&handle);
            tracing::debug!(pointer = %id, ?handle, "pointer session destroyed");
            if self.sessions.is_empty() {
                // Required so detectors comparing ids across separate touch
                // sequences (double-tap) see a stable value.
                self.next_id = 0;
                tracing::trace!("registry quiescent, pointer ids reset");
            }
        }
    }

    /// Number of live sessions.
    #[inline]
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Iterate over live sessions in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &PointerSession> {
        self.sessions.values()
    }
}
