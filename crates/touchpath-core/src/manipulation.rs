#![forbid(unsafe_code)]

//! Manipulation capability model and gesture-recognizer intents.
//!
//! A *manipulation* is a recognized higher-level gesture (drag, translate)
//! distinct from raw pointer phases. The arbitration layer only ever looks
//! at a manipulation's declared motion capabilities: a scrollable ancestor
//! conflicts with anything that translates along either axis or is itself a
//! drag, and stays out of the way of everything else (press-and-hold,
//! rotate-only, scale-only).
//!
//! Gesture recognition itself is an external collaborator; its lifecycle
//! notifications enter the routing layer as [`GestureIntent`] values.

use bitflags::bitflags;

bitflags! {
    /// Motion capabilities a manipulation declares.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ManipulationCaps: u8 {
        /// Translates along the horizontal axis.
        const TRANSLATE_X = 1 << 0;
        /// Translates along the vertical axis.
        const TRANSLATE_Y = 1 << 1;
        /// Is itself a drag-and-drop manipulation.
        const DRAG = 1 << 2;
        /// Rotates.
        const ROTATE = 1 << 3;
        /// Scales.
        const SCALE = 1 << 4;
    }
}

/// A candidate or in-progress manipulation, described by its capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Manipulation {
    /// Declared motion capabilities.
    pub caps: ManipulationCaps,
}

impl Manipulation {
    /// Create a manipulation with the given capabilities.
    #[inline]
    #[must_use]
    pub const fn new(caps: ManipulationCaps) -> Self {
        Self { caps }
    }

    /// Whether this manipulation translates horizontally.
    #[inline]
    #[must_use]
    pub const fn translates_x(&self) -> bool {
        self.caps.contains(ManipulationCaps::TRANSLATE_X)
    }

    /// Whether this manipulation translates vertically.
    #[inline]
    #[must_use]
    pub const fn translates_y(&self) -> bool {
        self.caps.contains(ManipulationCaps::TRANSLATE_Y)
    }

    /// Whether this manipulation is itself a drag.
    #[inline]
    #[must_use]
    pub const fn is_drag(&self) -> bool {
        self.caps.contains(ManipulationCaps::DRAG)
    }
}

/// How an element participates in manipulation handling.
///
/// This is what drives ancestor-arbiter subscription: an element that
/// leaves everything to the platform (`System`, without drag capability)
/// never registers with ancestors; anything else must suppress the
/// ancestors' touch-delay while loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManipulationMode {
    /// The platform owns all gestures (the default).
    #[default]
    System,
    /// Gestures are disabled entirely; ancestor scrollers are suppressed as
    /// soon as a pointer goes down on the element.
    None,
    /// The element recognizes its own manipulations with the declared
    /// capabilities.
    Custom(ManipulationCaps),
}

/// Lifecycle notifications produced by the external gesture recognizer.
///
/// The router translates these into arbiter state: `ManipulationConfigured`
/// is a *candidate* (conflict-checked against each ancestor), the started
/// family unconditionally suppresses ancestors' cancel-ability, and the
/// ended family restores it. A drag can be aborted by the user before the
/// pointer lifts, so the terminal-phase cleanup alone is not enough; the
/// recognizer must report completion and abort explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureIntent {
    /// A manipulation candidate was configured and may start.
    ManipulationConfigured(Manipulation),
    /// A manipulation started tracking.
    ManipulationStarted,
    /// A manipulation completed normally.
    ManipulationCompleted,
    /// A manipulation was aborted.
    ManipulationAborted,
    /// A press was held long enough that any move will start a drag.
    DragReady,
    /// A drag started.
    DragStarted,
    /// A drag completed.
    DragCompleted,
    /// A drag was aborted.
    DragAborted,
}
