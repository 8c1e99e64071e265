//! Contains common, primitive types shared across the game.
//!
//! Using distinct identifier types instead of bare integers keeps button
//! handles and timer handles from being mixed up.

use serde::Deserialize;
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Uniquely and safely identifies a pending timer in a `TimerQueue`.
    ///
    /// Keys are never reused, so cancelling a timer that already fired is a
    /// harmless no-op rather than cancelling some newer timer.
    pub struct TimerId;
}

/// Identifies one of the selectable pads of the game.
///
/// The set of valid buttons is fixed for the lifetime of a session; a
/// `ButtonId` only ever gets compared for identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct ButtonId(pub u8);

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
