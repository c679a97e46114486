//! Bridge queue lifecycle.
//!
//! Each queue carries its own state and walks it independently:
//! - `Uninitialized`: constructed, chat thread not confirmed ready yet
//! - `Ready`: accepting pushes, consumer draining normally
//! - `Closing`: shutdown requested, no new pushes, consumer drains what is left
//! - `Closed`: terminal, consumer has exited
//!
//! The inbound queue usually jumps straight to `Closed` on shutdown, while the
//! outbound queue passes through `Closing` so queued notices still get sent.

use std::fmt;
use std::ops::Not;

/// Lifecycle state of a single bridge queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Uninitialized,
    Ready,
    Closing,
    Closed,
}

impl LifecycleState {
    /// All states, in lifecycle order.
    pub const ALL: [LifecycleState; 4] = [
        LifecycleState::Uninitialized,
        LifecycleState::Ready,
        LifecycleState::Closing,
        LifecycleState::Closed,
    ];

    /// Whether producers may still push onto a queue in this state.
    pub fn accepts_pushes(self) -> bool {
        matches!(self, LifecycleState::Uninitialized | LifecycleState::Ready)
    }

    /// Whether the transition `self -> next` is part of the lifecycle.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Uninitialized, Ready)
                | (Uninitialized, Closed)
                | (Ready, Closing)
                | (Ready, Closed)
                | (Closing, Closed)
        )
    }

    /// Whether the queue has started shutting down.
    pub fn is_shutting_down(self) -> bool {
        matches!(self, LifecycleState::Closing | LifecycleState::Closed)
    }

    /// Mask holding only this state.
    pub const fn mask(self) -> StateMask {
        StateMask(self.bit())
    }

    const fn bit(self) -> u8 {
        match self {
            LifecycleState::Uninitialized => 1,
            LifecycleState::Ready => 1 << 1,
            LifecycleState::Closing => 1 << 2,
            LifecycleState::Closed => 1 << 3,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Ready => "ready",
            LifecycleState::Closing => "closing",
            LifecycleState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// A set of lifecycle states, used for conditional transitions.
///
/// `!LifecycleState::Closed.mask()` reads as "any state but closed".
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateMask(u8);

impl StateMask {
    /// Mask holding no state.
    pub const EMPTY: StateMask = StateMask(0);

    /// Mask holding every state.
    pub const ALL: StateMask = StateMask(0b1111);

    /// Whether `state` is part of the mask.
    pub fn contains(self, state: LifecycleState) -> bool {
        self.0 & state.bit() != 0
    }

    /// Mask with `state` added.
    pub const fn with(self, state: LifecycleState) -> StateMask {
        StateMask(self.0 | state.bit())
    }
}

impl Not for StateMask {
    type Output = StateMask;

    fn not(self) -> StateMask {
        StateMask(!self.0 & StateMask::ALL.0)
    }
}

impl From<LifecycleState> for StateMask {
    fn from(state: LifecycleState) -> Self {
        state.mask()
    }
}

impl fmt::Debug for StateMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(LifecycleState::ALL.iter().filter(|s| self.contains(**s)))
            .finish()
    }
}
