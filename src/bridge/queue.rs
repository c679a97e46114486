//! Lifecycle-gated command queue shared between the game and chat threads.
//!
//! A `BridgeQueue` is a FIFO of owned [`Command`]s behind a single lock.
//! Pushes are only accepted while the queue is `Uninitialized` or `Ready`;
//! once shutdown starts producers silently drop instead of blocking.
//! Consumers on hot loops use [`BridgeQueue::try_pop`], which treats a
//! contended lock as "nothing this tick".

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::bridge::state::{LifecycleState, StateMask};
use crate::common::error::QueueError;

/// An owned text payload travelling through a bridge queue.
#[derive(Clone, PartialEq, Eq)]
pub struct Command {
    payload: Box<str>,
}

impl Command {
    pub fn new(payload: impl Into<Box<str>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn into_string(self) -> String {
        self.payload.into_string()
    }
}

impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        &self.payload
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.payload, f)
    }
}

/// How a queue stores accepted commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMode {
    /// Keep commands until popped. `capacity` of `None` means unbounded.
    Buffered { capacity: Option<usize> },
    /// Track lifecycle state only; accepted commands are discarded.
    StateOnly,
}

impl QueueMode {
    pub const UNBOUNDED: QueueMode = QueueMode::Buffered { capacity: None };
}

impl Default for QueueMode {
    fn default() -> Self {
        QueueMode::UNBOUNDED
    }
}

/// Outcome of a push.
///
/// Only `Queued` changes what consumers will see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    /// Appended at the tail.
    Queued,
    /// Empty payload, nothing to do.
    Empty,
    /// The queue has started shutting down.
    Rejected(LifecycleState),
    /// The queue is in `StateOnly` mode.
    Discarded,
    /// A bounded queue is at capacity.
    Full,
}

impl Push {
    pub fn is_queued(self) -> bool {
        matches!(self, Push::Queued)
    }
}

#[derive(Debug)]
struct Inner {
    items: VecDeque<Command>,
    state: LifecycleState,
}

/// FIFO command queue gated by its own lifecycle state.
pub struct BridgeQueue {
    name: &'static str,
    mode: QueueMode,
    inner: Mutex<Inner>,
    state_changed: Condvar,
    /// Length as of the last mutation; read without the lock.
    len_hint: AtomicUsize,
}

impl BridgeQueue {
    /// Create an empty queue in the `Uninitialized` state.
    pub fn new(name: &'static str, mode: QueueMode) -> Self {
        Self {
            name,
            mode,
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                state: LifecycleState::Uninitialized,
            }),
            state_changed: Condvar::new(),
            len_hint: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn mode(&self) -> QueueMode {
        self.mode
    }

    /// Push a text payload.
    ///
    /// The command is allocated before the lock is taken. If the queue is
    /// `Closing` or `Closed` it is dropped without any visible change.
    pub fn push(&self, payload: &str) -> Result<Push, QueueError> {
        if payload.is_empty() {
            return Ok(Push::Empty);
        }
        self.push_command(Command::new(payload))
    }

    /// Push an already allocated command.
    pub fn push_command(&self, command: Command) -> Result<Push, QueueError> {
        if command.is_empty() {
            return Ok(Push::Empty);
        }

        let mut inner = self.inner.lock();

        if !inner.state.accepts_pushes() {
            trace!(queue = self.name, state = %inner.state, "Dropping push on closed queue");
            return Ok(Push::Rejected(inner.state));
        }

        match self.mode {
            QueueMode::StateOnly => return Ok(Push::Discarded),
            QueueMode::Buffered { capacity } => {
                if capacity.is_some_and(|max| inner.items.len() >= max) {
                    warn!(queue = self.name, "Queue full, dropping command");
                    return Ok(Push::Full);
                }
            }
        }

        inner
            .items
            .try_reserve(1)
            .map_err(|_| QueueError::Exhausted { len: command.len() })?;
        inner.items.push_back(command);
        self.len_hint.store(inner.items.len(), Ordering::Release);

        Ok(Push::Queued)
    }

    /// Remove the head, waiting for the lock if another thread holds it.
    pub fn pop(&self) -> Option<Command> {
        let mut inner = self.inner.lock();
        self.take_front(&mut inner)
    }

    /// Remove the head without waiting.
    ///
    /// A contended lock reads as empty; the item is picked up next call.
    pub fn try_pop(&self) -> Option<Command> {
        let mut inner = self.inner.try_lock()?;
        self.take_front(&mut inner)
    }

    fn take_front(&self, inner: &mut Inner) -> Option<Command> {
        let command = inner.items.pop_front();
        self.len_hint.store(inner.items.len(), Ordering::Release);
        command
    }

    /// Lock-free emptiness check.
    ///
    /// May be stale by one mutation; callers must tolerate a false "empty".
    pub fn is_visibly_empty(&self) -> bool {
        self.len_hint.load(Ordering::Acquire) == 0
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lock().state
    }

    /// Move to `next` if the lifecycle allows it.
    ///
    /// Returns whether this call changed the state.
    pub fn set_state(&self, next: LifecycleState) -> bool {
        self.transition(next, StateMask::ALL)
    }

    /// Move to `next` only if the current state is in `allowed`.
    ///
    /// Concurrent callers racing the same transition see exactly one `true`.
    pub fn set_state_if(&self, next: LifecycleState, allowed: impl Into<StateMask>) -> bool {
        self.transition(next, allowed.into())
    }

    fn transition(&self, next: LifecycleState, allowed: StateMask) -> bool {
        let mut inner = self.inner.lock();
        let current = inner.state;

        if current == next || !allowed.contains(current) {
            return false;
        }
        if !current.can_transition_to(next) {
            warn!(queue = self.name, "Ignoring invalid transition {} -> {}", current, next);
            return false;
        }

        inner.state = next;
        drop(inner);
        self.state_changed.notify_all();

        debug!(queue = self.name, "State {} -> {}", current, next);
        true
    }

    /// Block while the queue stays in `state`, up to `timeout`.
    ///
    /// Returns the state observed when the wait ended.
    pub fn wait_while(&self, state: LifecycleState, timeout: Duration) -> LifecycleState {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();

        while inner.state == state {
            if self.state_changed.wait_until(&mut inner, deadline).timed_out() {
                break;
            }
        }

        inner.state
    }

    /// Drop every pending command, returning how many there were.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let count = inner.items.len();
        inner.items.clear();
        self.len_hint.store(0, Ordering::Release);
        count
    }
}

impl fmt::Debug for BridgeQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeQueue")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("len_hint", &self.len_hint.load(Ordering::Relaxed))
            .finish()
    }
}
