//! The game <-> Discord bridge.
//!
//! ## Module Structure
//!
//! - `state`: queue lifecycle states and state masks
//! - `queue`: the lifecycle-gated command queue shared by both threads
//! - `inbound`: per-frame dispatch of Discord commands into the game
//! - `outbound`: publishing game notices on the chat thread
//! - `supervisor`: the chat thread and its bounded shutdown
//! - `orchestrator`: the host-facing `Bridge`

pub mod inbound;
pub mod orchestrator;
pub mod outbound;
pub mod queue;
pub mod state;
pub mod supervisor;

// Re-export main types for convenience
pub use orchestrator::Bridge;
pub use queue::{BridgeQueue, Command, Push, QueueMode};
pub use state::{LifecycleState, StateMask};
pub use supervisor::{ChatLink, ChatRuntime, ShutdownReport};
