//! Chat thread supervision.
//!
//! The supervisor spawns the thread that runs the chat platform's event
//! loop and owns its bounded shutdown:
//! 1. inbound goes to `Closed`, outbound to `Closing` (or straight to
//!    `Closed` if the client never became ready)
//! 2. wait up to the grace period for the publisher to drain and confirm
//!    `Closed`
//! 3. cancel the runtime
//! 4. wait up to the join timeout for the thread to exit, then join it or
//!    abandon it

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::bridge::queue::BridgeQueue;
use crate::bridge::state::LifecycleState;
use crate::config::types::Config;

/// Everything the chat thread shares with the game thread.
#[derive(Clone)]
pub struct ChatLink {
    /// Discord -> game commands.
    pub inbound: Arc<BridgeQueue>,
    /// Game -> Discord notices.
    pub outbound: Arc<BridgeQueue>,
    /// Session configuration, read-only once the thread starts.
    pub config: Arc<Config>,
    /// Cancelled when shutdown gives up waiting for a graceful stop.
    pub cancel: CancellationToken,
}

impl fmt::Debug for ChatLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatLink")
            .field("inbound", &self.inbound)
            .field("outbound", &self.outbound)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Whatever runs on the chat thread.
///
/// Implementations mark the outbound queue `Ready` once they can publish,
/// poll it from their own loop, and return when it is shutting down and
/// empty or when the link is cancelled.
pub trait ChatRuntime: Send + 'static {
    fn run(self: Box<Self>, link: ChatLink) -> anyhow::Result<()>;
}

/// Outcome of a supervised shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// The outbound queue reached `Closed` within the grace period.
    pub drained: bool,
    /// The chat thread exited and was joined within the join timeout.
    pub joined: bool,
    /// Commands still queued Discord -> game, dropped at teardown.
    pub discarded_inbound: usize,
    /// Notices still queued game -> Discord, dropped at teardown.
    pub discarded_outbound: usize,
    /// Wall time of the whole sequence.
    pub elapsed: Duration,
}

impl ShutdownReport {
    /// The thread outlived the join timeout and was left running.
    pub fn abandoned(&self) -> bool {
        !self.joined
    }
}

/// Closes both queues and signals exit when the chat thread ends, including
/// by panic.
struct ExitGuard {
    inbound: Arc<BridgeQueue>,
    outbound: Arc<BridgeQueue>,
    exited: Sender<()>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.outbound.set_state(LifecycleState::Closed);
        self.inbound.set_state(LifecycleState::Closed);
        // the supervisor may have given up already
        let _ = self.exited.try_send(());
    }
}

/// Owns the chat thread.
pub struct Supervisor {
    handle: Option<JoinHandle<()>>,
    exited: Receiver<()>,
    inbound: Arc<BridgeQueue>,
    outbound: Arc<BridgeQueue>,
    cancel: CancellationToken,
    grace: Duration,
    join_timeout: Duration,
}

impl Supervisor {
    /// Spawn `runtime` on a dedicated thread.
    pub fn spawn(
        runtime: Box<dyn ChatRuntime>,
        link: ChatLink,
        grace: Duration,
        join_timeout: Duration,
    ) -> std::io::Result<Self> {
        let (exit_tx, exited) = channel::bounded(1);
        let guard = ExitGuard {
            inbound: Arc::clone(&link.inbound),
            outbound: Arc::clone(&link.outbound),
            exited: exit_tx,
        };
        let inbound = Arc::clone(&link.inbound);
        let outbound = Arc::clone(&link.outbound);
        let cancel = link.cancel.clone();

        let handle = thread::Builder::new()
            .name("q2d-chat".to_string())
            .spawn(move || {
                let _guard = guard;
                info!("Chat thread started");
                match runtime.run(link) {
                    Ok(()) => info!("Chat thread finished"),
                    Err(e) => error!("Chat runtime failed: {:#}", e),
                }
            })?;

        Ok(Self {
            handle: Some(handle),
            exited,
            inbound,
            outbound,
            cancel,
            grace,
            join_timeout,
        })
    }

    /// Whether the chat thread is still being supervised.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Run the bounded shutdown sequence.
    ///
    /// Returns `None` if shutdown already ran. Queue teardown is left to the
    /// caller.
    pub fn shutdown(&mut self) -> Option<ShutdownReport> {
        let handle = self.handle.take()?;
        let started = Instant::now();

        self.inbound.set_state(LifecycleState::Closed);
        if !self
            .outbound
            .set_state_if(LifecycleState::Closing, LifecycleState::Ready)
        {
            // never became ready, nothing will drain it
            self.outbound
                .set_state_if(LifecycleState::Closed, LifecycleState::Uninitialized);
        }

        let state = self.outbound.wait_while(LifecycleState::Closing, self.grace);
        let drained = state == LifecycleState::Closed;
        if !drained {
            warn!(
                "Outbound queue still {} after {:?} grace period",
                state, self.grace
            );
        }

        self.cancel.cancel();

        let joined = match self.exited.recv_timeout(self.join_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    error!("Chat thread panicked");
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Chat thread did not exit within {:?}, abandoning it",
                    self.join_timeout
                );
                false
            }
        };

        Some(ShutdownReport {
            drained,
            joined,
            elapsed: started.elapsed(),
            ..ShutdownReport::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::queue::QueueMode;
    use crate::config::parser::load_config_str;
    use parking_lot::Mutex;

    fn link() -> ChatLink {
        ChatLink {
            inbound: Arc::new(BridgeQueue::new("inbound", QueueMode::UNBOUNDED)),
            outbound: Arc::new(BridgeQueue::new("outbound", QueueMode::UNBOUNDED)),
            config: Arc::new(load_config_str(r#"discord { token = "t" }"#).unwrap()),
            cancel: CancellationToken::new(),
        }
    }

    /// Marks outbound ready, drains it into `sent` until told to stop.
    struct DrainingRuntime {
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl ChatRuntime for DrainingRuntime {
        fn run(self: Box<Self>, link: ChatLink) -> anyhow::Result<()> {
            link.outbound
                .set_state_if(LifecycleState::Ready, LifecycleState::Uninitialized);
            loop {
                while let Some(command) = link.outbound.try_pop() {
                    thread::sleep(Duration::from_millis(20));
                    self.sent.lock().push(command.into_string());
                }
                let closing =
                    link.outbound.state().is_shutting_down() && link.outbound.is_empty();
                if link.cancel.is_cancelled() || closing {
                    return Ok(());
                }
                thread::sleep(Duration::from_millis(5));
            }
        }
    }

    /// Ignores every signal for a while.
    struct HungRuntime;

    impl ChatRuntime for HungRuntime {
        fn run(self: Box<Self>, _link: ChatLink) -> anyhow::Result<()> {
            thread::sleep(Duration::from_secs(3));
            Ok(())
        }
    }

    struct FailingRuntime;

    impl ChatRuntime for FailingRuntime {
        fn run(self: Box<Self>, _link: ChatLink) -> anyhow::Result<()> {
            anyhow::bail!("bad credential")
        }
    }

    #[test]
    fn test_graceful_shutdown_drains_pending() {
        let link = link();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let runtime = DrainingRuntime {
            sent: Arc::clone(&sent),
        };
        let inbound = Arc::clone(&link.inbound);
        let outbound = Arc::clone(&link.outbound);

        let mut supervisor = Supervisor::spawn(
            Box::new(runtime),
            link,
            Duration::from_secs(2),
            Duration::from_secs(2),
        )
        .unwrap();

        outbound.wait_while(LifecycleState::Uninitialized, Duration::from_secs(2));
        outbound.push("first").unwrap();
        outbound.push("second").unwrap();

        let report = supervisor.shutdown().unwrap();
        assert!(report.drained);
        assert!(report.joined);
        assert!(!report.abandoned());
        assert_eq!(*sent.lock(), vec!["first", "second"]);

        assert_eq!(inbound.state(), LifecycleState::Closed);
        assert_eq!(outbound.state(), LifecycleState::Closed);
        assert!(!outbound.push("too late").unwrap().is_queued());
        assert!(supervisor.shutdown().is_none());
    }

    #[test]
    fn test_hung_runtime_is_abandoned_within_bounds() {
        let link = link();
        let outbound = Arc::clone(&link.outbound);
        let mut supervisor = Supervisor::spawn(
            Box::new(HungRuntime),
            link,
            Duration::from_millis(100),
            Duration::from_millis(100),
        )
        .unwrap();

        let started = Instant::now();
        let report = supervisor.shutdown().unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(report.abandoned());
        // never became ready, so it went straight to closed
        assert!(report.drained);
        assert_eq!(outbound.state(), LifecycleState::Closed);
    }

    #[test]
    fn test_failed_runtime_settles_queues_closed() {
        let link = link();
        let inbound = Arc::clone(&link.inbound);
        let outbound = Arc::clone(&link.outbound);
        let mut supervisor = Supervisor::spawn(
            Box::new(FailingRuntime),
            link,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(
            outbound.wait_while(LifecycleState::Uninitialized, Duration::from_secs(2)),
            LifecycleState::Closed
        );
        assert_eq!(inbound.state(), LifecycleState::Closed);

        let report = supervisor.shutdown().unwrap();
        assert!(report.joined);
    }
}
