//! Bridge orchestrator that ties the game server and Discord together.
//!
//! `Bridge` is the host-facing handle: it owns both queues, the session
//! configuration and the chat thread's supervisor. The host calls
//! [`Bridge::mirror`] whenever the server prints something and
//! [`Bridge::drain_inbound`] once per frame.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bridge::inbound;
use crate::bridge::queue::{BridgeQueue, Push, QueueMode};
use crate::bridge::state::LifecycleState;
use crate::bridge::supervisor::{ChatLink, ChatRuntime, ShutdownReport, Supervisor};
use crate::common::error::{BridgeError, Result};
use crate::common::messages::{Severity, CLOSE_ANNOUNCEMENT, OPEN_ANNOUNCEMENT};
use crate::config::{load_and_validate, Config};
use crate::discord::DiscordRuntime;
use crate::game::formatter::format_outbound;
use crate::game::host::GameHost;

/// The main bridge between the game thread and the chat thread.
pub struct Bridge {
    config: Arc<Config>,
    inbound: Arc<BridgeQueue>,
    outbound: Arc<BridgeQueue>,
    supervisor: Supervisor,
}

impl Bridge {
    /// Load configuration from `path` and start the Discord bridge.
    pub fn from_config_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = load_and_validate(path)?;
        Self::initialize(config)
    }

    /// Start the bridge with the Discord runtime.
    pub fn initialize(config: Config) -> Result<Self> {
        Self::initialize_with(config, Box::new(DiscordRuntime))
    }

    /// Start the bridge with any chat runtime.
    ///
    /// Builds both queues, queues the open announcement, spawns the chat
    /// thread and opens the inbound queue.
    pub fn initialize_with(config: Config, runtime: Box<dyn ChatRuntime>) -> Result<Self> {
        let config = Arc::new(config);

        let outbound_mode = config.bridge.outbound_queue_mode().unwrap_or_else(|| {
            warn!(
                "Unknown outbound mode '{}', using buffered",
                config.bridge.outbound_mode
            );
            QueueMode::UNBOUNDED
        });
        let inbound = Arc::new(BridgeQueue::new("inbound", QueueMode::UNBOUNDED));
        let outbound = Arc::new(BridgeQueue::new("outbound", outbound_mode));

        if config.bridge.announce {
            push_logged(&outbound, OPEN_ANNOUNCEMENT);
        }

        let link = ChatLink {
            inbound: Arc::clone(&inbound),
            outbound: Arc::clone(&outbound),
            config: Arc::clone(&config),
            cancel: CancellationToken::new(),
        };
        let supervisor = Supervisor::spawn(
            runtime,
            link,
            config.bridge.shutdown_grace(),
            config.bridge.join_timeout(),
        )
        .map_err(BridgeError::Spawn)?;

        inbound.set_state_if(LifecycleState::Ready, LifecycleState::Uninitialized);
        info!("Bridge initialized (outbound {:?})", outbound_mode);

        Ok(Self {
            config,
            inbound,
            outbound,
            supervisor,
        })
    }

    /// Relay a server print to Discord if its severity is mirrored.
    ///
    /// Returns whether the notice was queued.
    pub fn mirror(&self, severity: Severity, text: &str) -> bool {
        if !self.config.mirror.allows(severity) {
            return false;
        }
        push_logged(&self.outbound, &format_outbound(severity, text))
    }

    /// Relay a server print given the engine's numeric print level.
    pub fn mirror_print(&self, level: i32, text: &str) -> bool {
        match Severity::from_print_level(level) {
            Some(severity) => self.mirror(severity, text),
            None => false,
        }
    }

    /// Dispatch pending Discord commands. Call once per frame.
    pub fn drain_inbound<H: GameHost + ?Sized>(&self, host: &mut H) -> usize {
        inbound::drain_inbound(&self.inbound, host)
    }

    /// Stop the chat thread and tear down both queues.
    ///
    /// Returns `None` if the bridge was already shut down.
    pub fn shutdown(&mut self) -> Option<ShutdownReport> {
        if !self.supervisor.is_running() {
            return None;
        }

        info!("Shutting down bridge...");
        if self.config.bridge.announce {
            push_logged(&self.outbound, CLOSE_ANNOUNCEMENT);
        }

        let mut report = self.supervisor.shutdown()?;
        report.discarded_inbound = self.inbound.clear();
        report.discarded_outbound = self.outbound.clear();

        if report.abandoned() {
            warn!("Bridge shut down with the chat thread still running");
        }
        info!(
            "Bridge shut down in {:.2}s (drained: {}, discarded: {} inbound, {} outbound)",
            report.elapsed.as_secs_f64(),
            report.drained,
            report.discarded_inbound,
            report.discarded_outbound
        );
        Some(report)
    }

    pub fn inbound_state(&self) -> LifecycleState {
        self.inbound.state()
    }

    pub fn outbound_state(&self) -> LifecycleState {
        self.outbound.state()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn push_logged(queue: &BridgeQueue, payload: &str) -> bool {
    match queue.push(payload) {
        Ok(Push::Queued) => true,
        Ok(outcome) => {
            debug!(queue = queue.name(), "Not queued ({:?}): {}", outcome, payload);
            false
        }
        Err(e) => {
            warn!(queue = queue.name(), "{}", e);
            false
        }
    }
}
