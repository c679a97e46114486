//! Outbound publisher: game notices drained on the chat thread.
//!
//! The chat runtime calls [`Publisher::tick`] on every idle tick. Sends are
//! fire-and-forget: a failed create-message call is logged and the command
//! is dropped.

use std::sync::Arc;

use serenity::async_trait;
use tracing::{debug, warn};

use crate::bridge::queue::{BridgeQueue, Command};
use crate::common::error::DiscordResult;

/// The "create message" surface of the chat platform.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn create_message(&self, channel_id: u64, content: &str) -> DiscordResult<()>;
}

/// What a publisher tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing pending.
    Idle,
    /// Drained this many commands.
    Published(usize),
    /// The queue is shutting down and empty; the runtime should stop.
    Terminate,
}

/// Drains the outbound queue into a [`MessageSink`].
pub struct Publisher {
    queue: Arc<BridgeQueue>,
    channel_id: Option<u64>,
}

impl Publisher {
    pub fn new(queue: Arc<BridgeQueue>, channel_id: Option<u64>) -> Self {
        Self { queue, channel_id }
    }

    pub fn channel_id(&self) -> Option<u64> {
        self.channel_id
    }

    /// Publish whatever is pending.
    ///
    /// Stops as soon as the queue reports empty rather than after a fixed
    /// batch, so a concurrent shutdown is noticed on the next tick.
    pub async fn tick<S: MessageSink + ?Sized>(&self, sink: &S) -> Tick {
        if self.queue.is_visibly_empty() {
            if self.queue.state().is_shutting_down() && self.queue.is_empty() {
                return Tick::Terminate;
            }
            return Tick::Idle;
        }

        let mut published = 0;
        while let Some(command) = self.queue.try_pop() {
            self.publish(sink, command).await;
            published += 1;

            if self.queue.is_visibly_empty() {
                break;
            }
        }

        if published == 0 {
            Tick::Idle
        } else {
            Tick::Published(published)
        }
    }

    async fn publish<S: MessageSink + ?Sized>(&self, sink: &S, command: Command) {
        let Some(channel_id) = self.channel_id else {
            debug!("No Discord channel configured, dropping: {}", command.as_str());
            return;
        };

        match sink.create_message(channel_id, command.as_str()).await {
            Ok(()) => debug!("Game -> Discord: {}", command.as_str()),
            Err(e) => warn!("Failed to send message to Discord channel {}: {}", channel_id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::queue::QueueMode;
    use crate::bridge::state::LifecycleState;
    use crate::common::error::DiscordError;
    use parking_lot::Mutex;

    /// Records every message; fails on payloads containing "fail".
    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(u64, String)>>,
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        async fn create_message(&self, channel_id: u64, content: &str) -> DiscordResult<()> {
            if content.contains("fail") {
                return Err(DiscordError::ChannelUnusable {
                    channel_id,
                    reason: "rejected".to_string(),
                });
            }
            self.sent.lock().push((channel_id, content.to_string()));
            Ok(())
        }
    }

    fn ready_publisher(channel_id: Option<u64>) -> (Arc<BridgeQueue>, Publisher) {
        let queue = Arc::new(BridgeQueue::new("outbound", QueueMode::UNBOUNDED));
        queue.set_state(LifecycleState::Ready);
        let publisher = Publisher::new(Arc::clone(&queue), channel_id);
        (queue, publisher)
    }

    #[test]
    fn test_idle_when_empty() {
        let (_queue, publisher) = ready_publisher(Some(7));
        let sink = RecordingSink::default();
        assert_eq!(tokio_test::block_on(publisher.tick(&sink)), Tick::Idle);
    }

    #[test]
    fn test_publishes_in_order() {
        let (queue, publisher) = ready_publisher(Some(7));
        queue.push("one").unwrap();
        queue.push("two").unwrap();

        let sink = RecordingSink::default();
        assert_eq!(tokio_test::block_on(publisher.tick(&sink)), Tick::Published(2));
        assert_eq!(
            *sink.sent.lock(),
            vec![(7, "one".to_string()), (7, "two".to_string())]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_failed_send_is_dropped_not_retried() {
        let (queue, publisher) = ready_publisher(Some(7));
        queue.push("this will fail").unwrap();
        queue.push("after").unwrap();

        let sink = RecordingSink::default();
        assert_eq!(tokio_test::block_on(publisher.tick(&sink)), Tick::Published(2));
        assert_eq!(*sink.sent.lock(), vec![(7, "after".to_string())]);
        assert_eq!(tokio_test::block_on(publisher.tick(&sink)), Tick::Idle);
    }

    #[test]
    fn test_without_channel_drains_and_drops() {
        let (queue, publisher) = ready_publisher(None);
        queue.push("nowhere").unwrap();

        let sink = RecordingSink::default();
        assert_eq!(tokio_test::block_on(publisher.tick(&sink)), Tick::Published(1));
        assert!(sink.sent.lock().is_empty());
    }

    #[test]
    fn test_closing_drains_before_terminating() {
        let (queue, publisher) = ready_publisher(Some(7));
        queue.push("last words").unwrap();
        queue.set_state(LifecycleState::Closing);

        let sink = RecordingSink::default();
        assert_eq!(tokio_test::block_on(publisher.tick(&sink)), Tick::Published(1));
        assert_eq!(tokio_test::block_on(publisher.tick(&sink)), Tick::Terminate);
        assert_eq!(sink.sent.lock().len(), 1);
    }

    #[test]
    fn test_closed_empty_queue_terminates() {
        let (queue, publisher) = ready_publisher(Some(7));
        queue.set_state(LifecycleState::Closed);

        let sink = RecordingSink::default();
        assert_eq!(tokio_test::block_on(publisher.tick(&sink)), Tick::Terminate);
    }
}
