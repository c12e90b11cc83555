use crate::connection::{Attachment, ConnectionId, ConnectionRegistry};
use crate::message::ChatEvent;
use bytes::Bytes;
use log::*;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Broadcast engine: attaches receivers and fans chat messages out to them.
pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Attach a new receiver. The returned subscription yields the connected
    /// acknowledgment first, then every message broadcast while it stays alive.
    /// Dropping it detaches the receiver.
    pub fn attach(&self) -> Subscription {
        let greeting = ChatEvent::connected().to_frame();
        let Attachment { id, frames } = self.registry.attach(Some(greeting));
        info!(
            "Registered new SSE connection {} ({} active)",
            id.as_str(),
            self.registry.len()
        );

        Subscription {
            id,
            frames,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Unregister a connection by ID. Unknown or already removed IDs are ignored.
    pub fn detach(&self, connection_id: &ConnectionId) -> bool {
        info!("Unregistering SSE connection {}", connection_id.as_str());
        self.registry.detach(connection_id)
    }

    /// Format `text` once and queue it on every attached receiver.
    ///
    /// A receiver whose connection is already gone is skipped and left for its
    /// own close notification to remove. Returns the number of receivers the
    /// frame was queued on.
    pub fn broadcast(&self, text: &str) -> usize {
        let frame = ChatEvent::new(text).to_frame();
        trace!("Broadcasting chat message: {text:?}");

        let mut delivered = 0;
        self.registry.for_each(|handle| match handle.write(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(e) => {
                warn!(
                    "Failed to send broadcast to connection {}: {}. Connection will be cleaned up.",
                    handle.id().as_str(),
                    e
                );
            }
        });

        debug!("Broadcast chat message to {delivered} connection(s)");
        delivered
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Detach every receiver, ending all open streams. Used on shutdown.
    pub fn close_all(&self) -> usize {
        let closed = self.registry.clear();
        info!("Closed {closed} SSE connection(s)");
        closed
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

/// One attached receiver's view of the broadcast.
///
/// Owned by the response stream of the connection it belongs to. When the
/// connection ends the stream is dropped, and with it the subscription, which
/// removes the receiver from the registry.
#[derive(Debug)]
pub struct Subscription {
    id: ConnectionId,
    frames: UnboundedReceiver<Bytes>,
    registry: Arc<ConnectionRegistry>,
}

impl Subscription {
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Wait for the next frame. `None` once the relay has closed this receiver.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.frames.recv().await
    }

    /// Take the next frame if one is already queued.
    #[cfg(test)]
    pub(crate) fn try_recv(&mut self) -> Option<Bytes> {
        self.frames.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.registry.detach(&self.id) {
            debug!("SSE connection {} closed, cleaned up", self.id.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const CONNECTED: &str = "event: chat\ndata: Connected\n\n";

    fn chat_frame(text: &str) -> Bytes {
        ChatEvent::new(text).to_frame()
    }

    #[test]
    fn test_attach_sends_connected_acknowledgment_first() {
        let manager = Manager::new();
        let mut subscription = manager.attach();

        assert_eq!(subscription.try_recv().unwrap(), CONNECTED);
        assert!(subscription.try_recv().is_none());
        assert_eq!(manager.connection_count(), 1);
    }

    #[test]
    fn test_broadcast_reaches_every_attached_receiver_once() {
        let manager = Manager::new();
        let mut subscriptions: Vec<Subscription> = (0..5).map(|_| manager.attach()).collect();

        assert_eq!(manager.broadcast("hello"), 5);

        for subscription in subscriptions.iter_mut() {
            assert_eq!(subscription.try_recv().unwrap(), CONNECTED);
            assert_eq!(subscription.try_recv().unwrap(), chat_frame("hello"));
            assert!(subscription.try_recv().is_none());
        }
    }

    #[test]
    fn test_subscription_debug_names_its_connection() {
        let manager = Manager::new();
        let subscription = manager.attach();

        let rendered = format!("{subscription:?}");
        assert!(rendered.contains(subscription.id().as_str()));
    }

    #[test]
    fn test_broadcast_with_no_receivers() {
        let manager = Manager::new();
        assert_eq!(manager.broadcast("nobody listening"), 0);
    }

    #[test]
    fn test_detached_receiver_misses_later_messages() {
        let manager = Manager::new();
        let mut first = manager.attach();
        let mut second = manager.attach();

        manager.broadcast("hello");
        assert!(manager.detach(&first.id().clone()));
        manager.broadcast("world");

        assert_eq!(first.try_recv().unwrap(), CONNECTED);
        assert_eq!(first.try_recv().unwrap(), chat_frame("hello"));
        assert!(first.try_recv().is_none());

        assert_eq!(second.try_recv().unwrap(), CONNECTED);
        assert_eq!(second.try_recv().unwrap(), chat_frame("hello"));
        assert_eq!(second.try_recv().unwrap(), chat_frame("world"));
        assert!(second.try_recv().is_none());
    }

    #[test]
    fn test_dropping_subscription_detaches_it() {
        let manager = Manager::new();
        let first = manager.attach();
        let mut second = manager.attach();
        assert_eq!(manager.connection_count(), 2);

        drop(first);
        assert_eq!(manager.connection_count(), 1);

        assert_eq!(manager.broadcast("still here"), 1);
        assert_eq!(second.try_recv().unwrap(), CONNECTED);
        assert_eq!(second.try_recv().unwrap(), chat_frame("still here"));
    }

    #[test]
    fn test_duplicate_close_notifications_are_harmless() {
        let manager = Manager::new();
        let subscription = manager.attach();
        let _other = manager.attach();
        let id = subscription.id().clone();

        assert!(manager.detach(&id));
        assert!(!manager.detach(&id));
        // Drop runs a third detach for the same id.
        drop(subscription);

        assert_eq!(manager.connection_count(), 1);
    }

    #[test]
    fn test_dead_receiver_does_not_block_others() {
        let manager = Manager::new();
        let mut alive = manager.attach();

        // A handle whose connection vanished without its close notification running yet.
        let dead = manager.registry.attach(None);
        drop(dead.frames);

        assert_eq!(manager.broadcast("survives"), 1);
        assert_eq!(alive.try_recv().unwrap(), CONNECTED);
        assert_eq!(alive.try_recv().unwrap(), chat_frame("survives"));

        // The dead handle stays registered until its own detach.
        assert_eq!(manager.connection_count(), 2);
        assert!(manager.detach(&dead.id));
        assert_eq!(manager.connection_count(), 1);
    }

    #[test]
    fn test_reconnect_is_a_new_receiver() {
        let manager = Manager::new();
        let first = manager.attach();
        let first_id = first.id().clone();
        drop(first);

        let second = manager.attach();
        assert_ne!(second.id(), &first_id);
        assert_eq!(manager.connection_count(), 1);
    }

    #[test]
    fn test_multi_line_message_is_one_event() {
        let manager = Manager::new();
        let mut subscription = manager.attach();

        manager.broadcast("line1\nline2");

        assert_eq!(subscription.try_recv().unwrap(), CONNECTED);
        assert_eq!(
            subscription.try_recv().unwrap(),
            "event: chat\ndata: line1\ndata: line2\n\n"
        );
    }

    #[tokio::test]
    async fn test_close_all_ends_open_streams() {
        let manager = Manager::new();
        let mut subscription = manager.attach();

        assert_eq!(manager.close_all(), 1);
        assert_eq!(manager.connection_count(), 0);

        assert_eq!(subscription.recv().await.unwrap(), CONNECTED);
        let end = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
            .await
            .expect("stream should end after close_all");
        assert!(end.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_broadcasts_keep_one_order_for_everyone() {
        let manager = Arc::new(Manager::new());
        let mut subscriptions: Vec<Subscription> = (0..8).map(|_| manager.attach()).collect();

        let mut tasks = Vec::new();
        for sender in 0..4 {
            let manager = Arc::clone(&manager);
            tasks.push(tokio::spawn(async move {
                for n in 0..50 {
                    manager.broadcast(&format!("{sender}-{n}"));
                    tokio::task::yield_now().await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let mut orders = Vec::new();
        for subscription in subscriptions.iter_mut() {
            assert_eq!(subscription.try_recv().unwrap(), CONNECTED);
            let mut frames = Vec::new();
            while let Some(frame) = subscription.try_recv() {
                frames.push(frame);
            }
            assert_eq!(frames.len(), 200);
            orders.push(frames);
        }

        for order in &orders[1..] {
            assert_eq!(order, &orders[0]);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_attach_and_detach_during_broadcasts() {
        let manager = Arc::new(Manager::new());
        let mut steady = manager.attach();

        let churn = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                for _ in 0..200 {
                    let subscription = manager.attach();
                    tokio::task::yield_now().await;
                    drop(subscription);
                }
            })
        };
        let broadcaster = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                for n in 0..200 {
                    manager.broadcast(&n.to_string());
                    tokio::task::yield_now().await;
                }
            })
        };
        churn.await.unwrap();
        broadcaster.await.unwrap();

        assert_eq!(manager.connection_count(), 1);
        assert_eq!(steady.try_recv().unwrap(), CONNECTED);
        for n in 0..200 {
            assert_eq!(steady.try_recv().unwrap(), chat_frame(&n.to_string()));
        }
    }
}
