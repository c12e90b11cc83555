use bytes::Bytes;
use log::*;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Write end of one receiver's frame queue.
///
/// Writes never wait on the remote client: frames are queued and drained by the
/// connection's own response stream, so a lagging client only delays itself.
#[derive(Debug, Clone)]
pub struct ReceiverHandle {
    id: ConnectionId,
    sender: UnboundedSender<Bytes>,
}

impl ReceiverHandle {
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Queue a frame for this receiver. Fails only once the receiving side is gone.
    pub fn write(&self, frame: Bytes) -> Result<(), SendError<Bytes>> {
        self.sender.send(frame)
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Read side handed back to the caller of [`ConnectionRegistry::attach`].
#[derive(Debug)]
pub struct Attachment {
    pub id: ConnectionId,
    pub frames: UnboundedReceiver<Bytes>,
}

/// The set of currently attached receivers.
///
/// Attach, detach, iteration and clear all take the same lock, so iteration never
/// observes a partially updated set and two broadcasts never interleave.
#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, ReceiverHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new receiver and return its read side.
    ///
    /// `greeting` is queued before the handle becomes visible to [`Self::for_each`],
    /// so it is always the first frame the receiver observes.
    pub fn attach(&self, greeting: Option<Bytes>) -> Attachment {
        let (sender, frames) = mpsc::unbounded_channel();
        let handle = ReceiverHandle {
            id: ConnectionId::new(),
            sender,
        };

        if let Some(frame) = greeting {
            // The receiver is still in scope, this cannot fail.
            let _ = handle.write(frame);
        }

        let id = handle.id.clone();
        self.lock().insert(id.clone(), handle);

        Attachment { id, frames }
    }

    /// Remove a receiver. Returns `false` if it was already gone.
    pub fn detach(&self, connection_id: &ConnectionId) -> bool {
        let removed = self.lock().remove(connection_id).is_some();
        if !removed {
            trace!(
                "Connection {} already detached, ignoring",
                connection_id.as_str()
            );
        }
        removed
    }

    /// Visit every registered receiver exactly once.
    ///
    /// The registry stays locked for the whole walk; `visit` must not call back
    /// into the registry.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&ReceiverHandle),
    {
        let connections = self.lock();
        for handle in connections.values() {
            visit(handle);
        }
    }

    /// Drop every receiver at once, ending their streams. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut connections = self.lock();
        let count = connections.len();
        connections.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic inside a visitor must not take the relay down with it.
    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, ReceiverHandle>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_attach_registers_distinct_handles() {
        let registry = ConnectionRegistry::new();

        let first = registry.attach(None);
        let second = registry.attach(None);

        assert_ne!(first.id, second.id);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_greeting_is_first_frame() {
        let registry = ConnectionRegistry::new();
        let mut attachment = registry.attach(Some(Bytes::from_static(b"hello")));

        registry.for_each(|handle| {
            handle.write(Bytes::from_static(b"second")).unwrap();
        });

        assert_eq!(attachment.frames.try_recv().unwrap(), "hello");
        assert_eq!(attachment.frames.try_recv().unwrap(), "second");
        assert!(attachment.frames.try_recv().is_err());
    }

    #[test]
    fn test_detach_removes_only_the_given_handle() {
        let registry = ConnectionRegistry::new();
        let first = registry.attach(None);
        let second = registry.attach(None);

        assert!(registry.detach(&first.id));

        let mut visited = Vec::new();
        registry.for_each(|handle| visited.push(handle.id().clone()));
        assert_eq!(visited, vec![second.id.clone()]);
    }

    #[test]
    fn test_detach_twice_is_a_no_op() {
        let registry = ConnectionRegistry::new();
        let attachment = registry.attach(None);
        let _other = registry.attach(None);

        assert!(registry.detach(&attachment.id));
        assert!(!registry.detach(&attachment.id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_detach_unknown_id_is_a_no_op() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.detach(&ConnectionId::new()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_for_each_visits_every_handle_exactly_once() {
        let registry = ConnectionRegistry::new();
        let ids: HashSet<ConnectionId> = (0..16).map(|_| registry.attach(None).id).collect();

        let mut visited = Vec::new();
        registry.for_each(|handle| visited.push(handle.id().clone()));

        assert_eq!(visited.len(), ids.len());
        assert_eq!(visited.into_iter().collect::<HashSet<_>>(), ids);
    }

    #[test]
    fn test_write_to_dropped_receiver_fails_without_removing_it() {
        let registry = ConnectionRegistry::new();
        let attachment = registry.attach(None);
        drop(attachment.frames);

        let mut failures = 0;
        registry.for_each(|handle| {
            assert!(handle.is_closed());
            if handle.write(Bytes::from_static(b"x")).is_err() {
                failures += 1;
            }
        });

        assert_eq!(failures, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_clear_closes_every_stream() {
        let registry = ConnectionRegistry::new();
        let mut first = registry.attach(None);
        let mut second = registry.attach(None);

        assert_eq!(registry.clear(), 2);
        assert!(registry.is_empty());
        assert_eq!(
            first.frames.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        );
        assert_eq!(
            second.frames.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        );
    }

    #[test]
    fn test_registry_survives_panicking_visitor() {
        let registry = std::sync::Arc::new(ConnectionRegistry::new());
        let _attachment = registry.attach(None);

        let cloned = registry.clone();
        let result = std::thread::spawn(move || {
            cloned.for_each(|_| panic!("visitor failed"));
        })
        .join();

        assert!(result.is_err());
        assert_eq!(registry.len(), 1);
        let _second = registry.attach(None);
        assert_eq!(registry.len(), 2);
    }
}
