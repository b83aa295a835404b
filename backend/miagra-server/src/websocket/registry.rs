/// WebSocket connection registry.
///
/// Tracks live connections per user plus per-room subscriptions, and routes
/// server events to them. Owned by `AppState`; sessions receive it
/// explicitly, nothing here is global.
///
/// Delivery is best-effort: a user with no live connection simply misses
/// the push, and the durable store row remains the record.
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

use super::events::ServerEvent;

/// Unique identifier for one WebSocket connection. A user with several
/// open tabs holds several of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// One live connection: its id and the channel into its session.
#[derive(Clone)]
struct Connection {
    id: ConnectionId,
    sender: UnboundedSender<ServerEvent>,
}

#[derive(Default)]
struct RegistryInner {
    /// user_id -> that user's live connections
    users: HashMap<Uuid, Vec<Connection>>,
    /// pair room key -> connections subscribed to the room
    rooms: HashMap<String, Vec<Connection>>,
}

#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection for `user_id`.
    ///
    /// Returns the connection id (needed for cleanup) and the receiver the
    /// session drains into its socket.
    pub async fn register(&self, user_id: Uuid) -> (ConnectionId, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = unbounded_channel();
        let connection = Connection {
            id: ConnectionId::new(),
            sender: tx,
        };
        let connection_id = connection.id;

        let mut guard = self.inner.write().await;
        guard.users.entry(user_id).or_default().push(connection);

        tracing::debug!(
            %user_id,
            connections = guard.users.get(&user_id).map(|v| v.len()).unwrap_or(0),
            "websocket connection registered"
        );

        (connection_id, rx)
    }

    /// Remove exactly this connection: its user entry and every room
    /// subscription it holds. Other connections of the same user stay.
    pub async fn deregister(&self, user_id: Uuid, connection_id: ConnectionId) {
        let mut guard = self.inner.write().await;

        if let Some(connections) = guard.users.get_mut(&user_id) {
            connections.retain(|c| c.id != connection_id);
            if connections.is_empty() {
                guard.users.remove(&user_id);
            }
        }

        guard.rooms.retain(|_, members| {
            members.retain(|c| c.id != connection_id);
            !members.is_empty()
        });

        tracing::debug!(%user_id, "websocket connection deregistered");
    }

    /// Subscribe an already-registered connection to a room. A connection
    /// joins each room at most once; joining an unknown connection is a
    /// no-op.
    pub async fn join_room(&self, room: &str, user_id: Uuid, connection_id: ConnectionId) {
        let mut guard = self.inner.write().await;

        let Some(connection) = guard
            .users
            .get(&user_id)
            .and_then(|v| v.iter().find(|c| c.id == connection_id))
            .cloned()
        else {
            return;
        };

        let members = guard.rooms.entry(room.to_string()).or_default();
        if members.iter().all(|c| c.id != connection_id) {
            members.push(connection);
        }
    }

    /// Push an event to every live connection of one user. Dead senders are
    /// pruned on the way. Returns how many connections took the event.
    pub async fn relay_to_user(&self, user_id: Uuid, event: ServerEvent) -> usize {
        let mut guard = self.inner.write().await;

        let Some(connections) = guard.users.get_mut(&user_id) else {
            return 0;
        };

        connections.retain(|c| c.sender.send(event.clone()).is_ok());
        let delivered = connections.len();
        if delivered == 0 {
            guard.users.remove(&user_id);
        }

        delivered
    }

    /// Push an event to every room member, the originating connection
    /// included (it renders its own echo). Dead senders are pruned.
    pub async fn relay_to_room(&self, room: &str, event: ServerEvent) -> usize {
        let mut guard = self.inner.write().await;

        let Some(members) = guard.rooms.get_mut(room) else {
            return 0;
        };

        members.retain(|c| c.sender.send(event.clone()).is_ok());
        let delivered = members.len();
        if delivered == 0 {
            guard.rooms.remove(room);
        }

        delivered
    }

    pub async fn is_connected(&self, user_id: Uuid) -> bool {
        let guard = self.inner.read().await;
        guard.users.get(&user_id).is_some_and(|v| !v.is_empty())
    }

    pub async fn connection_count(&self, user_id: Uuid) -> usize {
        let guard = self.inner.read().await;
        guard.users.get(&user_id).map(|v| v.len()).unwrap_or(0)
    }

    pub async fn connected_users_count(&self) -> usize {
        let guard = self.inner.read().await;
        guard.users.len()
    }

    pub async fn room_member_count(&self, room: &str) -> usize {
        let guard = self.inner.read().await;
        guard.rooms.get(room).map(|v| v.len()).unwrap_or(0)
    }

    /// Drop every connection and room. Used on shutdown and in tests.
    pub async fn clear(&self) {
        let mut guard = self.inner.write().await;
        guard.users.clear();
        guard.rooms.clear();
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typing_event(user_id: Uuid) -> ServerEvent {
        ServerEvent::UserTyping {
            user_id,
            is_typing: true,
        }
    }

    #[tokio::test]
    async fn test_register_and_count() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        assert!(!registry.is_connected(user_id).await);

        let (_id, _rx) = registry.register(user_id).await;
        assert!(registry.is_connected(user_id).await);
        assert_eq!(registry.connection_count(user_id).await, 1);
        assert_eq!(registry.connected_users_count().await, 1);
    }

    #[tokio::test]
    async fn test_multiple_connections_per_user() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        let (_id1, mut rx1) = registry.register(user_id).await;
        let (_id2, mut rx2) = registry.register(user_id).await;
        assert_eq!(registry.connection_count(user_id).await, 2);

        let delivered = registry.relay_to_user(user_id, typing_event(user_id)).await;
        assert_eq!(delivered, 2);
        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_deregister_removes_only_that_connection() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        let (id1, _rx1) = registry.register(user_id).await;
        let (_id2, _rx2) = registry.register(user_id).await;

        registry.deregister(user_id, id1).await;
        assert_eq!(registry.connection_count(user_id).await, 1);
        assert!(registry.is_connected(user_id).await);
    }

    #[tokio::test]
    async fn test_deregister_last_connection_clears_user() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        let (id, _rx) = registry.register(user_id).await;
        registry.deregister(user_id, id).await;

        assert!(!registry.is_connected(user_id).await);
        assert_eq!(registry.connected_users_count().await, 0);
    }

    #[tokio::test]
    async fn test_relay_to_offline_user_is_a_noop() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        let delivered = registry.relay_to_user(user_id, typing_event(user_id)).await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_relay_prunes_dead_connections() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        let (_id1, rx1) = registry.register(user_id).await;
        let (_id2, mut rx2) = registry.register(user_id).await;
        drop(rx1);

        let delivered = registry.relay_to_user(user_id, typing_event(user_id)).await;
        assert_eq!(delivered, 1);
        assert_eq!(registry.connection_count(user_id).await, 1);
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_room_relay_reaches_every_member() {
        let registry = ConnectionRegistry::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let (alice_id, mut alice_rx) = registry.register(alice).await;
        let (bob_id, mut bob_rx) = registry.register(bob).await;

        registry.join_room("room", alice, alice_id).await;
        registry.join_room("room", bob, bob_id).await;
        assert_eq!(registry.room_member_count("room").await, 2);

        let delivered = registry.relay_to_room("room", typing_event(alice)).await;
        assert_eq!(delivered, 2);

        assert!(alice_rx.recv().await.is_some());
        assert!(bob_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_room_relay_to_empty_room_is_a_noop() {
        let registry = ConnectionRegistry::new();
        let delivered = registry
            .relay_to_room("nobody-here", typing_event(Uuid::new_v4()))
            .await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_join_room_is_idempotent_per_connection() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();
        let (id, _rx) = registry.register(user_id).await;

        registry.join_room("room", user_id, id).await;
        registry.join_room("room", user_id, id).await;

        assert_eq!(registry.room_member_count("room").await, 1);
    }

    #[tokio::test]
    async fn test_join_room_unknown_connection_is_ignored() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();

        registry.join_room("room", user_id, ConnectionId::new()).await;
        assert_eq!(registry.room_member_count("room").await, 0);
    }

    #[tokio::test]
    async fn test_deregister_sweeps_rooms() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();
        let (id, _rx) = registry.register(user_id).await;

        registry.join_room("room", user_id, id).await;
        registry.deregister(user_id, id).await;

        assert_eq!(registry.room_member_count("room").await, 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let registry = ConnectionRegistry::new();
        let user_id = Uuid::new_v4();
        let (id, _rx) = registry.register(user_id).await;
        registry.join_room("room", user_id, id).await;

        registry.clear().await;

        assert_eq!(registry.connected_users_count().await, 0);
        assert_eq!(registry.room_member_count("room").await, 0);
    }
}
