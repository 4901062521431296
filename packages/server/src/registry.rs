//! Room registry: room name to member sessions, shared by every session task.
//!
//! All reads and writes go through one lock over the whole map. Broadcasts
//! take a snapshot of the members under the lock and write outside it, so a
//! slow peer never blocks joins, leaves or listings.

use std::{collections::BTreeMap, sync::Arc};

use futures_util::future::join_all;
use tokio::sync::Mutex;

use crate::domain::{Room, SessionHandle, SessionId};

/// Result of one broadcast pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Members the payload was written to
    pub delivered: usize,
    /// Members whose write failed and who were removed from the room
    pub evicted: Vec<SessionId>,
}

/// Shared mapping from room name to its members.
///
/// Rooms are created on first join and kept after their last member leaves.
/// Room names are listed in lexicographic order.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Mutex<BTreeMap<String, Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `member` to `room`, creating the room if needed.
    ///
    /// A session belongs to at most one room, so it is removed from any other
    /// room first.
    pub async fn join(&self, room: &str, member: Arc<SessionHandle>) {
        let mut rooms = self.rooms.lock().await;
        let id = member.id();
        for (name, existing) in rooms.iter_mut() {
            if name != room {
                existing.remove_member(&id);
            }
        }
        rooms
            .entry(room.to_string())
            .or_insert_with(|| Room::new(room.to_string()))
            .add_member(member);
        tracing::debug!("Session '{}' added to room '{}'", id, room);
    }

    /// Remove a session from a room. Returns its handle if it was still a member.
    pub async fn leave(&self, room: &str, id: &SessionId) -> Option<Arc<SessionHandle>> {
        let mut rooms = self.rooms.lock().await;
        rooms.get_mut(room).and_then(|r| r.remove_member(id))
    }

    /// Names of every room ever created.
    pub async fn room_names(&self) -> Vec<String> {
        let rooms = self.rooms.lock().await;
        rooms.keys().cloned().collect()
    }

    /// Snapshot of a room's members (empty for unknown rooms).
    pub async fn members(&self, room: &str) -> Vec<Arc<SessionHandle>> {
        let rooms = self.rooms.lock().await;
        rooms.get(room).map(Room::members).unwrap_or_default()
    }

    /// Display names of a room's members, sorted.
    pub async fn member_names(&self, room: &str) -> Vec<String> {
        let rooms = self.rooms.lock().await;
        rooms.get(room).map(Room::member_names).unwrap_or_default()
    }

    pub async fn member_count(&self, room: &str) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.get(room).map(Room::member_count).unwrap_or(0)
    }

    /// Room the session currently belongs to, if any.
    pub async fn room_of(&self, id: &SessionId) -> Option<String> {
        let rooms = self.rooms.lock().await;
        rooms
            .values()
            .find(|room| room.contains(id))
            .map(|room| room.name().to_string())
    }

    /// Write `payload` to every member of `room` except `exclude`.
    ///
    /// Members whose write fails are evicted after the pass completes; the
    /// failure is not reported to anyone else.
    pub async fn broadcast(
        &self,
        room: &str,
        payload: &str,
        exclude: Option<SessionId>,
    ) -> BroadcastOutcome {
        let targets: Vec<Arc<SessionHandle>> = self
            .members(room)
            .await
            .into_iter()
            .filter(|member| Some(member.id()) != exclude)
            .collect();

        let results = join_all(targets.iter().map(|member| async move {
            let result = member.send_line(payload).await;
            (member, result)
        }))
        .await;

        let mut outcome = BroadcastOutcome::default();
        for (member, result) in results {
            match result {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        "Failed to deliver to '{}' ({}) in room '{}': {}",
                        member.name(),
                        member.id(),
                        room,
                        e
                    );
                    outcome.evicted.push(member.id());
                }
            }
        }

        if !outcome.evicted.is_empty() {
            let mut rooms = self.rooms.lock().await;
            if let Some(r) = rooms.get_mut(room) {
                for id in &outcome.evicted {
                    r.remove_member(id);
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaychat_shared::protocol::read_line;
    use tokio::io::{BufReader, DuplexStream};

    fn create_member(name: &str) -> (Arc<SessionHandle>, BufReader<DuplexStream>) {
        let (writer, reader) = tokio::io::duplex(1024);
        let member = Arc::new(SessionHandle::new(
            SessionId::generate(),
            name.to_string(),
            Box::new(writer),
        ));
        (member, BufReader::new(reader))
    }

    #[tokio::test]
    async fn test_room_list_is_empty_before_any_join() {
        // テスト項目: 参加前はルーム一覧が空
        // given (前提条件):
        let registry = RoomRegistry::new();

        // when (操作):
        let names = registry.room_names().await;

        // then (期待する結果):
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn test_room_listed_once_regardless_of_member_count() {
        // テスト項目: 何人参加してもルームは一覧に一度だけ現れる
        // given (前提条件):
        let registry = RoomRegistry::new();
        let (alice, _alice_rx) = create_member("alice");
        let (bob, _bob_rx) = create_member("bob");

        // when (操作):
        registry.join("X", alice).await;
        registry.join("X", bob).await;

        // then (期待する結果):
        assert_eq!(registry.room_names().await, vec!["X".to_string()]);
        assert_eq!(registry.member_count("X").await, 2);
    }

    #[tokio::test]
    async fn test_room_persists_after_last_member_leaves() {
        // テスト項目: 最後のメンバーが抜けてもルームは一覧に残る
        // given (前提条件):
        let registry = RoomRegistry::new();
        let (alice, _alice_rx) = create_member("alice");
        let alice_id = alice.id();
        registry.join("lobby", alice).await;

        // when (操作):
        let removed = registry.leave("lobby", &alice_id).await;

        // then (期待する結果):
        assert!(removed.is_some());
        assert_eq!(registry.member_count("lobby").await, 0);
        assert_eq!(registry.room_names().await, vec!["lobby".to_string()]);
    }

    #[tokio::test]
    async fn test_leave_twice_returns_none() {
        // テスト項目: 二度目の退室は None を返す（冪等性）
        // given (前提条件):
        let registry = RoomRegistry::new();
        let (alice, _alice_rx) = create_member("alice");
        let alice_id = alice.id();
        registry.join("lobby", alice).await;
        registry.leave("lobby", &alice_id).await;

        // when (操作):
        let second = registry.leave("lobby", &alice_id).await;

        // then (期待する結果):
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_session_belongs_to_at_most_one_room() {
        // テスト項目: 別のルームに参加すると元のルームから外れる
        // given (前提条件):
        let registry = RoomRegistry::new();
        let (alice, _alice_rx) = create_member("alice");
        let alice_id = alice.id();
        registry.join("lobby", alice.clone()).await;

        // when (操作):
        registry.join("games", alice).await;

        // then (期待する結果):
        assert_eq!(registry.room_of(&alice_id).await.as_deref(), Some("games"));
        assert_eq!(registry.member_count("lobby").await, 0);
        assert_eq!(
            registry.room_names().await,
            vec!["games".to_string(), "lobby".to_string()]
        );
    }

    #[tokio::test]
    async fn test_broadcast_reaches_room_members_only() {
        // テスト項目: ブロードキャストは同じルームのメンバーだけに届く
        // given (前提条件):
        let registry = RoomRegistry::new();
        let (alice, mut alice_rx) = create_member("alice");
        let (bob, mut bob_rx) = create_member("bob");
        let (carol, mut carol_rx) = create_member("carol");
        registry.join("lobby", alice).await;
        registry.join("lobby", bob).await;
        registry.join("games", carol.clone()).await;

        // when (操作):
        let outcome = registry.broadcast("lobby", "server: hello", None).await;
        carol.close().await;

        // then (期待する結果):
        assert_eq!(outcome.delivered, 2);
        assert!(outcome.evicted.is_empty());
        assert_eq!(
            read_line(&mut alice_rx).await.unwrap().as_deref(),
            Some("server: hello")
        );
        assert_eq!(
            read_line(&mut bob_rx).await.unwrap().as_deref(),
            Some("server: hello")
        );
        assert_eq!(read_line(&mut carol_rx).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_broadcast_skips_excluded_sender() {
        // テスト項目: 送信者自身にはメッセージが届かない
        // given (前提条件):
        let registry = RoomRegistry::new();
        let (alice, mut alice_rx) = create_member("alice");
        let (bob, mut bob_rx) = create_member("bob");
        let alice_id = alice.id();
        registry.join("lobby", alice.clone()).await;
        registry.join("lobby", bob).await;

        // when (操作):
        let outcome = registry
            .broadcast("lobby", "alice: hi", Some(alice_id))
            .await;
        alice.close().await;

        // then (期待する結果):
        assert_eq!(outcome.delivered, 1);
        assert_eq!(
            read_line(&mut bob_rx).await.unwrap().as_deref(),
            Some("alice: hi")
        );
        assert_eq!(read_line(&mut alice_rx).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_broadcast_evicts_failed_member_and_still_delivers() {
        // テスト項目: 書き込みに失敗したメンバーは除外され、他のメンバーには届く
        // given (前提条件):
        let registry = RoomRegistry::new();
        let (alice, mut alice_rx) = create_member("alice");
        let (bob, bob_rx) = create_member("bob");
        let bob_id = bob.id();
        registry.join("lobby", alice).await;
        registry.join("lobby", bob).await;
        drop(bob_rx);

        // when (操作):
        let outcome = registry.broadcast("lobby", "carol: hey", None).await;

        // then (期待する結果):
        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.evicted, vec![bob_id]);
        assert_eq!(registry.member_names("lobby").await, vec!["alice".to_string()]);
        assert_eq!(
            read_line(&mut alice_rx).await.unwrap().as_deref(),
            Some("carol: hey")
        );
    }

    #[tokio::test]
    async fn test_broadcast_to_unknown_room_is_noop() {
        // テスト項目: 存在しないルームへのブロードキャストは何もしない
        // given (前提条件):
        let registry = RoomRegistry::new();

        // when (操作):
        let outcome = registry.broadcast("nowhere", "hello", None).await;

        // then (期待する結果):
        assert_eq!(outcome, BroadcastOutcome::default());
        assert!(registry.room_names().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_joins_are_not_lost() {
        // テスト項目: 並行して参加しても更新が失われない
        // given (前提条件):
        let registry = Arc::new(RoomRegistry::new());
        let mut readers = Vec::new();
        let mut tasks = Vec::new();

        // when (操作):
        for index in 0..32 {
            let (member, reader) = create_member(&format!("user{}", index));
            readers.push(reader);
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                registry.join("lobby", member).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // then (期待する結果):
        assert_eq!(registry.member_count("lobby").await, 32);
    }
}
