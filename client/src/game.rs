//! Shared player state, the inbound message router, and outbound staging.

use log::{debug, info, warn};
use parking_lot::Mutex;
use shared::{Message, Player};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Upper bound on staged-but-unsent moves. Past it the oldest entry is
/// dropped.
pub const STAGING_CAPACITY: usize = 256;

/// Player map plus the identity of the locally controlled entry.
///
/// Mutated by the router on the network side and read by the simulation
/// loop on its own thread; always accessed through the session's mutex.
#[derive(Debug, Default)]
pub struct World {
    players: HashMap<u32, Player>,
    controlled: Option<u32>,
}

pub type SharedWorld = Arc<Mutex<World>>;

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one inbound message to the player map.
    pub fn apply(&mut self, msg: &Message) {
        match msg {
            Message::NewConnection { id } => self.apply_new_connection(*id),
            Message::PlayerMove { id, pos_x, pos_y } => {
                self.apply_player_move(*id, *pos_x, *pos_y)
            }
            Message::Unknown => debug!("Ignoring message with unrecognized type"),
        }
    }

    fn apply_new_connection(&mut self, id: u32) {
        match self.controlled {
            // The first announcement of a session is the local id
            // assignment.
            None => {
                self.players.insert(id, Player::spawn(id));
                self.controlled = Some(id);
                info!("Assigned controlled player {}", id);
            }
            Some(own_id) if own_id == id => {
                debug!("Duplicate announcement for controlled player {}", id);
            }
            // A peer joined. It spawns at the default position; its real
            // position arrives with its next move.
            Some(_) => {
                if self.players.contains_key(&id) {
                    debug!("Duplicate announcement for remote player {}", id);
                } else {
                    self.players.insert(id, Player::spawn(id));
                    info!("Remote player {} joined", id);
                }
            }
        }
    }

    fn apply_player_move(&mut self, id: u32, pos_x: f32, pos_y: f32) {
        match self.players.get_mut(&id) {
            Some(player) => player.set_position(pos_x, pos_y),
            // A move can outrun its join announcement; the next move
            // carries the full position.
            None => warn!("Dropping move for unknown player {}", id),
        }
    }

    pub fn controlled_id(&self) -> Option<u32> {
        self.controlled
    }

    pub fn controlled_player(&self) -> Option<&Player> {
        self.controlled.and_then(|id| self.players.get(&id))
    }

    pub fn player(&self, id: u32) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Single consumer of the inbound queue.
///
/// Runs until the queue closes, which happens when the bridge's receiver
/// task loses the transport. Every message is contained: nothing a peer
/// sends can make this loop exit early.
pub struct MessageRouter {
    world: SharedWorld,
    inbound: mpsc::Receiver<Message>,
}

impl MessageRouter {
    pub fn new(world: SharedWorld, inbound: mpsc::Receiver<Message>) -> Self {
        Self { world, inbound }
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.inbound.recv().await {
            self.world.lock().apply(&msg);
        }
        info!("Inbound queue closed, router stopping");
    }
}

/// FIFO holding area for moves awaiting transmission.
///
/// The simulation thread stages, the async pump drains; the mutex is held
/// only for the push or the drain itself. Order is preserved end to end so
/// a player's earlier move can never overtake a later one.
pub struct OutboundStaging {
    staged: Mutex<VecDeque<Message>>,
    capacity: usize,
}

impl OutboundStaging {
    pub fn new(capacity: usize) -> Self {
        Self {
            staged: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Appends a message. At capacity the oldest entry is dropped; the
    /// order of what remains is untouched.
    pub fn stage(&self, msg: Message) {
        let mut staged = self.staged.lock();
        if staged.len() == self.capacity {
            staged.pop_front();
            warn!("Staging buffer full, dropping oldest staged message");
        }
        staged.push_back(msg);
    }

    /// Removes and returns everything staged, oldest first.
    pub fn drain(&self) -> Vec<Message> {
        self.staged.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.staged.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{SPAWN_X, SPAWN_Y};

    fn move_msg(id: u32, x: f32, y: f32) -> Message {
        Message::PlayerMove {
            id,
            pos_x: x,
            pos_y: y,
        }
    }

    #[test]
    fn test_first_announcement_assigns_controlled_player() {
        let mut world = World::new();
        world.apply(&Message::NewConnection { id: 1 });

        assert_eq!(world.controlled_id(), Some(1));
        let player = world.controlled_player().unwrap();
        assert_eq!(player.x, SPAWN_X);
        assert_eq!(player.y, SPAWN_Y);
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_later_announcement_creates_remote_player() {
        let mut world = World::new();
        world.apply(&Message::NewConnection { id: 1 });
        world.apply(&Message::NewConnection { id: 2 });

        assert_eq!(world.controlled_id(), Some(1));
        assert_eq!(world.len(), 2);
        assert!(world.player(2).is_some());
    }

    #[test]
    fn test_duplicate_announcement_changes_nothing() {
        let mut world = World::new();
        world.apply(&Message::NewConnection { id: 1 });
        world.apply(&Message::NewConnection { id: 2 });
        world.apply(&move_msg(2, 50.0, 60.0));

        world.apply(&Message::NewConnection { id: 2 });
        world.apply(&Message::NewConnection { id: 1 });

        assert_eq!(world.controlled_id(), Some(1));
        assert_eq!(world.len(), 2);
        // The remote player keeps its last known position.
        let player = world.player(2).unwrap();
        assert_eq!(player.x, 50.0);
        assert_eq!(player.y, 60.0);
    }

    #[test]
    fn test_move_updates_position() {
        let mut world = World::new();
        world.apply(&Message::NewConnection { id: 1 });
        world.apply(&move_msg(1, 5.0, 5.0));

        let player = world.player(1).unwrap();
        assert_eq!(player.x, 5.0);
        assert_eq!(player.y, 5.0);
    }

    #[test]
    fn test_replayed_move_is_idempotent() {
        let mut world = World::new();
        world.apply(&Message::NewConnection { id: 1 });

        world.apply(&move_msg(1, 5.0, 5.0));
        let after_once = world.player(1).unwrap().clone();

        world.apply(&move_msg(1, 5.0, 5.0));
        let after_twice = world.player(1).unwrap().clone();

        assert_eq!(after_once, after_twice);
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_orphaned_move_is_dropped() {
        let mut world = World::new();
        world.apply(&Message::NewConnection { id: 1 });

        world.apply(&move_msg(7, 5.0, 5.0));

        assert!(world.player(7).is_none());
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_move_applies_once_join_is_observed() {
        let mut world = World::new();
        world.apply(&Message::NewConnection { id: 1 });

        // Move before join: dropped.
        world.apply(&move_msg(7, 5.0, 5.0));
        assert!(world.player(7).is_none());

        // Join, then the same move: applied.
        world.apply(&Message::NewConnection { id: 7 });
        world.apply(&move_msg(7, 5.0, 5.0));

        let player = world.player(7).unwrap();
        assert_eq!(player.x, 5.0);
        assert_eq!(player.y, 5.0);
    }

    #[test]
    fn test_unknown_message_is_ignored() {
        let mut world = World::new();
        world.apply(&Message::Unknown);

        assert!(world.is_empty());
        assert_eq!(world.controlled_id(), None);
    }

    #[test]
    fn test_staging_preserves_fifo_order() {
        let staging = OutboundStaging::new(STAGING_CAPACITY);
        staging.stage(move_msg(1, 1.0, 1.0));
        staging.stage(move_msg(1, 2.0, 2.0));
        staging.stage(move_msg(1, 3.0, 3.0));

        let drained = staging.drain();
        assert_eq!(
            drained,
            vec![
                move_msg(1, 1.0, 1.0),
                move_msg(1, 2.0, 2.0),
                move_msg(1, 3.0, 3.0),
            ]
        );
    }

    #[test]
    fn test_staging_drain_empties_buffer() {
        let staging = OutboundStaging::new(STAGING_CAPACITY);
        staging.stage(move_msg(1, 1.0, 1.0));

        assert_eq!(staging.drain().len(), 1);
        assert!(staging.is_empty());
        assert!(staging.drain().is_empty());
    }

    #[test]
    fn test_staging_drops_oldest_at_capacity() {
        let staging = OutboundStaging::new(2);
        staging.stage(move_msg(1, 1.0, 1.0));
        staging.stage(move_msg(1, 2.0, 2.0));
        staging.stage(move_msg(1, 3.0, 3.0));

        assert_eq!(staging.len(), 2);
        let drained = staging.drain();
        assert_eq!(drained, vec![move_msg(1, 2.0, 2.0), move_msg(1, 3.0, 3.0)]);
    }

    #[tokio::test]
    async fn test_router_applies_messages_until_queue_closes() {
        let world: SharedWorld = Arc::new(Mutex::new(World::new()));
        let (tx, rx) = mpsc::channel(16);

        let router = MessageRouter::new(Arc::clone(&world), rx);
        let handle = tokio::spawn(router.run());

        tx.send(Message::NewConnection { id: 1 }).await.unwrap();
        tx.send(move_msg(1, 9.0, 9.0)).await.unwrap();
        drop(tx);

        handle.await.unwrap();

        let world = world.lock();
        assert_eq!(world.controlled_id(), Some(1));
        let player = world.player(1).unwrap();
        assert_eq!(player.x, 9.0);
        assert_eq!(player.y, 9.0);
    }
}
