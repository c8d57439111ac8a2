//! Insertion-ordered cascade queue.
//!
//! Every entity and collection reached during one persist call gets a slot
//! keyed by its [`ObjectId`]. A slot is either tentative (the entity is still
//! being expanded) or queued (finalized, safe to hand to storage). Slots never
//! move back from queued to tentative.
//!
//! Order is tracked with a sequence number per slot. Promoting a tentative
//! slot gives it a fresh sequence number, which moves the entity behind
//! everything queued while it was being expanded.

use orm_cascade_core::{CollectionRef, EntityRef, ObjectId};
use std::collections::{BTreeMap, HashMap};

/// Something the storage layer has to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueuedItem {
    /// An entity row.
    Entity(EntityRef),
    /// Collection-level state (join rows) of a plural relationship.
    Collection(CollectionRef),
}

impl QueuedItem {
    /// Identity of the queued object.
    pub fn id(&self) -> ObjectId {
        match self {
            QueuedItem::Entity(e) => e.id(),
            QueuedItem::Collection(c) => c.id(),
        }
    }

    /// The entity, if this is one.
    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            QueuedItem::Entity(e) => Some(e),
            QueuedItem::Collection(_) => None,
        }
    }

    /// The collection, if this is one.
    pub fn as_collection(&self) -> Option<&CollectionRef> {
        match self {
            QueuedItem::Collection(c) => Some(c),
            QueuedItem::Entity(_) => None,
        }
    }
}

/// Observable state of an object in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Visited and still being expanded.
    Tentative,
    /// Finalized.
    Queued,
}

#[derive(Debug)]
enum SlotState {
    Tentative,
    Queued(QueuedItem),
}

#[derive(Debug)]
struct Slot {
    seq: u64,
    state: SlotState,
}

/// Accumulates the result of a cascade traversal.
#[derive(Debug, Default)]
pub struct CascadeQueue {
    slots: HashMap<ObjectId, Slot>,
    order: BTreeMap<u64, ObjectId>,
    next_seq: u64,
}

impl CascadeQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the object has a slot (tentative or queued).
    pub fn contains(&self, id: ObjectId) -> bool {
        self.slots.contains_key(&id)
    }

    /// State of the object, `None` if never visited.
    pub fn state(&self, id: ObjectId) -> Option<QueueState> {
        self.slots.get(&id).map(|slot| match slot.state {
            SlotState::Tentative => QueueState::Tentative,
            SlotState::Queued(_) => QueueState::Queued,
        })
    }

    /// Whether the object is currently being expanded.
    pub fn is_tentative(&self, id: ObjectId) -> bool {
        self.state(id) == Some(QueueState::Tentative)
    }

    /// Reserve a tentative slot for an entity about to be expanded.
    ///
    /// Does nothing if the entity already has a slot.
    pub fn mark_tentative(&mut self, entity: &EntityRef) {
        let id = entity.id();
        if self.slots.contains_key(&id) {
            return;
        }
        let seq = self.bump();
        self.order.insert(seq, id);
        self.slots.insert(
            id,
            Slot {
                seq,
                state: SlotState::Tentative,
            },
        );
    }

    /// Finalize an item.
    ///
    /// Absent items are appended. Tentative items are promoted and moved to the
    /// end. Items that are already queued keep their position.
    pub fn enqueue(&mut self, item: QueuedItem) {
        let id = item.id();
        let seq = match self.slots.get(&id) {
            Some(Slot {
                state: SlotState::Queued(_),
                ..
            }) => return,
            Some(Slot {
                seq,
                state: SlotState::Tentative,
            }) => {
                let old = *seq;
                self.order.remove(&old);
                self.bump()
            }
            None => self.bump(),
        };
        self.order.insert(seq, id);
        self.slots.insert(
            id,
            Slot {
                seq,
                state: SlotState::Queued(item),
            },
        );
    }

    /// Number of slots, tentative ones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing was visited.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether any slot is still tentative.
    pub fn has_tentative(&self) -> bool {
        self.slots
            .values()
            .any(|slot| matches!(slot.state, SlotState::Tentative))
    }

    /// Finalized items in queue order.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedItem> {
        self.order
            .values()
            .filter_map(|id| match &self.slots.get(id)?.state {
                SlotState::Queued(item) => Some(item),
                SlotState::Tentative => None,
            })
    }

    /// Position of a finalized item in queue order.
    pub fn position(&self, id: ObjectId) -> Option<usize> {
        self.iter().position(|item| item.id() == id)
    }

    /// Consume the queue, returning finalized items in order.
    pub fn into_items(mut self) -> Vec<QueuedItem> {
        let order = std::mem::take(&mut self.order);
        order
            .into_values()
            .filter_map(|id| match self.slots.remove(&id)?.state {
                SlotState::Queued(item) => Some(item),
                SlotState::Tentative => None,
            })
            .collect()
    }

    fn bump(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}
