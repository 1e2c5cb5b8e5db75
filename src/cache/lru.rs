//! LRU List Module
//!
//! Recency list for cache entries, stored in a slot arena and linked by
//! slot indices so that touch, unlink and tail pops are all O(1).
//!
//! Head = most recently used, tail = least recently used.

use std::ops::Range;

use crate::cache::CacheEntry;

/// Index of a slot in the list arena.
pub type SlotId = usize;

/// Sentinel for "no neighbour".
const NIL: SlotId = usize::MAX;

#[derive(Debug)]
struct Node<V> {
    entry: CacheEntry<V>,
    prev: SlotId,
    next: SlotId,
}

// == LRU List ==
/// Doubly-linked recency list over an arena of entry slots.
///
/// Freed slots are recycled through a free list. A `SlotId` stays valid until
/// the entry in it is removed.
#[derive(Debug)]
pub struct LruList<V> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<SlotId>,
    head: SlotId,
    tail: SlotId,
    len: usize,
}

impl<V> Default for LruList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> LruList<V> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    // == Push Front ==
    /// Links a new entry at the head and returns its slot.
    pub fn push_front(&mut self, entry: CacheEntry<V>) -> SlotId {
        let node = Node {
            entry,
            prev: NIL,
            next: self.head,
        };

        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        if self.head != NIL {
            self.node_mut(self.head).prev = id;
        } else {
            self.tail = id;
        }
        self.head = id;
        self.len += 1;
        id
    }

    // == Move To Front ==
    /// Marks a slot as most recently used.
    pub fn move_to_front(&mut self, id: SlotId) {
        if self.head == id {
            return;
        }
        self.unlink(id);

        let old_head = self.head;
        {
            let node = self.node_mut(id);
            node.prev = NIL;
            node.next = old_head;
        }
        if old_head != NIL {
            self.node_mut(old_head).prev = id;
        } else {
            self.tail = id;
        }
        self.head = id;
    }

    // == Remove ==
    /// Unlinks a slot and returns its entry.
    ///
    /// Returns None if the slot is not occupied.
    pub fn remove(&mut self, id: SlotId) -> Option<CacheEntry<V>> {
        if !matches!(self.slots.get(id), Some(Some(_))) {
            return None;
        }
        self.unlink(id);
        let node = self.slots[id].take()?;
        self.free.push(id);
        self.len -= 1;
        Some(node.entry)
    }

    // == Pop Back ==
    /// Removes and returns the least recently used entry.
    pub fn pop_back(&mut self) -> Option<CacheEntry<V>> {
        if self.tail == NIL {
            None
        } else {
            self.remove(self.tail)
        }
    }

    pub fn get(&self, id: SlotId) -> Option<&CacheEntry<V>> {
        self.slots.get(id)?.as_ref().map(|node| &node.entry)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut CacheEntry<V>> {
        self.slots.get_mut(id)?.as_mut().map(|node| &mut node.entry)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every entry and releases the arena.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
        self.len = 0;
    }

    /// Number of arena slots, occupied or free. Bounds `entries_in`.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Occupied slots within `range`, in slot order. Out-of-range slots are
    /// skipped.
    pub fn entries_in(
        &self,
        range: Range<SlotId>,
    ) -> impl Iterator<Item = (SlotId, &CacheEntry<V>)> + '_ {
        let end = range.end.min(self.slots.len());
        let start = range.start.min(end);
        self.slots[start..end]
            .iter()
            .enumerate()
            .filter_map(move |(offset, slot)| {
                slot.as_ref().map(|node| (start + offset, &node.entry))
            })
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn unlink(&mut self, id: SlotId) {
        let (prev, next) = {
            let node = self.node(id);
            (node.prev, node.next)
        };

        if prev != NIL {
            self.node_mut(prev).next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.node_mut(next).prev = prev;
        } else {
            self.tail = prev;
        }
    }

    // Links only ever point at occupied slots, so a vacant slot here is a
    // corrupted list.
    fn node(&self, id: SlotId) -> &Node<V> {
        match self.slots[id].as_ref() {
            Some(node) => node,
            None => unreachable!("linked slot {id} is vacant"),
        }
    }

    fn node_mut(&mut self, id: SlotId) -> &mut Node<V> {
        match self.slots[id].as_mut() {
            Some(node) => node,
            None => unreachable!("linked slot {id} is vacant"),
        }
    }
}

/// Iterator over entries in recency order.
pub struct Iter<'a, V> {
    list: &'a LruList<V>,
    cursor: SlotId,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (SlotId, &'a CacheEntry<V>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let id = self.cursor;
        let node = self.list.node(id);
        self.cursor = node.next;
        Some((id, &node.entry))
    }
}
