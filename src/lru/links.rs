//! Provides the recency list used by the [LRUCache](crate::lru::LRUCache).
//!
//! Entries live in an arena (a plain **Vec**) and are linked via the indices of their neighbours
//! instead of pointers. An index handed out by [Links::push_front] stays valid until the entry is
//! removed again, which is what permits the cache to keep a key index pointing into this list and
//! still move or remove any entry in O(1). Slots of removed entries are recycled via a free list so
//! that the arena never grows beyond the peak number of entries.

/// A single slot of the arena.
///
/// **prev** points towards the head (more recently used), **next** towards the tail.
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// A doubly linked list of key/value pairs stored in an arena.
///
/// The head is the most recently used entry, the tail the least recently used one.
pub(crate) struct Links<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<K, V> Links<K, V> {
    /// Creates an empty list which has room for **capacity** entries before re-allocating.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Links {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Returns the number of linked entries.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns the number of slots allocated in the arena (occupied or free).
    #[cfg(test)]
    pub(crate) fn allocated_slots(&self) -> usize {
        self.slots.len()
    }

    /// Returns the index of the least recently used entry.
    pub(crate) fn back(&self) -> Option<usize> {
        self.tail
    }

    /// Returns the key and value stored in the given slot.
    pub(crate) fn entry(&self, index: usize) -> Option<(&K, &V)> {
        self.node(index).map(|node| (&node.key, &node.value))
    }

    /// Returns a mutable reference to the value stored in the given slot.
    pub(crate) fn value_mut(&mut self, index: usize) -> Option<&mut V> {
        self.slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .map(|node| &mut node.value)
    }

    /// Inserts a new entry at the head and returns its (stable) index.
    pub(crate) fn push_front(&mut self, key: K, value: V) -> usize {
        let node = Node {
            key,
            value,
            prev: None,
            next: self.head,
        };

        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                index
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        match self.head {
            Some(head) => self.set_prev(head, Some(index)),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
        self.len += 1;

        index
    }

    /// Moves the given entry to the head of the list.
    ///
    /// Does nothing if the slot is vacant or already the head.
    pub(crate) fn move_to_front(&mut self, index: usize) {
        if self.head == Some(index) || self.node(index).is_none() {
            return;
        }

        self.unlink(index);

        let previous_head = self.head;
        if let Some(Some(node)) = self.slots.get_mut(index) {
            node.prev = None;
            node.next = previous_head;
        }
        match previous_head {
            Some(head) => self.set_prev(head, Some(index)),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
    }

    /// Removes the given entry and returns its key and value.
    ///
    /// The slot is handed to the free list and may be returned by a later **push_front**.
    pub(crate) fn remove(&mut self, index: usize) -> Option<(K, V)> {
        if self.node(index).is_none() {
            return None;
        }
        self.unlink(index);

        let node = self.slots.get_mut(index).and_then(Option::take)?;
        self.free.push(index);
        self.len -= 1;

        Some((node.key, node.value))
    }

    /// Removes the least recently used entry.
    pub(crate) fn pop_back(&mut self) -> Option<(K, V)> {
        self.tail.and_then(|tail| self.remove(tail))
    }

    /// Drops all entries and releases the free list.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterates over all keys, starting with the least recently used one.
    pub(crate) fn keys_from_back(&self) -> impl Iterator<Item = &K> + '_ {
        let mut cursor = self.tail;
        std::iter::from_fn(move || {
            let node = self.node(cursor?)?;
            cursor = node.prev;
            Some(&node.key)
        })
    }

    fn node(&self, index: usize) -> Option<&Node<K, V>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    fn set_prev(&mut self, index: usize, prev: Option<usize>) {
        if let Some(Some(node)) = self.slots.get_mut(index) {
            node.prev = prev;
        }
    }

    fn set_next(&mut self, index: usize, next: Option<usize>) {
        if let Some(Some(node)) = self.slots.get_mut(index) {
            node.next = next;
        }
    }

    /// Detaches the given node from its neighbours and fixes up head and tail.
    ///
    /// The node's own links are left as they are and must be rewritten by the caller.
    fn unlink(&mut self, index: usize) {
        let (prev, next) = match self.node(index) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev) => self.set_next(prev, next),
            None => self.head = next,
        }
        match next {
            Some(next) => self.set_prev(next, prev),
            None => self.tail = prev,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lru::links::Links;

    fn keys(links: &Links<i32, i32>) -> Vec<i32> {
        links.keys_from_back().copied().collect()
    }

    #[test]
    fn push_and_move_keep_order() {
        let mut links = Links::with_capacity(4);
        let one = links.push_front(1, 10);
        let _ = links.push_front(2, 20);
        let three = links.push_front(3, 30);
        assert_eq!(keys(&links), vec![1, 2, 3]);

        // Moving the tail to the front makes the second entry the new tail...
        links.move_to_front(one);
        assert_eq!(keys(&links), vec![2, 3, 1]);

        // ...and moving the head again is a no-op.
        links.move_to_front(one);
        assert_eq!(keys(&links), vec![2, 3, 1]);

        links.move_to_front(three);
        assert_eq!(keys(&links), vec![2, 1, 3]);
        assert_eq!(links.entry(links.back().unwrap()), Some((&2, &20)));
    }

    #[test]
    fn removal_unlinks_from_any_position() {
        let mut links = Links::with_capacity(4);
        let one = links.push_front(1, 10);
        let two = links.push_front(2, 20);
        let three = links.push_front(3, 30);

        assert_eq!(links.remove(two), Some((2, 20)));
        assert_eq!(keys(&links), vec![1, 3]);
        assert_eq!(links.remove(two), None);

        assert_eq!(links.remove(three), Some((3, 30)));
        assert_eq!(keys(&links), vec![1]);

        assert_eq!(links.pop_back(), Some((1, 10)));
        assert_eq!(links.len(), 0);
        assert_eq!(links.back(), None);
        assert_eq!(links.entry(one), None);
        assert_eq!(links.pop_back(), None);
    }

    #[test]
    fn slots_are_recycled() {
        let mut links = Links::with_capacity(2);
        let _ = links.push_front(1, 1);
        let _ = links.push_front(2, 2);

        for i in 3..100 {
            let _ = links.pop_back();
            let _ = links.push_front(i, i);
        }

        assert_eq!(links.len(), 2);
        assert_eq!(links.allocated_slots(), 2);
        assert_eq!(keys(&links), vec![98, 99]);
    }

    #[test]
    fn values_can_be_updated_in_place() {
        let mut links = Links::with_capacity(1);
        let index = links.push_front("a", 1);
        *links.value_mut(index).unwrap() = 42;
        assert_eq!(links.entry(index), Some((&"a", &42)));

        links.clear();
        assert_eq!(links.len(), 0);
        assert_eq!(links.value_mut(index), None);
        assert_eq!(links.allocated_slots(), 0);
    }
}
