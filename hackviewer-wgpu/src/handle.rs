use std::collections::HashMap;

/// Opaque handle to a GPU resource owned by a [`HandleStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Tracks every resource of one kind so it can be released explicitly.
/// Handles are never reused within a store.
pub struct HandleStore<T> {
    items: HashMap<Handle, T>,
    next: u64,
}

impl<T> HandleStore<T> {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            next: 1,
        }
    }

    /// Insert an item and return its handle.
    pub fn insert(&mut self, item: T) -> Handle {
        let handle = Handle(self.next);
        self.next += 1;
        self.items.insert(handle, item);
        handle
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.items.get(&handle)
    }

    /// Remove and return the item so the caller can release it.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        self.items.remove(&handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.items.contains_key(&handle)
    }

    /// Remove every item, in handle order.
    pub fn drain(&mut self) -> Vec<(Handle, T)> {
        let mut all: Vec<_> = self.items.drain().collect();
        all.sort_by_key(|(h, _)| *h);
        all
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for HandleStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
