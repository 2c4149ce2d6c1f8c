//! Append-only storage for build cache entities.
//!
//! An [`Arena`] owns every entity of one kind and hands out typed handles.
//! There is no way to remove a single entity: the arena is emptied as a
//! whole, which is also the only way a handle can go stale.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A typed position inside an [`Arena`].
pub trait Handle: Copy {
    /// Wraps a position.
    fn from_index(index: usize) -> Self;

    /// The wrapped position.
    fn index(self) -> usize;
}

/// Owns the entities of one kind, addressed by handle type `H`.
pub struct Arena<H: Handle, T> {
    items: Vec<T>,
    _handle: PhantomData<fn() -> H>,
}

impl<H: Handle, T> Arena<H, T> {
    /// An empty arena.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _handle: PhantomData,
        }
    }

    /// Stores `item` and returns its handle.
    pub fn alloc(&mut self, item: T) -> H {
        let handle = H::from_index(self.items.len());
        self.items.push(item);
        handle
    }

    /// The entity behind `handle`, or `None` if this arena never issued it
    /// (or has been cleared since).
    pub fn try_get(&self, handle: H) -> Option<&T> {
        self.items.get(handle.index())
    }

    /// Mutable counterpart of [`try_get`](Arena::try_get).
    pub fn try_get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.items.get_mut(handle.index())
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops every entity. All handles issued so far become invalid.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// `(handle, entity)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (H::from_index(i), item))
    }

    /// Handles in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = H> {
        (0..self.items.len()).map(H::from_index)
    }

    /// Entities in allocation order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<H: Handle, T> Default for Arena<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Handle, T: Clone> Clone for Arena<H, T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            _handle: PhantomData,
        }
    }
}

impl<H: Handle, T: fmt::Debug> fmt::Debug for Arena<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

impl<H: Handle, T> Index<H> for Arena<H, T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `handle` was not issued by this arena.
    fn index(&self, handle: H) -> &T {
        &self.items[handle.index()]
    }
}

impl<H: Handle, T> IndexMut<H> for Arena<H, T> {
    fn index_mut(&mut self, handle: H) -> &mut T {
        &mut self.items[handle.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SourceId;

    #[test]
    fn alloc_then_index() {
        let mut arena: Arena<SourceId, String> = Arena::new();
        let id = arena.alloc("main.cpp".to_string());
        assert_eq!(arena[id], "main.cpp");
        arena[id].push_str(".bak");
        assert_eq!(arena[id], "main.cpp.bak");
    }

    #[test]
    fn handles_follow_allocation_order() {
        let mut arena: Arena<SourceId, u32> = Arena::new();
        let a = arena.alloc(100);
        let b = arena.alloc(200);
        assert_eq!(arena.ids().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(arena.values().copied().collect::<Vec<_>>(), vec![100, 200]);
    }

    #[test]
    fn foreign_handle_is_absent() {
        let mut arena: Arena<SourceId, u32> = Arena::new();
        let id = arena.alloc(1);
        assert_eq!(arena.try_get(id), Some(&1));
        assert!(arena.try_get(SourceId::from_raw(5)).is_none());
        assert!(arena.try_get_mut(SourceId::from_raw(5)).is_none());
    }

    #[test]
    fn clear_invalidates_handles() {
        let mut arena: Arena<SourceId, u32> = Arena::default();
        let id = arena.alloc(7);
        arena.clear();
        assert!(arena.is_empty());
        assert!(arena.try_get(id).is_none());
    }
}
