//! Node arena
//!
//! Generational slot storage for accessibility nodes. Parent links are
//! plain [`NodeId`]s into the arena, never owning pointers.

/// Generational node handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Generational arena (slot map)
#[derive(Debug)]
pub struct NodeArena<T> {
    items: Vec<Option<(T, u32)>>,
    free_list: Vec<u32>,
    generations: Vec<u32>,
}

impl<T> NodeArena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            free_list: Vec::new(),
            generations: Vec::new(),
        }
    }

    /// Insert item
    pub fn insert(&mut self, value: T) -> NodeId {
        if let Some(index) = self.free_list.pop() {
            let generation = self.generations[index as usize];
            self.items[index as usize] = Some((value, generation));
            NodeId { index, generation }
        } else {
            let index = self.items.len() as u32;
            self.items.push(Some((value, 0)));
            self.generations.push(0);
            NodeId { index, generation: 0 }
        }
    }

    /// Get item
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.items
            .get(id.index as usize)
            .and_then(|slot| slot.as_ref())
            .filter(|(_, g)| *g == id.generation)
            .map(|(val, _)| val)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.items
            .get_mut(id.index as usize)
            .and_then(|slot| slot.as_mut())
            .filter(|(_, g)| *g == id.generation)
            .map(|(val, _)| val)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Remove item; the slot's generation moves on so `id` goes stale
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let slot = self.items.get_mut(id.index as usize)?;
        if !matches!(slot, Some((_, g)) if *g == id.generation) {
            return None;
        }
        let (val, _) = slot.take()?;
        self.generations[id.index as usize] += 1;
        self.free_list.push(id.index);
        Some(val)
    }

    /// Live entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.items.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref().map(|(val, generation)| {
                (NodeId { index: index as u32, generation: *generation }, val)
            })
        })
    }

    pub fn len(&self) -> usize {
        self.items.iter().filter(|i| i.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self { Self::new() }
}
