//! Generation-stamped visited set for graph traversal.
//!
//! Handles are dense, so a stamp array beats `HashSet<u32>`: marking and
//! testing are one array access, and resetting between layer searches is a
//! generation bump instead of a memset.

/// Visited-handle set with O(1) amortized reset.
#[derive(Debug)]
pub(crate) struct VisitedSet {
    stamps: Vec<u32>,
    generation: u32,
}

impl VisitedSet {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            stamps: vec![0; capacity],
            generation: 1,
        }
    }

    /// Resets the set and guarantees room for `capacity` handles.
    /// A full memset happens only when the generation counter wraps.
    pub(crate) fn reset(&mut self, capacity: usize) {
        if capacity > self.stamps.len() {
            self.stamps.resize(capacity, 0);
        }
        if self.generation == u32::MAX {
            self.stamps.fill(0);
            self.generation = 1;
        } else {
            self.generation += 1;
        }
    }

    /// Marks `handle` visited. Returns `true` if it was not seen before.
    #[inline]
    pub(crate) fn insert(&mut self, handle: u32) -> bool {
        let slot = &mut self.stamps[handle as usize];
        if *slot == self.generation {
            false
        } else {
            *slot = self.generation;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_reset() {
        let mut vs = VisitedSet::new(8);
        assert!(vs.insert(3));
        assert!(!vs.insert(3));
        assert!(vs.insert(7));

        vs.reset(8);
        assert!(vs.insert(3));
        assert!(vs.insert(7));
    }

    #[test]
    fn test_reset_grows_capacity() {
        let mut vs = VisitedSet::new(2);
        vs.reset(10);
        assert!(vs.insert(9));
        assert!(!vs.insert(9));
    }
}
