//! Indexed 4-ary max-heap over dense item ids.
//!
//! Every id in `[0, capacity)` holds at most one priority. Positions are tracked
//! per id so arbitrary updates and removals stay logarithmic.

const ARITY_SHIFT: usize = 2;

#[inline(always)]
fn parent_of(index: usize) -> usize {
    (index - 1) >> ARITY_SHIFT
}

#[inline(always)]
fn first_child_of(index: usize) -> usize {
    (index << ARITY_SHIFT) + 1
}

#[derive(Debug, Clone)]
pub struct UpdatableMaxPriorityQueue {
    heap: Vec<(usize, f64)>,
    positions: Vec<Option<usize>>,
}

impl UpdatableMaxPriorityQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            positions: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, id: usize) -> bool {
        debug_assert!(id < self.capacity(), "id {} out of range", id);
        self.positions[id].is_some()
    }

    /// Inserts `id` or moves it to its new priority.
    pub fn enqueue_or_update(&mut self, id: usize, priority: f64) {
        debug_assert!(id < self.capacity(), "id {} out of range", id);
        debug_assert!(!priority.is_nan(), "NaN priority for id {}", id);

        match self.positions[id] {
            Some(index) => {
                self.heap[index].1 = priority;
                if index > 0 && self.heap[parent_of(index)].1 <= priority {
                    self.move_up(index);
                } else {
                    self.move_down(index);
                }
            }
            None => {
                let index = self.heap.len();
                self.heap.push((id, priority));
                self.positions[id] = Some(index);
                self.move_up(index);
            }
        }
    }

    /// Pops the maximum-priority item.
    pub fn dequeue(&mut self) -> Option<(usize, f64)> {
        if self.heap.is_empty() {
            return None;
        }
        let top = self.heap[0];
        self.remove_at(0);
        Some(top)
    }

    pub fn remove(&mut self, id: usize) -> bool {
        debug_assert!(id < self.capacity(), "id {} out of range", id);
        match self.positions[id] {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    pub fn peek(&self) -> Option<(usize, f64)> {
        self.heap.first().copied()
    }

    pub fn priority(&self, id: usize) -> Option<f64> {
        debug_assert!(id < self.capacity(), "id {} out of range", id);
        self.positions[id].map(|index| self.heap[index].1)
    }

    pub fn clear(&mut self) {
        for &(id, _) in &self.heap {
            self.positions[id] = None;
        }
        self.heap.clear();
    }

    fn remove_at(&mut self, index: usize) {
        let (removed_id, _) = self.heap[index];
        self.positions[removed_id] = None;

        let last = self.heap.len() - 1;
        if index == last {
            self.heap.pop();
            return;
        }

        self.heap.swap_remove(index);
        let moved_id = self.heap[index].0;
        self.positions[moved_id] = Some(index);

        if index > 0 && self.heap[parent_of(index)].1 <= self.heap[index].1 {
            self.move_up(index);
        } else {
            self.move_down(index);
        }
    }

    fn move_up(&mut self, mut index: usize) {
        let item = self.heap[index];
        while index > 0 {
            let parent = parent_of(index);
            let parent_item = self.heap[parent];
            if item.1 > parent_item.1 {
                self.heap[index] = parent_item;
                self.positions[parent_item.0] = Some(index);
                index = parent;
            } else {
                break;
            }
        }
        self.heap[index] = item;
        self.positions[item.0] = Some(index);
    }

    fn move_down(&mut self, mut index: usize) {
        let item = self.heap[index];
        let len = self.heap.len();
        loop {
            let first = first_child_of(index);
            if first >= len {
                break;
            }
            let end = (first + (1 << ARITY_SHIFT)).min(len);
            let mut max_child = first;
            for child in first + 1..end {
                if self.heap[child].1 > self.heap[max_child].1 {
                    max_child = child;
                }
            }
            let child_item = self.heap[max_child];
            if item.1 >= child_item.1 {
                break;
            }
            self.heap[index] = child_item;
            self.positions[child_item.0] = Some(index);
            index = max_child;
        }
        self.heap[index] = item;
        self.positions[item.0] = Some(index);
    }

    #[cfg(test)]
    fn assert_heap_invariant(&self) {
        for index in 1..self.heap.len() {
            assert!(self.heap[parent_of(index)].1 >= self.heap[index].1);
        }
        for (index, &(id, _)) in self.heap.iter().enumerate() {
            assert_eq!(self.positions[id], Some(index));
        }
        let tracked = self.positions.iter().filter(|p| p.is_some()).count();
        assert_eq!(tracked, self.heap.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dequeue_order() {
        let mut q = UpdatableMaxPriorityQueue::new(10);
        for (id, p) in [(0, 3.0), (1, 9.0), (2, -1.0), (3, 4.5), (4, 9.5), (5, 0.0)] {
            q.enqueue_or_update(id, p);
            q.assert_heap_invariant();
        }

        let order: Vec<usize> = std::iter::from_fn(|| q.dequeue().map(|(id, _)| id)).collect();
        assert_eq!(order, vec![4, 1, 3, 0, 5, 2]);
        assert!(q.is_empty());
        assert_eq!(q.dequeue(), None);
    }

    #[test]
    fn test_update_moves_both_directions() {
        let mut q = UpdatableMaxPriorityQueue::new(8);
        for id in 0..8 {
            q.enqueue_or_update(id, id as f64);
        }
        q.enqueue_or_update(0, 100.0);
        q.assert_heap_invariant();
        assert_eq!(q.peek(), Some((0, 100.0)));

        q.enqueue_or_update(0, -100.0);
        q.assert_heap_invariant();
        assert_eq!(q.peek(), Some((7, 7.0)));
        assert_eq!(q.priority(0), Some(-100.0));
        assert_eq!(q.len(), 8);
    }

    #[test]
    fn test_remove_arbitrary() {
        let mut q = UpdatableMaxPriorityQueue::new(20);
        for id in 0..20 {
            q.enqueue_or_update(id, ((id * 7) % 13) as f64);
        }
        assert!(q.remove(5));
        assert!(!q.remove(5));
        assert!(q.remove(0));
        q.assert_heap_invariant();
        assert_eq!(q.len(), 18);
        assert!(!q.contains(5));
        assert_eq!(q.priority(5), None);
    }

    #[test]
    fn test_clear_resets_positions() {
        let mut q = UpdatableMaxPriorityQueue::new(4);
        q.enqueue_or_update(1, 1.0);
        q.enqueue_or_update(3, 2.0);
        q.clear();
        assert!(q.is_empty());
        assert!(!q.contains(1));
        q.enqueue_or_update(1, 5.0);
        assert_eq!(q.dequeue(), Some((1, 5.0)));
    }
}
