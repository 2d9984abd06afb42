use heurigen::pqueue::UpdatableMaxPriorityQueue;
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Op {
    Upsert(usize, f64),
    Remove(usize),
}

const CAPACITY: usize = 32;

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..CAPACITY, -100.0..100.0f64).prop_map(|(id, p)| Op::Upsert(id, p)),
        1 => (0..CAPACITY).prop_map(Op::Remove),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn test_dequeue_order_is_non_increasing(ops in proptest::collection::vec(arb_op(), 0..200)) {
        let mut queue = UpdatableMaxPriorityQueue::new(CAPACITY);
        let mut model: HashMap<usize, f64> = HashMap::new();

        for op in ops {
            match op {
                Op::Upsert(id, priority) => {
                    queue.enqueue_or_update(id, priority);
                    model.insert(id, priority);
                }
                Op::Remove(id) => {
                    prop_assert_eq!(queue.remove(id), model.remove(&id).is_some());
                }
            }
            prop_assert_eq!(queue.len(), model.len());
        }

        let mut previous = f64::INFINITY;
        while let Some((id, priority)) = queue.dequeue() {
            prop_assert!(priority <= previous);
            prop_assert_eq!(model.remove(&id), Some(priority));
            previous = priority;
        }
        prop_assert!(model.is_empty());
    }

    #[test]
    fn test_count_after_inserts_and_removals(
        ids in proptest::collection::btree_set(0..CAPACITY, 0..CAPACITY),
        removals in 0usize..CAPACITY,
    ) {
        let mut queue = UpdatableMaxPriorityQueue::new(CAPACITY);
        for &id in &ids {
            queue.enqueue_or_update(id, id as f64);
        }
        let removed = removals.min(ids.len());
        for &id in ids.iter().take(removed) {
            prop_assert!(queue.remove(id));
        }
        prop_assert_eq!(queue.len(), ids.len() - removed);
    }
}

#[test]
fn test_update_moves_item_both_ways() {
    let mut queue = UpdatableMaxPriorityQueue::new(4);
    queue.enqueue_or_update(0, 1.0);
    queue.enqueue_or_update(1, 2.0);
    queue.enqueue_or_update(2, 3.0);
    assert_eq!(queue.peek(), Some((2, 3.0)));

    queue.enqueue_or_update(0, 10.0);
    assert_eq!(queue.peek(), Some((0, 10.0)));
    queue.enqueue_or_update(0, -1.0);
    assert_eq!(queue.peek(), Some((2, 3.0)));
    assert_eq!(queue.priority(0), Some(-1.0));

    assert_eq!(queue.dequeue(), Some((2, 3.0)));
    assert_eq!(queue.dequeue(), Some((1, 2.0)));
    assert_eq!(queue.dequeue(), Some((0, -1.0)));
    assert_eq!(queue.dequeue(), None);
    assert!(!queue.contains(0));
}
