use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

use crate::replay_buffer::{ReplayMemory, Transition};

fn transition(i: usize) -> Transition {
    Transition {
        old_state: array![i as f32, 0.0],
        new_state: array![i as f32 + 1.0, 1.0],
        action: i % 5,
        reward: -(i as f32),
        reward_vehicle: -(i as f32) * 0.5,
        reward_pedestrian: -(i as f32) * 0.25,
    }
}

#[test]
fn test_replay_memory_store_and_get() {
    let mut memory = ReplayMemory::new(10, 2).unwrap();
    let t = transition(3);
    memory.push(&t).unwrap();

    assert_eq!(memory.len(), 1);
    assert_eq!(memory.valid_len(), 1);
    assert_eq!(memory.get(0), Some(t));
    assert_eq!(memory.get(1), None);
}

#[test]
fn test_replay_memory_wraps() {
    let capacity = 4;
    let k = 3;
    let mut memory = ReplayMemory::new(capacity, 2).unwrap();
    for i in 0..capacity + k {
        memory.push(&transition(i)).unwrap();
    }

    // logical size keeps counting, storage does not grow
    assert_eq!(memory.len(), capacity + k);
    assert_eq!(memory.valid_len(), capacity);

    let last = capacity + k - 1;
    let slot = memory.slot_of(last);
    assert_eq!(slot, last % capacity);
    assert_eq!(memory.get(slot), Some(transition(last)));

    // slot 0 was overwritten by logical index 4
    assert_eq!(memory.get(0), Some(transition(capacity)));
    // slot 3 still holds the original write
    assert_eq!(memory.get(3), Some(transition(3)));
}

#[test]
fn test_replay_memory_rejects_wrong_width() {
    let mut memory = ReplayMemory::new(4, 3).unwrap();
    let short = Array1::<f32>::zeros(2);
    let ok = Array1::<f32>::zeros(3);
    assert!(memory.store(short.view(), ok.view(), 0, 0.0, 0.0, 0.0).is_err());
    assert!(memory.store(ok.view(), short.view(), 0, 0.0, 0.0, 0.0).is_err());
    assert!(memory.is_empty());
}

#[test]
fn test_replay_memory_zero_capacity() {
    assert!(ReplayMemory::new(0, 2).is_err());
}

#[test]
fn test_sample_needs_enough_transitions() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut memory = ReplayMemory::new(10, 2).unwrap();
    assert!(memory.sample(1, &mut rng).is_none());

    for i in 0..3 {
        memory.push(&transition(i)).unwrap();
    }
    assert!(memory.sample(4, &mut rng).is_none());
    assert!(memory.sample(0, &mut rng).is_none());
    assert_eq!(memory.sample(3, &mut rng).map(|b| b.len()), Some(3));
}

#[test]
fn test_sample_with_batch_larger_than_capacity() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut memory = ReplayMemory::new(2, 2).unwrap();
    for i in 0..5 {
        memory.push(&transition(i)).unwrap();
    }
    // five stores but only two valid slots
    assert!(memory.sample(3, &mut rng).is_none());
}

#[test]
fn test_sample_without_replacement() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut memory = ReplayMemory::new(8, 2).unwrap();
    for i in 0..8 {
        memory.push(&transition(i)).unwrap();
    }

    for _ in 0..20 {
        let batch = memory.sample(8, &mut rng).unwrap();
        let seen: HashSet<i64> = batch.states.column(0).iter().map(|&v| v as i64).collect();
        assert_eq!(seen.len(), 8);
    }
}

#[test]
fn test_gather_rows_stay_aligned() {
    let mut memory = ReplayMemory::new(8, 2).unwrap();
    for i in 0..6 {
        memory.push(&transition(i)).unwrap();
    }
    let batch = memory.gather(&[5, 1]);

    assert_eq!(batch.len(), 2);
    assert_eq!(batch.states.row(0), array![5.0, 0.0]);
    assert_eq!(batch.next_states.row(0), array![6.0, 1.0]);
    assert_eq!(batch.actions, vec![0, 1]);
    assert_eq!(batch.rewards, array![-5.0, -1.0]);
}
