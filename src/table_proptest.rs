#![cfg(test)]

// Property tests for IntTable kept inside the crate so they can inspect the
// image directly.

use crate::config::TableConfig;
use crate::error::TableError;
use crate::layout::Status;
use crate::table::IntTable;
use proptest::prelude::*;
use std::collections::HashMap;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Set(usize, u64),
    Delete(usize),
    Get(usize),
    GetOrInsert(usize, u64),
    PopItem,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<u64>, Vec<OpI>)> {
    // Multiples of small primes collide often under `97 * key mod n`.
    proptest::collection::vec(prop_oneof![0u64..64, (0u64..16).prop_map(|k| k * 13)], 1..=12)
        .prop_flat_map(|pool| {
            let idx = 0..pool.len();
            let op = prop_oneof![
                4 => (idx.clone(), any::<u64>()).prop_map(|(i, v)| OpI::Set(i, v)),
                2 => idx.clone().prop_map(OpI::Delete),
                2 => idx.clone().prop_map(OpI::Get),
                1 => (idx.clone(), any::<u64>()).prop_map(|(i, v)| OpI::GetOrInsert(i, v)),
                1 => Just(OpI::PopItem),
                1 => Just(OpI::Clear),
            ];
            proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
        })
}

fn check_image(sut: &IntTable<u64>, model: &HashMap<u64, u64>) -> Result<(), TestCaseError> {
    let image = sut.image();
    let used = (0..image.slot_count())
        .filter(|&i| image.status(i) == Status::Used)
        .count();
    prop_assert_eq!(used, image.len());
    prop_assert_eq!(image.len(), model.len());
    prop_assert!(image.len() < image.slot_count());
    if !image.growable() {
        prop_assert!(image.len() <= image.capacity());
    }
    prop_assert!(sut == model);
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `set` overwrites in place and only new keys consume capacity.
// - A fixed table refuses new keys at capacity and changes nothing.
// - `delete` removes exactly one entry; missing keys report KeyNotFound.
// - `get`/`has` parity with the model after tombstones accumulate.
// - The number of used slots always equals `len`, for both growable and
//   fixed tables.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(
        (pool, ops) in arb_scenario(),
        growable in any::<bool>(),
        capacity in 0usize..10,
    ) {
        let config = TableConfig { capacity: Some(capacity), growable };
        let mut sut: IntTable<u64> = IntTable::with_config(config).unwrap();
        let mut model: HashMap<u64, u64> = HashMap::new();

        for op in ops {
            match op {
                OpI::Set(i, v) => {
                    let k = pool[i];
                    let fits = model.contains_key(&k) || growable || model.len() < capacity;
                    match sut.set(k, v) {
                        Ok(()) => {
                            prop_assert!(fits, "set of new key must fail at capacity");
                            model.insert(k, v);
                        }
                        Err(TableError::CapacityExceeded { capacity: c }) => {
                            prop_assert!(!fits);
                            prop_assert_eq!(c, capacity);
                        }
                        Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                    }
                }
                OpI::Delete(i) => {
                    let k = pool[i];
                    match sut.delete(k) {
                        Ok(v) => prop_assert_eq!(Some(v), model.remove(&k)),
                        Err(TableError::KeyNotFound { key }) => {
                            prop_assert_eq!(key, k);
                            prop_assert!(!model.contains_key(&k));
                        }
                        Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                    }
                }
                OpI::Get(i) => {
                    let k = pool[i];
                    prop_assert_eq!(sut.get(k).ok(), model.get(&k).copied());
                    prop_assert_eq!(sut.has(k), model.contains_key(&k));
                }
                OpI::GetOrInsert(i, v) => {
                    let k = pool[i];
                    let fits = model.contains_key(&k) || growable || model.len() < capacity;
                    match sut.get_or_insert(k, v) {
                        Ok(got) => {
                            prop_assert!(fits);
                            prop_assert_eq!(got, *model.entry(k).or_insert(v));
                        }
                        Err(TableError::CapacityExceeded { .. }) => prop_assert!(!fits),
                        Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                    }
                }
                OpI::PopItem => match sut.pop_item() {
                    Ok((k, v)) => prop_assert_eq!(model.remove(&k), Some(v)),
                    Err(TableError::Empty) => prop_assert!(model.is_empty()),
                    Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                },
                OpI::Clear => {
                    sut.clear().unwrap();
                    model.clear();
                }
            }
            check_image(&sut, &model)?;
        }
    }
}

// Property: growth never loses an entry and always doubles.
proptest! {
    #[test]
    fn prop_growth_preserves_entries(keys in proptest::collection::hash_set(any::<u64>(), 1..200)) {
        let mut sut: IntTable<f64> = IntTable::with_config(TableConfig::growable()).unwrap();
        let mut expected_capacity = 1usize;
        for (n, &k) in keys.iter().enumerate() {
            if n == expected_capacity {
                expected_capacity *= 2;
            }
            sut.set(k, k as f64 * 0.5).unwrap();
            prop_assert_eq!(sut.capacity(), expected_capacity);
        }
        prop_assert_eq!(sut.len(), keys.len());
        for &k in &keys {
            prop_assert_eq!(sut.get(k), Ok(k as f64 * 0.5));
        }
    }
}
