use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use wick::persistent_map::PersistentMap;

/// Every value hashes the same, forcing all entries into one bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Colliding(u32);

impl Hash for Colliding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        0u8.hash(state);
    }
}

#[test]
fn empty_map_has_nothing() {
    let map: PersistentMap<&str, i32> = PersistentMap::new();

    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert_eq!(map.get("a"), None);
    assert_eq!(map.iter().count(), 0);
}

#[test]
fn insert_then_get() {
    let map: PersistentMap<&str, i32> = PersistentMap::new().insert("a", 1).insert("b", 2);

    assert_eq!(map.get("a"), Some(&1));
    assert_eq!(map.get("b"), Some(&2));
    assert_eq!(map.get("c"), None);
    assert_eq!(map.len(), 2);
    assert!(map.contains_key("b"));
}

#[test]
fn insert_leaves_the_old_version_untouched() {
    let v1: PersistentMap<&str, i32> = PersistentMap::new().insert("a", 1);
    let v2 = v1.insert("b", 2);

    assert_eq!(v1.get("b"), None);
    assert_eq!(v1.len(), 1);
    assert_eq!(v2.get("a"), Some(&1));
    assert_eq!(v2.get("b"), Some(&2));
}

#[test]
fn overwrite_replaces_only_that_key() {
    let v1: PersistentMap<&str, i32> = PersistentMap::new().insert("a", 1).insert("b", 2);
    let v2 = v1.insert("a", 10);

    assert_eq!(v2.get("a"), Some(&10));
    assert_eq!(v2.get("b"), Some(&2));
    assert_eq!(v2.len(), 2);
    assert_eq!(v1.get("a"), Some(&1));
}

#[test]
fn borrowed_lookup_with_rc_str_keys() {
    let map: PersistentMap<Rc<str>, i32> = PersistentMap::new().insert(Rc::from("name"), 7);

    assert_eq!(map.get("name"), Some(&7));
    assert!(!map.contains_key("other"));
}

#[test]
fn iteration_visits_every_entry_once() {
    let map: PersistentMap<u32, u32> = (0..500).map(|i| (i, i * 2)).collect();

    let mut seen: Vec<(u32, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    seen.sort_unstable();

    assert_eq!(seen, (0..500).map(|i| (i, i * 2)).collect::<Vec<_>>());
    assert_eq!(map.iter().len(), 500);
}

#[test]
fn colliding_keys_share_a_bucket() {
    let map: PersistentMap<Colliding, &str> = PersistentMap::new()
        .insert(Colliding(1), "one")
        .insert(Colliding(2), "two")
        .insert(Colliding(3), "three");

    let updated = map.insert(Colliding(2), "deux");

    assert_eq!(map.get(&Colliding(2)), Some(&"two"));
    assert_eq!(updated.get(&Colliding(2)), Some(&"deux"));
    assert_eq!(updated.get(&Colliding(3)), Some(&"three"));
    assert_eq!(updated.get(&Colliding(4)), None);
    assert_eq!(updated.len(), 3);
}

#[test]
fn narrow_branching_factor_still_works() {
    let map: PersistentMap<u32, u32, 1> = (0..200).map(|i| (i, i + 1)).collect();

    assert_eq!(map.len(), 200);
    for i in 0..200 {
        assert_eq!(map.get(&i), Some(&(i + 1)));
    }
    assert_eq!(map.get(&200), None);
}

#[test]
fn debug_lists_entries() {
    let map: PersistentMap<&str, i32> = PersistentMap::new().insert("only", 1);

    assert_eq!(format!("{:?}", map), "{\"only\": 1}");
}

proptest! {
    #[test]
    fn versions_match_a_model(ops in prop::collection::vec((0u16..64, any::<i32>()), 0..200)) {
        let mut versions: Vec<(PersistentMap<u16, i32>, BTreeMap<u16, i32>)> =
            vec![(PersistentMap::new(), BTreeMap::new())];

        for (key, value) in ops {
            let (map, model) = versions.last().cloned().unwrap();

            let mut next_model = model;
            next_model.insert(key, value);

            versions.push((map.insert(key, value), next_model));
        }

        // Every older version still answers exactly as it did when made.
        for (map, model) in &versions {
            prop_assert_eq!(map.len(), model.len());

            for key in 0u16..64 {
                prop_assert_eq!(map.get(&key), model.get(&key));
            }
        }
    }
}
