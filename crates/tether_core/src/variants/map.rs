//! Structural operations on insertion-ordered map properties
//!
//! Single-entry events carry `(K, V)` tuples; multi-entry events carry a
//! `Vec<(K, V)>` of the entries touched. `update_all` and `clear` carry the
//! whole map before and after.

use crate::error::{Result, TetherError};
use crate::event::{ChangeKind, EventValue};
use crate::property::{Mutation, Property};
use crate::value::PropertyValue;
use indexmap::IndexMap;
use std::hash::Hash;

impl<K, V> Property<IndexMap<K, V>>
where
    K: PropertyValue + Eq + Hash,
    V: PropertyValue,
{
    fn missing_key(&self, key: &K) -> TetherError {
        TetherError::MissingKey {
            name: self.display_name(),
            key: format!("{:?}", key),
        }
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Insert or replace one entry
    ///
    /// A new key emits `Added`; replacing a different value emits `Updated`
    /// with the old entry as the previous value.
    pub fn add(&self, key: K, value: V, notify: bool) -> Result<()> {
        self.modify(notify, |map| {
            let previous = map.insert(key.clone(), value.clone());
            let mutation = match previous {
                Some(old) if old == value => None,
                Some(old) => Some(Mutation {
                    kind: ChangeKind::Updated,
                    description: format!("updated in map: {:?} => {:?}", key, value),
                    previous: Some(EventValue::new((key.clone(), old))),
                    next: Some(EventValue::new((key, value))),
                }),
                None => Some(Mutation {
                    kind: ChangeKind::Added,
                    description: format!("added to map: {:?} => {:?}", key, value),
                    previous: None,
                    next: Some(EventValue::new((key, value))),
                }),
            };
            Ok(((), mutation))
        })
    }

    pub fn add_entry(&self, entry: (K, V), notify: bool) -> Result<()> {
        let (key, value) = entry;
        self.add(key, value, notify)
    }

    /// Insert every entry, emitting one `Added` event for all of them
    pub fn add_entries(
        &self,
        entries: impl IntoIterator<Item = (K, V)>,
        notify: bool,
    ) -> Result<()> {
        let entries: Vec<(K, V)> = entries.into_iter().collect();
        self.modify(notify, |map| {
            if entries.is_empty() {
                return Ok(((), None));
            }
            map.extend(entries.iter().cloned());
            Ok((
                (),
                Some(Mutation {
                    kind: ChangeKind::Added,
                    description: format!("added to map: {:?}", entries),
                    previous: None,
                    next: Some(EventValue::new(entries)),
                }),
            ))
        })
    }

    /// Insert every entry of `other`
    pub fn add_all(&self, other: &IndexMap<K, V>, notify: bool) -> Result<()> {
        self.add_entries(other.iter().map(|(k, v)| (k.clone(), v.clone())), notify)
    }

    /// Replace the value under `key` with `f(value)`
    ///
    /// `f` runs while the property is locked for writing and must not access
    /// this property.
    pub fn update_entry(&self, key: &K, f: impl FnOnce(&V) -> V, notify: bool) -> Result<V> {
        self.modify(notify, |map| {
            let Some(slot) = map.get_mut(key) else {
                return Err(self.missing_key(key));
            };
            let next = f(&*slot);
            let previous = std::mem::replace(slot, next.clone());
            Ok((next.clone(), updated_entry(key, previous, next)))
        })
    }

    /// Like [`update_entry`](Self::update_entry), inserting `if_absent()` for a
    /// missing key
    ///
    /// Both closures run under the write lock and must not access this property.
    pub fn update_entry_or_insert(
        &self,
        key: K,
        f: impl FnOnce(&V) -> V,
        if_absent: impl FnOnce() -> V,
        notify: bool,
    ) -> Result<V> {
        self.modify(notify, |map| match map.get_mut(&key) {
            Some(slot) => {
                let next = f(&*slot);
                let previous = std::mem::replace(slot, next.clone());
                Ok((next.clone(), updated_entry(&key, previous, next)))
            }
            None => {
                let value = if_absent();
                map.insert(key.clone(), value.clone());
                let mutation = Mutation {
                    kind: ChangeKind::Added,
                    description: format!("added to map: {:?} => {:?}", key, value),
                    previous: None,
                    next: Some(EventValue::new((key, value.clone()))),
                };
                Ok((value, Some(mutation)))
            }
        })
    }

    /// Replace every value with `f(key, value)`
    ///
    /// `f` runs while the property is locked for writing and must not access
    /// this property. The map is only replaced once every value is computed.
    pub fn update_all(&self, mut f: impl FnMut(&K, &V) -> V, notify: bool) -> Result<()> {
        self.modify(notify, |map| {
            let next: IndexMap<K, V> = map.iter().map(|(k, v)| (k.clone(), f(k, v))).collect();
            if next == *map {
                return Ok(((), None));
            }
            let previous = std::mem::replace(map, next.clone());
            Ok((
                (),
                Some(Mutation {
                    kind: ChangeKind::Updated,
                    description: format!("updated all {} entries of map", next.len()),
                    previous: Some(EventValue::new(previous)),
                    next: Some(EventValue::new(next)),
                }),
            ))
        })
    }

    /// Remove the entry under `key`, keeping the order of the rest
    pub fn remove(&self, key: &K, notify: bool) -> Result<Option<V>> {
        self.modify(notify, |map| {
            let Some(value) = map.shift_remove(key) else {
                return Ok((None, None));
            };
            let mutation = Mutation {
                kind: ChangeKind::Removed,
                description: format!("removed from map: {:?} => {:?}", key, value),
                previous: Some(EventValue::new((key.clone(), value.clone()))),
                next: None,
            };
            Ok((Some(value), Some(mutation)))
        })
    }

    /// Remove every entry matching `predicate`, returning how many went
    ///
    /// The predicate runs while the property is locked for writing and must
    /// not access this property.
    pub fn remove_where(
        &self,
        mut predicate: impl FnMut(&K, &V) -> bool,
        notify: bool,
    ) -> Result<usize> {
        self.modify(notify, |map| {
            // Judge every entry before touching the map
            let hits: Vec<bool> = map.iter().map(|(k, v)| predicate(k, v)).collect();
            let gone: Vec<(K, V)> = map
                .iter()
                .zip(&hits)
                .filter(|(_, hit)| **hit)
                .map(|((k, v), _)| (k.clone(), v.clone()))
                .collect();
            if gone.is_empty() {
                return Ok((0, None));
            }
            let mut hit = hits.into_iter();
            map.retain(|_, _| !hit.next().unwrap_or(false));
            let count = gone.len();
            let mutation = Mutation {
                kind: ChangeKind::Removed,
                description: format!("removed from map: {:?}", gone),
                previous: Some(EventValue::new(gone)),
                next: None,
            };
            Ok((count, Some(mutation)))
        })
    }

    pub fn clear(&self, notify: bool) -> Result<()> {
        self.modify(notify, |map| {
            if map.is_empty() {
                return Ok(((), None));
            }
            let previous = std::mem::take(map);
            Ok((
                (),
                Some(Mutation {
                    kind: ChangeKind::Cleared,
                    description: format!("cleared map of {} entries", previous.len()),
                    previous: Some(EventValue::new(previous)),
                    next: Some(EventValue::new(IndexMap::<K, V>::new())),
                }),
            ))
        })
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub fn get(&self, key: &K) -> Option<V> {
        self.with_value(|map| map.get(key).cloned())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.with_value(|map| map.contains_key(key))
    }

    pub fn contains_value(&self, value: &V) -> bool {
        self.with_value(|map| map.values().any(|v| v == value))
    }

    pub fn keys(&self) -> Vec<K> {
        self.with_value(|map| map.keys().cloned().collect())
    }

    pub fn values(&self) -> Vec<V> {
        self.with_value(|map| map.values().cloned().collect())
    }

    pub fn entries(&self) -> Vec<(K, V)> {
        self.with_value(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    pub fn len(&self) -> usize {
        self.with_value(IndexMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.with_value(IndexMap::is_empty)
    }

    /// Visit a snapshot of the entries in insertion order
    pub fn for_each(&self, mut f: impl FnMut(&K, &V)) {
        for (key, value) in self.value().iter() {
            f(key, value);
        }
    }
}

fn updated_entry<K, V>(key: &K, previous: V, next: V) -> Option<Mutation>
where
    K: PropertyValue,
    V: PropertyValue,
{
    (previous != next).then(|| Mutation {
        kind: ChangeKind::Updated,
        description: format!("updated in map: {:?} => {:?}", key, next),
        previous: Some(EventValue::new((key.clone(), previous))),
        next: Some(EventValue::new((key.clone(), next))),
    })
}

#[cfg(test)]
mod tests {
    use crate::{ChangeKind, TetherError, ViewModel};
    use indexmap::IndexMap;

    fn stock() -> IndexMap<String, u32> {
        IndexMap::from([("apples".to_string(), 3), ("pears".to_string(), 5)])
    }

    #[test]
    fn test_add_new_and_replaced_entries() {
        let vm = ViewModel::new();
        let map = vm.property("stock", stock());
        let mut rx = vm.subscribe_changes().unwrap();

        map.add("plums".into(), 1, true).unwrap();
        map.add_entry(("apples".into(), 4), true).unwrap();
        map.add("apples".into(), 4, true).unwrap();

        let added = rx.try_recv().unwrap();
        assert_eq!(added[0].kind(), ChangeKind::Added);
        assert_eq!(
            added[0].next::<(String, u32)>(),
            Some(&("plums".to_string(), 1))
        );

        let replaced = rx.try_recv().unwrap();
        assert_eq!(replaced[0].kind(), ChangeKind::Updated);
        assert_eq!(
            replaced[0].previous::<(String, u32)>(),
            Some(&("apples".to_string(), 3))
        );
        // Same value again is not a change
        assert!(rx.try_recv().is_err());
        assert_eq!(map.keys(), vec!["apples", "pears", "plums"]);
    }

    #[test]
    fn test_add_entries_single_event() {
        let vm = ViewModel::new();
        let map = vm.property("stock", IndexMap::<String, u32>::new());
        let mut rx = vm.subscribe_changes().unwrap();

        map.add_all(&stock(), true).unwrap();
        map.add_entries(Vec::new(), true).unwrap();

        let batch = rx.try_recv().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch[0].next::<Vec<(String, u32)>>().map(Vec::len),
            Some(2)
        );
        assert!(rx.try_recv().is_err());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_update_entry() {
        let vm = ViewModel::new();
        let map = vm.property("stock", stock());
        let mut rx = vm.subscribe_changes().unwrap();

        assert_eq!(map.update_entry(&"pears".into(), |n| n + 1, true).unwrap(), 6);
        let batch = rx.try_recv().unwrap();
        assert_eq!(batch[0].kind(), ChangeKind::Updated);
        assert_eq!(
            batch[0].next::<(String, u32)>(),
            Some(&("pears".to_string(), 6))
        );

        let err = map.update_entry(&"kiwis".into(), |n| n + 1, true).unwrap_err();
        assert_eq!(
            err,
            TetherError::MissingKey {
                name: "stock".into(),
                key: "\"kiwis\"".into(),
            }
        );

        assert_eq!(
            map.update_entry_or_insert("kiwis".into(), |n| n + 1, || 10, true).unwrap(),
            10
        );
        assert_eq!(
            map.update_entry_or_insert("kiwis".into(), |n| n + 1, || 10, true).unwrap(),
            11
        );
        assert_eq!(map.get(&"kiwis".into()), Some(11));
    }

    #[test]
    fn test_update_all_and_removal() {
        let vm = ViewModel::new();
        let map = vm.property("stock", stock());
        let mut rx = vm.subscribe_changes().unwrap();

        map.update_all(|_, n| n * 2, true).unwrap();
        assert_eq!(map.values(), vec![6, 10]);
        let batch = rx.try_recv().unwrap();
        assert_eq!(batch[0].previous::<IndexMap<String, u32>>(), Some(&stock()));

        assert_eq!(map.remove(&"apples".into(), true).unwrap(), Some(6));
        assert_eq!(map.remove(&"apples".into(), true).unwrap(), None);
        let removed = rx.try_recv().unwrap();
        assert_eq!(removed[0].kind(), ChangeKind::Removed);
        assert!(rx.try_recv().is_err());

        map.add("plums".into(), 1, false).unwrap();
        assert_eq!(map.remove_where(|_, n| *n > 5, true).unwrap(), 1);
        assert_eq!(map.entries(), vec![("plums".to_string(), 1)]);

        map.clear(true).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_panicking_predicate_leaves_map_intact() {
        let vm = ViewModel::new();
        let map = vm.property("stock", stock());
        let mut rx = vm.subscribe_changes().unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            map.remove_where(
                |k, _| {
                    assert_ne!(k, "pears", "cannot judge {k}");
                    true
                },
                true,
            )
        }));
        assert!(outcome.is_err());
        assert_eq!(map.value(), stock());
        assert_eq!(map.get(&"pears".into()), Some(5));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reads() {
        let map = crate::Property::new(stock());
        assert!(map.contains_key(&"apples".into()));
        assert!(map.contains_value(&5));
        assert!(!map.contains_value(&9));

        let mut seen = Vec::new();
        map.for_each(|k, v| seen.push(format!("{}={}", k, v)));
        assert_eq!(seen, ["apples=3", "pears=5"]);
    }

    #[test]
    fn test_reset_rebuilds_from_copy() {
        let vm = ViewModel::new();
        let map = vm.property("stock", stock());
        map.clear(true).unwrap();
        map.reset().unwrap();
        assert_eq!(map.value(), stock());

        map.add("plums".into(), 1, true).unwrap();
        assert_eq!(map.original_value(), stock());
    }
}
