//! Structural operations on list properties
//!
//! Every mutation takes a `notify` flag and emits a single event labeled
//! with what it did, distinct from a whole-value `Set`:
//!
//! | Operation                          | Kind       | previous      | next          |
//! |------------------------------------|------------|---------------|---------------|
//! | `add`                              | `Added`    |               | element       |
//! | `add_all`                          | `Added`    |               | `Vec` added   |
//! | `insert`                           | `Inserted` |               | element       |
//! | `insert_all`, `insert_all_at_end`  | `Inserted` |               | `Vec` added   |
//! | `remove`, `remove_at`              | `Removed`  | element       |               |
//! | `remove_where`                     | `Removed`  | `Vec` removed |               |
//! | `clear`                            | `Cleared`  | old list      | empty list    |
//!
//! Operations that change nothing (adding no elements, clearing an empty
//! list, removing an absent element) emit nothing. Read helpers never
//! mutate and never notify.
//!
//! ```
//! use tether_core::{ChangeKind, ViewModel};
//!
//! let vm = ViewModel::new();
//! let planets = vm.property("planets", vec!["Mercury".to_string(), "Venus".to_string()]);
//! let mut changes = vm.subscribe_changes().unwrap();
//!
//! let removed = planets.remove_at(1, true).unwrap();
//! assert_eq!(removed, "Venus");
//!
//! let batch = changes.try_recv().unwrap();
//! assert_eq!(batch[0].kind(), ChangeKind::Removed);
//! assert_eq!(batch[0].previous::<String>().map(String::as_str), Some("Venus"));
//! ```

use crate::error::{Result, TetherError};
use crate::event::{ChangeKind, EventValue};
use crate::property::{Mutation, Property};
use crate::value::PropertyValue;

fn added<T: PropertyValue>(kind: ChangeKind, description: String, value: T) -> Mutation {
    Mutation {
        kind,
        previous: None,
        next: Some(EventValue::new(value)),
        description,
    }
}

fn removed<T: PropertyValue>(description: String, value: T) -> Mutation {
    Mutation {
        kind: ChangeKind::Removed,
        previous: Some(EventValue::new(value)),
        next: None,
        description,
    }
}

impl<E: PropertyValue> Property<Vec<E>> {
    fn out_of_range(&self, index: usize, len: usize) -> TetherError {
        TetherError::IndexOutOfRange {
            name: self.display_name(),
            index,
            len,
        }
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Append one element
    pub fn add(&self, element: E, notify: bool) -> Result<()> {
        self.modify(notify, |list| {
            let description = format!("added to list: {:?}", element);
            list.push(element.clone());
            Ok(((), Some(added(ChangeKind::Added, description, element))))
        })
    }

    /// Append every element of `elements`
    pub fn add_all(&self, elements: impl IntoIterator<Item = E>, notify: bool) -> Result<()> {
        let elements: Vec<E> = elements.into_iter().collect();
        self.modify(notify, |list| {
            if elements.is_empty() {
                return Ok(((), None));
            }
            let description = format!("added to list: {:?}", elements);
            list.extend(elements.iter().cloned());
            Ok(((), Some(added(ChangeKind::Added, description, elements))))
        })
    }

    /// Insert `element` before position `index`; `index == len` appends
    pub fn insert(&self, index: usize, element: E, notify: bool) -> Result<()> {
        self.modify(notify, |list| {
            if index > list.len() {
                return Err(self.out_of_range(index, list.len()));
            }
            let description = format!("inserted into list at {}: {:?}", index, element);
            list.insert(index, element.clone());
            Ok(((), Some(added(ChangeKind::Inserted, description, element))))
        })
    }

    /// Insert every element of `elements` starting at `index`, keeping their order
    pub fn insert_all(
        &self,
        index: usize,
        elements: impl IntoIterator<Item = E>,
        notify: bool,
    ) -> Result<()> {
        let elements: Vec<E> = elements.into_iter().collect();
        self.modify(notify, |list| {
            if index > list.len() {
                return Err(self.out_of_range(index, list.len()));
            }
            if elements.is_empty() {
                return Ok(((), None));
            }
            let description = format!("inserted into list at {}: {:?}", index, elements);
            list.splice(index..index, elements.iter().cloned());
            Ok(((), Some(added(ChangeKind::Inserted, description, elements))))
        })
    }

    pub fn insert_all_at_end(
        &self,
        elements: impl IntoIterator<Item = E>,
        notify: bool,
    ) -> Result<()> {
        let elements: Vec<E> = elements.into_iter().collect();
        self.modify(notify, |list| {
            if elements.is_empty() {
                return Ok(((), None));
            }
            let description = format!("inserted at end of list: {:?}", elements);
            list.extend(elements.iter().cloned());
            Ok(((), Some(added(ChangeKind::Inserted, description, elements))))
        })
    }

    /// Remove the first element equal to `element`; false if there was none
    pub fn remove(&self, element: &E, notify: bool) -> Result<bool> {
        self.modify(notify, |list| {
            let Some(index) = list.iter().position(|e| e == element) else {
                return Ok((false, None));
            };
            let element = list.remove(index);
            let description = format!("removed from list: {:?}", element);
            Ok((true, Some(removed(description, element))))
        })
    }

    /// Remove and return the element at `index`
    pub fn remove_at(&self, index: usize, notify: bool) -> Result<E> {
        self.modify(notify, |list| {
            if index >= list.len() {
                return Err(self.out_of_range(index, list.len()));
            }
            let element = list.remove(index);
            let description = format!("removed from list at {}: {:?}", index, element);
            Ok((element.clone(), Some(removed(description, element))))
        })
    }

    /// Remove every element matching `predicate`, returning how many went
    ///
    /// The predicate runs while the property is locked for writing and must
    /// not access this property.
    pub fn remove_where(
        &self,
        mut predicate: impl FnMut(&E) -> bool,
        notify: bool,
    ) -> Result<usize> {
        self.modify(notify, |list| {
            // Judge every element before touching the list
            let hits: Vec<bool> = list.iter().map(&mut predicate).collect();
            if !hits.contains(&true) {
                return Ok((0, None));
            }
            let mut gone = Vec::new();
            let mut hit = hits.into_iter();
            list.retain(|e| {
                let remove = hit.next().unwrap_or(false);
                if remove {
                    gone.push(e.clone());
                }
                !remove
            });
            let count = gone.len();
            let description = format!("removed from list: {:?}", gone);
            Ok((count, Some(removed(description, gone))))
        })
    }

    pub fn clear(&self, notify: bool) -> Result<()> {
        self.modify(notify, |list| {
            if list.is_empty() {
                return Ok(((), None));
            }
            let previous = std::mem::take(list);
            Ok((
                (),
                Some(Mutation {
                    kind: ChangeKind::Cleared,
                    description: format!("cleared list of {} elements", previous.len()),
                    previous: Some(EventValue::new(previous)),
                    next: Some(EventValue::new(Vec::<E>::new())),
                }),
            ))
        })
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub fn len(&self) -> usize {
        self.with_value(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.with_value(Vec::is_empty)
    }

    pub fn first(&self) -> Option<E> {
        self.with_value(|list| list.first().cloned())
    }

    pub fn last(&self) -> Option<E> {
        self.with_value(|list| list.last().cloned())
    }

    /// The only element, or `None` unless the list has exactly one
    pub fn single(&self) -> Option<E> {
        self.with_value(|list| match list.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        })
    }

    pub fn reversed(&self) -> Vec<E> {
        self.with_value(|list| list.iter().rev().cloned().collect())
    }

    /// Elements matching `predicate`, in order
    pub fn filtered(&self, mut predicate: impl FnMut(&E) -> bool) -> Vec<E> {
        self.value().into_iter().filter(|e| predicate(e)).collect()
    }

    pub fn first_where(&self, predicate: impl FnMut(&E) -> bool) -> Result<E> {
        self.first_where_or_none(predicate)
            .ok_or_else(|| TetherError::NoMatchingElement {
                name: self.display_name(),
            })
    }

    pub fn first_where_or_none(&self, mut predicate: impl FnMut(&E) -> bool) -> Option<E> {
        self.value().into_iter().find(|e| predicate(e))
    }

    pub fn index_of(&self, element: &E) -> Option<usize> {
        self.with_value(|list| list.iter().position(|e| e == element))
    }

    pub fn index_where(&self, predicate: impl FnMut(&E) -> bool) -> Option<usize> {
        self.value().iter().position(predicate)
    }

    /// Elements `start..end`, or `start..` when `end` is `None`
    pub fn sublist(&self, start: usize, end: Option<usize>) -> Result<Vec<E>> {
        self.with_value(|list| {
            let end = end.unwrap_or(list.len());
            if end > list.len() {
                return Err(self.out_of_range(end, list.len()));
            }
            if start > end {
                return Err(self.out_of_range(start, end));
            }
            Ok(list[start..end].to_vec())
        })
    }

    pub fn element_at(&self, index: usize) -> Result<E> {
        self.with_value(|list| {
            list.get(index)
                .cloned()
                .ok_or_else(|| self.out_of_range(index, list.len()))
        })
    }

    pub fn contains(&self, element: &E) -> bool {
        self.with_value(|list| list.contains(element))
    }

    pub fn map<R>(&self, f: impl FnMut(&E) -> R) -> Vec<R> {
        self.value().iter().map(f).collect()
    }

    /// Visit a snapshot of the elements
    pub fn for_each(&self, f: impl FnMut(&E)) {
        self.value().iter().for_each(f)
    }
}

#[cfg(test)]
mod tests {
    use crate::{ChangeKind, TetherError, ViewModel};

    fn planets() -> Vec<String> {
        vec!["Mercury".to_string(), "Venus".to_string()]
    }

    #[test]
    fn test_add_and_insert_events() {
        let vm = ViewModel::new();
        let list = vm.property("planets", planets());
        let mut rx = vm.subscribe_changes().unwrap();

        list.add("Earth".to_string(), true).unwrap();
        list.insert(0, "Sun".to_string(), true).unwrap();
        list.add_all(vec!["Mars".to_string()], true).unwrap();
        list.insert_all_at_end(Vec::new(), true).unwrap();

        let added = rx.try_recv().unwrap();
        assert_eq!(added[0].kind(), ChangeKind::Added);
        assert_eq!(added[0].next::<String>().map(String::as_str), Some("Earth"));
        assert_eq!(added[0].description(), Some("added to list: \"Earth\""));

        let inserted = rx.try_recv().unwrap();
        assert_eq!(inserted[0].kind(), ChangeKind::Inserted);

        let all = rx.try_recv().unwrap();
        assert_eq!(all[0].next::<Vec<String>>(), Some(&vec!["Mars".to_string()]));
        // Adding nothing emits nothing
        assert!(rx.try_recv().is_err());

        assert_eq!(list.value(), ["Sun", "Mercury", "Venus", "Earth", "Mars"]);
    }

    #[test]
    fn test_insert_all_keeps_order() {
        let vm = ViewModel::new();
        let list = vm.property("digits", vec![1u8, 4]);
        list.insert_all(1, [2, 3], true).unwrap();
        assert_eq!(list.value(), vec![1, 2, 3, 4]);
        assert!(list.insert(9, 0, true).is_err());
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_remove_variants() {
        let vm = ViewModel::new();
        let list = vm.property("digits", vec![1u8, 2, 3, 4, 5, 6]);
        let mut rx = vm.subscribe_changes().unwrap();

        assert!(list.remove(&3, true).unwrap());
        assert!(!list.remove(&9, true).unwrap());
        assert_eq!(list.remove_at(0, true).unwrap(), 1);
        assert_eq!(list.remove_where(|d| d % 2 == 0, true).unwrap(), 3);
        assert_eq!(list.value(), vec![5]);

        let first = rx.try_recv().unwrap();
        assert_eq!(first[0].previous::<u8>(), Some(&3));
        let second = rx.try_recv().unwrap();
        assert_eq!(second[0].previous::<u8>(), Some(&1));
        let third = rx.try_recv().unwrap();
        assert_eq!(third[0].previous::<Vec<u8>>(), Some(&vec![2, 4, 6]));
        assert!(rx.try_recv().is_err());

        assert_eq!(
            list.remove_at(5, true).unwrap_err(),
            TetherError::IndexOutOfRange {
                name: "digits".into(),
                index: 5,
                len: 1,
            }
        );
    }

    #[test]
    fn test_panicking_predicate_leaves_list_intact() {
        let vm = ViewModel::new();
        let list = vm.property("digits", vec![1u8, 2, 3]);
        let mut rx = vm.subscribe_changes().unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            list.remove_where(
                |d| {
                    assert!(*d < 3, "cannot judge {d}");
                    *d == 1
                },
                true,
            )
        }));
        assert!(outcome.is_err());
        assert_eq!(list.value(), vec![1, 2, 3]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_clear_carries_old_list() {
        let vm = ViewModel::new();
        let list = vm.property("digits", vec![1u8, 2]);
        let mut rx = vm.subscribe_changes().unwrap();

        list.clear(true).unwrap();
        list.clear(true).unwrap();

        let batch = rx.try_recv().unwrap();
        assert_eq!(batch[0].kind(), ChangeKind::Cleared);
        assert_eq!(batch[0].previous::<Vec<u8>>(), Some(&vec![1, 2]));
        assert_eq!(batch[0].next::<Vec<u8>>(), Some(&Vec::new()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_silent_mutations_skip_events() {
        let vm = ViewModel::new();
        let list = vm.property("digits", vec![1u8]);
        let mut rx = vm.subscribe_changes().unwrap();
        list.add(2, false).unwrap();
        list.remove_at(0, false).unwrap();
        assert!(rx.try_recv().is_err());
        assert_eq!(list.value(), vec![2]);
    }

    #[test]
    fn test_reads_do_not_notify() {
        let vm = ViewModel::new();
        let list = vm.property("digits", vec![3u8, 1, 4, 1, 5]);
        let mut rx = vm.subscribe_changes().unwrap();

        assert_eq!(list.first(), Some(3));
        assert_eq!(list.last(), Some(5));
        assert_eq!(list.single(), None);
        assert_eq!(list.reversed(), vec![5, 1, 4, 1, 3]);
        assert_eq!(list.filtered(|d| *d > 2), vec![3, 4, 5]);
        assert_eq!(list.first_where(|d| *d > 3).unwrap(), 4);
        assert!(matches!(
            list.first_where(|d| *d > 9),
            Err(TetherError::NoMatchingElement { .. })
        ));
        assert_eq!(list.first_where_or_none(|d| *d > 9), None);
        assert_eq!(list.index_of(&1), Some(1));
        assert_eq!(list.index_where(|d| *d == 5), Some(4));
        assert_eq!(list.sublist(1, Some(3)).unwrap(), vec![1, 4]);
        assert_eq!(list.sublist(3, None).unwrap(), vec![1, 5]);
        assert!(list.sublist(4, Some(2)).is_err());
        assert_eq!(list.element_at(2).unwrap(), 4);
        assert!(list.element_at(5).is_err());
        assert!(list.contains(&4));
        assert_eq!(list.map(|d| u32::from(*d) * 10), vec![30, 10, 40, 10, 50]);

        let mut sum = 0u32;
        list.for_each(|d| sum += u32::from(*d));
        assert_eq!(sum, 14);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reset_restores_independent_copy() {
        let vm = ViewModel::new();
        let list = vm.property("planets", planets());
        list.add("Earth".to_string(), true).unwrap();
        list.reset().unwrap();
        assert_eq!(list.value(), planets());

        // Mutating after reset must not leak into the original
        list.clear(true).unwrap();
        assert_eq!(list.original_value(), planets());
        list.reset().unwrap();
        assert_eq!(list.value(), planets());
    }

    #[test]
    fn test_single_element() {
        let vm = ViewModel::new();
        let list = vm.property("one", vec!['x']);
        assert_eq!(list.single(), Some('x'));
    }
}
