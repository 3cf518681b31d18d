//! Value capabilities that govern how a property restores its original value
//!
//! Every type stored in a [`Property`](crate::Property) implements
//! [`PropertyValue`]. The trait carries two optional capabilities used by
//! `reset()`:
//!
//! - [`PropertyValue::deep_clone`]: a structural copy that shares no storage
//!   with the source. Collections provide this.
//! - [`PropertyValue::PRIMITIVE`]: the type has no interior sharing, so a plain
//!   `Clone` is a safe copy.
//!
//! Types that provide neither are restored with a plain `Clone`. For handles like
//! `Arc<T>` that shares the pointee with the original, and a warning is logged.
//! Collections deep-clone only when every element copies independently; a list
//! of shared handles falls back to a plain `Clone` like the handles themselves.
//!
//! ```
//! use tether_core::PropertyValue;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Profile {
//!     tags: Vec<String>,
//! }
//!
//! impl PropertyValue for Profile {
//!     fn deep_clone(&self) -> Option<Self> {
//!         Some(Profile { tags: self.tags.iter().cloned().collect() })
//!     }
//! }
//! ```

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// A value that can live inside a [`Property`](crate::Property)
pub trait PropertyValue: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// Whether values of this type copy safely by value
    const PRIMITIVE: bool = false;

    /// Structural copy sharing no storage with `self`, if the type supports one
    fn deep_clone(&self) -> Option<Self> {
        None
    }
}

macro_rules! primitive_values {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PropertyValue for $ty {
                const PRIMITIVE: bool = true;
            }
        )*
    };
}

primitive_values!(
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    (),
    DateTime<Utc>,
);

impl<T: PropertyValue> PropertyValue for Option<T> {
    const PRIMITIVE: bool = T::PRIMITIVE;

    fn deep_clone(&self) -> Option<Self> {
        match self {
            Some(value) => element_copy(value).map(Some),
            None => Some(None),
        }
    }
}

impl<E: PropertyValue> PropertyValue for Vec<E> {
    fn deep_clone(&self) -> Option<Self> {
        self.iter().map(element_copy).collect()
    }
}

impl<K, V> PropertyValue for IndexMap<K, V>
where
    K: PropertyValue + Eq + Hash,
    V: PropertyValue,
{
    fn deep_clone(&self) -> Option<Self> {
        self.iter()
            .map(|(k, v)| Some((element_copy(k)?, element_copy(v)?)))
            .collect()
    }
}

impl<K, V> PropertyValue for HashMap<K, V>
where
    K: PropertyValue + Eq + Hash,
    V: PropertyValue,
{
    fn deep_clone(&self) -> Option<Self> {
        self.iter()
            .map(|(k, v)| Some((element_copy(k)?, element_copy(v)?)))
            .collect()
    }
}

impl<T> PropertyValue for Arc<T> where T: PartialEq + Debug + Send + Sync + 'static {}

/// Independent copy of an element, or `None` if it would share storage
fn element_copy<T: PropertyValue>(value: &T) -> Option<T> {
    if T::PRIMITIVE {
        Some(value.clone())
    } else {
        value.deep_clone()
    }
}

/// How a property produced the value it restores on reset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyStrategy {
    /// `deep_clone` produced an independent structural copy
    DeepClone,
    /// The property is primitive, copied by value
    ByValue,
    /// Plain `Clone`; may share storage with the original
    Shared,
}

/// Copy `value` using the strongest strategy available
pub(crate) fn restore_copy<T: PropertyValue>(value: &T, primitive: bool) -> (T, CopyStrategy) {
    if let Some(copy) = value.deep_clone() {
        (copy, CopyStrategy::DeepClone)
    } else if primitive {
        (value.clone(), CopyStrategy::ByValue)
    } else {
        (value.clone(), CopyStrategy::Shared)
    }
}
