//! Typed operations on properties of common value types
//!
//! Each submodule adds inherent methods to `Property<T>` for one family of
//! value types, plus the nullable `Property<Option<T>>` counterpart:
//!
//! | Module       | Value type              | Nullable policy                    |
//! |--------------|-------------------------|------------------------------------|
//! | [`numeric`]  | `i64`, `f64`            | arithmetic fails with `NullValue`  |
//! | [`text`]     | `String`                | queries default, values propagate  |
//! | [`boolean`]  | `bool`                  | predicates are `false`             |
//! | [`list`]     | `Vec<E>`                | n/a                                |
//! | [`map`]      | `IndexMap<K, V>`        | n/a                                |
//! | [`datetime`] | `DateTime<Utc>`         | accessors return `None` / `false`  |
//!
//! Structural collection mutations each emit one event labeled with a
//! [`ChangeKind`](crate::ChangeKind) and a description of what was touched.

pub mod boolean;
pub mod datetime;
pub mod list;
pub mod map;
pub mod numeric;
pub mod text;

use crate::property::Property;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

pub use numeric::{Numeric, Promote};

pub type IntProperty = Property<i64>;
pub type NullableIntProperty = Property<Option<i64>>;
pub type DoubleProperty = Property<f64>;
pub type NullableDoubleProperty = Property<Option<f64>>;
pub type StringProperty = Property<String>;
pub type NullableStringProperty = Property<Option<String>>;
pub type BoolProperty = Property<bool>;
pub type NullableBoolProperty = Property<Option<bool>>;
pub type ListProperty<E> = Property<Vec<E>>;
pub type MapProperty<K, V> = Property<IndexMap<K, V>>;
pub type DateTimeProperty = Property<DateTime<Utc>>;
pub type NullableDateTimeProperty = Property<Option<DateTime<Utc>>>;
