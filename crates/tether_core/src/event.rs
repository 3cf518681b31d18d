//! Change and error events delivered on a view model's streams
//!
//! A [`ChangeEvent`] records one property transition. Events are grouped into
//! a [`ChangeBatch`]: a single stream emission, which carries one event for a
//! plain `set` and N events for a batched `set_multiple`.
//!
//! The [`ChangeEvents`] extension trait offers lookups over a batch by
//! property name, which is how listeners usually filter:
//!
//! ```
//! use tether_core::{ChangeEvent, ChangeEvents};
//!
//! let batch = vec![ChangeEvent::new(Some(1i64), Some(10i64)).with_property_name("age")];
//! assert_eq!(batch.next_value_for::<i64>("age"), Some(&10));
//! assert_eq!(batch.previous_value_for::<i64>("age"), Some(&1));
//! ```

use crate::view_model::PropertyId;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// One stream emission of change events
pub type ChangeBatch = Arc<[ChangeEvent]>;

/// A type-erased, shareable snapshot of a property value
#[derive(Clone)]
pub struct EventValue {
    value: Arc<dyn Any + Send + Sync>,
    repr: Arc<str>,
}

impl EventValue {
    /// Capture a value, remembering its `Debug` rendering
    pub fn new<T: Any + Send + Sync + fmt::Debug>(value: T) -> Self {
        let repr: Arc<str> = format!("{:?}", value).into();
        Self {
            value: Arc::new(value),
            repr,
        }
    }

    /// Borrow the value as `T` if that is its concrete type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Whether the value has concrete type `T`
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// The `Debug` rendering captured at construction
    pub fn repr(&self) -> &str {
        &self.repr
    }
}

impl fmt::Debug for EventValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

impl fmt::Display for EventValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

/// What kind of operation produced a change event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Whole-value replacement
    Set,
    /// Restored to the original value
    Reset,
    /// Element(s) or entries appended
    Added,
    /// Element(s) inserted at a position
    Inserted,
    /// Element(s) or entries removed
    Removed,
    /// Map entries updated in place
    Updated,
    /// Collection emptied
    Cleared,
    /// View model busy state changed
    Busy,
}

/// Immutable record of one property transition
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    previous_value: Option<EventValue>,
    next_value: Option<EventValue>,
    property_name: Option<Arc<str>>,
    property_id: Option<PropertyId>,
    kind: ChangeKind,
    description: Option<String>,
}

impl ChangeEvent {
    /// Create a `Set` event between two values
    pub fn new<T>(previous: Option<T>, next: Option<T>) -> Self
    where
        T: Any + Send + Sync + fmt::Debug,
    {
        Self::from_values(
            ChangeKind::Set,
            previous.map(EventValue::new),
            next.map(EventValue::new),
        )
    }

    /// Create an event from already-erased values
    pub fn from_values(
        kind: ChangeKind,
        previous_value: Option<EventValue>,
        next_value: Option<EventValue>,
    ) -> Self {
        Self {
            previous_value,
            next_value,
            property_name: None,
            property_id: None,
            kind,
            description: None,
        }
    }

    pub fn with_property_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.property_name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_kind(mut self, kind: ChangeKind) -> Self {
        self.kind = kind;
        self
    }

    pub(crate) fn with_origin(mut self, name: Option<Arc<str>>, id: Option<PropertyId>) -> Self {
        self.property_name = name;
        self.property_id = id;
        self
    }

    pub fn previous_value(&self) -> Option<&EventValue> {
        self.previous_value.as_ref()
    }

    pub fn next_value(&self) -> Option<&EventValue> {
        self.next_value.as_ref()
    }

    /// Typed view of the previous value
    pub fn previous<T: Any>(&self) -> Option<&T> {
        self.previous_value.as_ref().and_then(EventValue::downcast_ref::<T>)
    }

    /// Typed view of the next value
    pub fn next<T: Any>(&self) -> Option<&T> {
        self.next_value.as_ref().and_then(EventValue::downcast_ref::<T>)
    }

    pub fn property_name(&self) -> Option<&str> {
        self.property_name.as_deref()
    }

    /// Registry key of the originating property, if it was bound
    pub fn property_id(&self) -> Option<PropertyId> {
        self.property_id
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.property_name.as_deref().unwrap_or(crate::error::UNNAMED);
        match &self.description {
            Some(description) => write!(f, "{}: {}", name, description),
            None => {
                let show = |v: &Option<EventValue>| {
                    v.as_ref()
                        .map(|v| v.repr().to_string())
                        .unwrap_or_else(|| "null".to_string())
                };
                write!(
                    f,
                    "{}: {} -> {}",
                    name,
                    show(&self.previous_value),
                    show(&self.next_value)
                )
            }
        }
    }
}

/// Query helpers over a batch of change events
pub trait ChangeEvents {
    /// First event emitted for the property with this name
    fn first_for_property_name(&self, name: &str) -> Option<&ChangeEvent>;

    /// Next value of the first event for `name`, if it has type `T`
    fn next_value_for<T: Any>(&self, name: &str) -> Option<&T>;

    /// Previous value of the first event for `name`, if it has type `T`
    fn previous_value_for<T: Any>(&self, name: &str) -> Option<&T>;

    fn contains_property_name(&self, name: &str) -> bool;

    /// All events emitted by the property with this registry key
    fn for_property_id(&self, id: PropertyId) -> Vec<&ChangeEvent>;
}

impl ChangeEvents for [ChangeEvent] {
    fn first_for_property_name(&self, name: &str) -> Option<&ChangeEvent> {
        self.iter().find(|e| e.property_name() == Some(name))
    }

    fn next_value_for<T: Any>(&self, name: &str) -> Option<&T> {
        self.first_for_property_name(name).and_then(ChangeEvent::next::<T>)
    }

    fn previous_value_for<T: Any>(&self, name: &str) -> Option<&T> {
        self.first_for_property_name(name)
            .and_then(ChangeEvent::previous::<T>)
    }

    fn contains_property_name(&self, name: &str) -> bool {
        self.first_for_property_name(name).is_some()
    }

    fn for_property_id(&self, id: PropertyId) -> Vec<&ChangeEvent> {
        self.iter()
            .filter(|e| e.property_id == Some(id))
            .collect()
    }
}

impl ChangeEvents for Vec<ChangeEvent> {
    fn first_for_property_name(&self, name: &str) -> Option<&ChangeEvent> {
        self.as_slice().first_for_property_name(name)
    }

    fn next_value_for<T: Any>(&self, name: &str) -> Option<&T> {
        self.as_slice().next_value_for(name)
    }

    fn previous_value_for<T: Any>(&self, name: &str) -> Option<&T> {
        self.as_slice().previous_value_for(name)
    }

    fn contains_property_name(&self, name: &str) -> bool {
        self.as_slice().contains_property_name(name)
    }

    fn for_property_id(&self, id: PropertyId) -> Vec<&ChangeEvent> {
        self.as_slice().for_property_id(id)
    }
}

/// Extra context attached to a reported error
pub type ErrorMetadata = FxHashMap<String, String>;

/// An error reported on a view model's error stream
#[derive(Clone, Debug)]
pub struct ErrorEvent {
    pub error: Arc<dyn Error + Send + Sync>,
    pub backtrace: Option<Arc<Backtrace>>,
    pub metadata: ErrorMetadata,
}

impl ErrorEvent {
    pub fn new(error: impl Error + Send + Sync + 'static) -> Self {
        Self {
            error: Arc::new(error),
            backtrace: None,
            metadata: ErrorMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}
