//! Observable properties
//!
//! A [`Property<T>`] holds a current value and the original value it was
//! created with. Writes compare against the current value and, when the value
//! actually changes, push a [`ChangeEvent`] through the view model the
//! property is bound to.
//!
//! A property starts out standalone. It is bound to exactly one
//! [`ViewModel`](crate::ViewModel), either by [`ViewModel::property`](crate::ViewModel::property)
//! or by an explicit [`ViewModel::bind`](crate::ViewModel::bind). Notifying
//! operations on an unbound property fail with
//! [`TetherError::PropertyNotBound`] before anything is changed.
//!
//! ```
//! use tether_core::{Property, ViewModel};
//!
//! let vm = ViewModel::new();
//! let age = vm.property("age", 1i64);
//! let mut changes = vm.subscribe_changes().unwrap();
//!
//! age.set(10).unwrap();
//! age.reset().unwrap();
//! assert_eq!(age.value(), 1);
//!
//! let first = changes.try_recv().unwrap();
//! assert_eq!(first[0].next::<i64>(), Some(&10));
//! ```
//!
//! `Property` is a handle: cloning it yields another handle to the same
//! value, not a copy.

use crate::error::{Result, TetherError, UNNAMED};
use crate::event::{ChangeEvent, ChangeKind, EventValue};
use crate::value::{restore_copy, CopyStrategy, PropertyValue};
use crate::view_model::{PropertyId, ViewModelShared};
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

pub(crate) mod sealed {
    use super::*;

    /// Association between a property and its owning view model
    pub struct Binding {
        pub id: PropertyId,
        pub owner: Weak<ViewModelShared>,
    }

    /// Type-erased access to a property's storage, used by the registry
    pub trait ErasedCell: Send + Sync {
        fn display_name(&self) -> String;
        fn property_name(&self) -> Option<&str>;
        fn value_type_name(&self) -> &'static str;
        fn binding(&self) -> Option<&Binding>;
        fn attach(&self, binding: Binding) -> Result<()>;
        fn modified(&self) -> bool;
        /// Write that restores the original value, for batched resets
        fn restore_write(self: Arc<Self>) -> PropertyWrite;
    }

    /// Access to the erased cell behind a property handle
    pub trait Bindable {
        fn erased_cell(&self) -> Arc<dyn ErasedCell>;
    }
}

use sealed::{Binding, ErasedCell};

/// Construction options for a [`Property`]
#[derive(Clone, Debug, Default)]
pub struct PropertyOptions {
    /// Diagnostic name carried by every event this property emits
    pub name: Option<String>,
    /// Overrides `PropertyValue::PRIMITIVE` for the reset strategy
    pub primitive: Option<bool>,
}

impl PropertyOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            primitive: None,
        }
    }

    pub fn primitive(mut self, primitive: bool) -> Self {
        self.primitive = Some(primitive);
        self
    }
}

/// Options for [`Property::set_with`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetOptions {
    /// Emit a change event if the value changed
    pub notify: bool,
    /// Also make the new value the reset target
    pub make_original: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            notify: true,
            make_original: false,
        }
    }
}

impl SetOptions {
    /// Store without emitting an event
    pub fn silent() -> Self {
        Self {
            notify: false,
            make_original: false,
        }
    }

    pub fn make_original(mut self, make_original: bool) -> Self {
        self.make_original = make_original;
        self
    }
}

struct Values<T> {
    current: T,
    original: T,
}

/// Shared storage behind a property handle
pub(crate) struct PropertyCell<T> {
    name: Option<Arc<str>>,
    primitive: bool,
    values: RwLock<Values<T>>,
    binding: OnceLock<Binding>,
}

/// A structural change applied by [`Property::modify`]
pub(crate) struct Mutation {
    pub kind: ChangeKind,
    pub previous: Option<EventValue>,
    pub next: Option<EventValue>,
    pub description: String,
}

impl<T: PropertyValue> PropertyCell<T> {
    fn new(value: T, options: PropertyOptions) -> Self {
        let primitive = options.primitive.unwrap_or(T::PRIMITIVE);
        let (original, _) = restore_copy(&value, primitive);
        Self {
            name: options.name.map(Arc::from),
            primitive,
            values: RwLock::new(Values {
                current: value,
                original,
            }),
            binding: OnceLock::new(),
        }
    }

    pub(crate) fn name(&self) -> String {
        self.name.as_deref().unwrap_or(UNNAMED).to_string()
    }

    pub(crate) fn bind_fresh(&self, binding: Binding) {
        self.binding.get_or_init(|| binding);
    }

    /// Owner to notify; fails fast if this property was never bound
    fn notifier(&self) -> Result<Option<Arc<ViewModelShared>>> {
        match self.binding.get() {
            Some(binding) => Ok(binding.owner.upgrade()),
            None => Err(TetherError::PropertyNotBound {
                name: self.name(),
                type_name: std::any::type_name::<T>(),
            }),
        }
    }

    /// Copy of `value` suitable as a reset target or restored value
    fn copy_for_restore(&self, value: &T) -> T {
        let (copy, strategy) = restore_copy(value, self.primitive);
        if strategy == CopyStrategy::Shared {
            tracing::warn!(
                property = %self.name(),
                value_type = std::any::type_name::<T>(),
                "restoring a non-primitive value without deep_clone; \
                 it may share storage with the original"
            );
        }
        copy
    }

    fn event(
        &self,
        kind: ChangeKind,
        previous: Option<EventValue>,
        next: Option<EventValue>,
    ) -> ChangeEvent {
        ChangeEvent::from_values(kind, previous, next)
            .with_origin(self.name.clone(), self.binding.get().map(|b| b.id))
    }

    /// Replace the current value without notifying, returning the transition
    fn replace_silently(&self, value: T, kind: ChangeKind) -> ChangeEvent {
        let previous = {
            let mut values = self.values.write();
            std::mem::replace(&mut values.current, value.clone())
        };
        self.event(
            kind,
            Some(EventValue::new(previous)),
            Some(EventValue::new(value)),
        )
    }
}

impl<T: PropertyValue> ErasedCell for PropertyCell<T> {
    fn display_name(&self) -> String {
        self.name()
    }

    fn property_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn value_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn binding(&self) -> Option<&Binding> {
        self.binding.get()
    }

    fn attach(&self, binding: Binding) -> Result<()> {
        self.binding
            .set(binding)
            .map_err(|_| TetherError::PropertyAlreadyBound { name: self.name() })
    }

    fn modified(&self) -> bool {
        let values = self.values.read();
        values.current != values.original
    }

    fn restore_write(self: Arc<Self>) -> PropertyWrite {
        let restored = {
            let values = self.values.read();
            self.copy_for_restore(&values.original)
        };
        let cell = self.clone();
        PropertyWrite {
            target: self,
            apply: Box::new(move || cell.replace_silently(restored, ChangeKind::Reset)),
        }
    }
}

/// A pending write for [`ViewModel::set_multiple`](crate::ViewModel::set_multiple)
pub struct PropertyWrite {
    pub(crate) target: Arc<dyn ErasedCell>,
    pub(crate) apply: Box<dyn FnOnce() -> ChangeEvent + Send>,
}

impl fmt::Debug for PropertyWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyWrite")
            .field("property", &self.target.display_name())
            .finish()
    }
}

/// Either side of a property comparison
pub enum Comparand<'a, T: PropertyValue> {
    Value(&'a T),
    Property(&'a Property<T>),
}

impl<'a, T: PropertyValue> From<&'a T> for Comparand<'a, T> {
    fn from(value: &'a T) -> Self {
        Comparand::Value(value)
    }
}

impl<'a, T: PropertyValue> From<&'a Property<T>> for Comparand<'a, T> {
    fn from(property: &'a Property<T>) -> Self {
        Comparand::Property(property)
    }
}

/// An observable value with original-value tracking and reset
pub struct Property<T: PropertyValue> {
    cell: Arc<PropertyCell<T>>,
}

impl<T: PropertyValue> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: PropertyValue> Property<T> {
    /// Create an unnamed, unbound property
    pub fn new(value: T) -> Self {
        Self::with_options(value, PropertyOptions::default())
    }

    /// Create a named, unbound property
    pub fn named(name: impl Into<String>, value: T) -> Self {
        Self::with_options(value, PropertyOptions::named(name))
    }

    pub fn with_options(value: T, options: PropertyOptions) -> Self {
        Self {
            cell: Arc::new(PropertyCell::new(value, options)),
        }
    }

    pub(crate) fn cell(&self) -> &Arc<PropertyCell<T>> {
        &self.cell
    }

    /// Clone of the current value
    pub fn value(&self) -> T {
        self.cell.values.read().current.clone()
    }

    /// Run `f` against the current value without cloning it
    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.values.read().current)
    }

    /// Clone of the value `reset()` restores
    pub fn original_value(&self) -> T {
        self.cell.values.read().original.clone()
    }

    pub fn name(&self) -> Option<&str> {
        self.cell.name.as_deref()
    }

    pub fn is_primitive(&self) -> bool {
        self.cell.primitive
    }

    pub fn is_bound(&self) -> bool {
        self.cell.binding.get().is_some()
    }

    /// Registry key within the owning view model
    pub fn id(&self) -> Option<PropertyId> {
        self.cell.binding.get().map(|b| b.id)
    }

    /// Whether the current value differs from the original
    pub fn is_modified(&self) -> bool {
        self.cell.modified()
    }

    /// Set a new value and notify if it changed
    pub fn set(&self, value: T) -> Result<T> {
        self.set_with(value, SetOptions::default())
    }

    /// Set a new value with explicit notification and baseline options
    ///
    /// The value is always stored, even when it compares equal to the current
    /// one, but an event is only emitted for an actual change.
    pub fn set_with(&self, value: T, options: SetOptions) -> Result<T> {
        let owner = if options.notify {
            self.cell.notifier()?
        } else {
            None
        };
        let original = options
            .make_original
            .then(|| self.cell.copy_for_restore(&value));

        let (previous, changed) = {
            let mut values = self.cell.values.write();
            let changed = values.current != value;
            let previous = std::mem::replace(&mut values.current, value.clone());
            if let Some(original) = original {
                values.original = original;
            }
            (previous, changed)
        };

        if changed {
            if let Some(owner) = owner {
                let event = self.cell.event(
                    ChangeKind::Set,
                    Some(EventValue::new(previous)),
                    Some(EventValue::new(value.clone())),
                );
                owner.notify(vec![event]);
            }
        }
        Ok(value)
    }

    /// Set the value computed from the current one
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<T> {
        let next = self.with_value(f);
        self.set(next)
    }

    /// Make the current value the new reset target, without notifying
    pub fn set_original_value_to_current(&self) {
        let mut values = self.cell.values.write();
        let original = self.cell.copy_for_restore(&values.current);
        values.original = original;
    }

    /// Restore the original value and notify if it changed
    pub fn reset(&self) -> Result<()> {
        self.reset_with(true)
    }

    /// Restore the original value
    ///
    /// The restored value is a `deep_clone` of the original when the type
    /// supports one, a by-value copy for primitives, and otherwise a plain
    /// clone that may share storage (logged as a warning).
    pub fn reset_with(&self, notify: bool) -> Result<()> {
        let owner = if notify { self.cell.notifier()? } else { None };

        let event = {
            let mut values = self.cell.values.write();
            let restored = self.cell.copy_for_restore(&values.original);
            let previous = std::mem::replace(&mut values.current, restored);
            (previous != values.current).then(|| {
                self.cell.event(
                    ChangeKind::Reset,
                    Some(EventValue::new(previous)),
                    Some(EventValue::new(values.current.clone())),
                )
            })
        };

        if let (Some(owner), Some(event)) = (owner, event) {
            owner.notify(vec![event]);
        }
        Ok(())
    }

    /// Compare against another property or a raw value
    pub fn equals<'a>(&self, other: impl Into<Comparand<'a, T>>) -> bool {
        match other.into() {
            Comparand::Value(value) => self.with_value(|current| current == value),
            Comparand::Property(other) => {
                if Arc::ptr_eq(&self.cell, &other.cell) {
                    return true;
                }
                let theirs = other.value();
                self.with_value(|current| *current == theirs)
            }
        }
    }

    /// A write of `value` for a batched update
    pub fn write(&self, value: T) -> PropertyWrite {
        let cell = self.cell.clone();
        PropertyWrite {
            target: self.cell.clone(),
            apply: Box::new(move || cell.replace_silently(value, ChangeKind::Set)),
        }
    }

    /// Apply a structural in-place mutation and emit one labeled event
    ///
    /// `f` returns `None` for a no-op, which emits nothing. It must leave the
    /// value untouched when it returns an error.
    pub(crate) fn modify<R>(
        &self,
        notify: bool,
        f: impl FnOnce(&mut T) -> Result<(R, Option<Mutation>)>,
    ) -> Result<R> {
        let owner = if notify { self.cell.notifier()? } else { None };
        let (result, mutation) = f(&mut self.cell.values.write().current)?;

        if let (Some(owner), Some(mutation)) = (owner, mutation) {
            let event = self
                .cell
                .event(mutation.kind, mutation.previous, mutation.next)
                .with_description(mutation.description);
            owner.notify(vec![event]);
        }
        Ok(result)
    }

    /// Name used in errors raised by typed operations
    pub(crate) fn display_name(&self) -> String {
        self.cell.name()
    }
}

impl<T: PropertyValue + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: PropertyValue> PartialEq for Property<T> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl<T: PropertyValue> PartialEq<T> for Property<T> {
    fn eq(&self, other: &T) -> bool {
        self.equals(other)
    }
}

impl<T: PropertyValue> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_value(|value| {
            f.debug_struct("Property")
                .field("name", &self.cell.name.as_deref())
                .field("value", value)
                .field("bound", &self.is_bound())
                .finish()
        })
    }
}

impl<T: PropertyValue + fmt::Display> fmt::Display for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_value(|value| fmt::Display::fmt(value, f))
    }
}

impl<T: PropertyValue> sealed::Bindable for Property<T> {
    fn erased_cell(&self) -> Arc<dyn ErasedCell> {
        self.cell.clone()
    }
}

/// Object-safe view of any property, used to bind heterogeneous sets
pub trait AnyProperty: sealed::Bindable + Send + Sync {
    fn property_name(&self) -> Option<&str>;
    fn value_type_name(&self) -> &'static str;
    fn property_id(&self) -> Option<PropertyId>;
    fn is_bound(&self) -> bool;
    fn is_modified(&self) -> bool;
}

impl<T: PropertyValue> AnyProperty for Property<T> {
    fn property_name(&self) -> Option<&str> {
        self.name()
    }

    fn value_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn property_id(&self) -> Option<PropertyId> {
        self.id()
    }

    fn is_bound(&self) -> bool {
        Property::is_bound(self)
    }

    fn is_modified(&self) -> bool {
        Property::is_modified(self)
    }
}
