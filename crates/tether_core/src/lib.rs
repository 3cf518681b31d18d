//! Tether Core
//!
//! Observable state for view models:
//!
//! - **Properties**: values with original-value tracking, equality and reset
//! - **Typed Variants**: arithmetic, text, collection and calendar operations
//!   on common value types, with null-guarded nullable forms
//! - **View Models**: property registries with a change stream, an error
//!   stream, busy-task tracking and batched "set many, notify once" updates
//! - **Change Events**: immutable transition records with batch lookups
//!
//! # Example
//!
//! ```rust
//! use tether_core::{ChangeEvents, ViewModel};
//!
//! let vm = ViewModel::new();
//! let name = vm.property("name", "Ada".to_string());
//! let age = vm.property("age", 36i64);
//! let mut changes = vm.subscribe_changes().unwrap();
//!
//! // Two writes, one notification
//! vm.set_multiple(vec![name.write("Grace".into()), age.write(45)]).unwrap();
//!
//! let batch = changes.try_recv().unwrap();
//! assert_eq!(batch.len(), 2);
//! assert_eq!(batch.next_value_for::<i64>("age"), Some(&45));
//!
//! // Back to the constructed values
//! vm.reset_all().unwrap();
//! assert_eq!(age.value(), 36);
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod property;
pub mod value;
pub mod variants;
pub mod view_model;


pub use config::ViewModelConfig;
pub use error::{Result, TetherError};
pub use event::{
    ChangeBatch, ChangeEvent, ChangeEvents, ChangeKind, ErrorEvent, ErrorMetadata, EventValue,
};
pub use property::{AnyProperty, Comparand, Property, PropertyOptions, PropertyWrite, SetOptions};
pub use value::{CopyStrategy, PropertyValue};
pub use variants::{
    BoolProperty, DateTimeProperty, DoubleProperty, IntProperty, ListProperty, MapProperty,
    NullableBoolProperty, NullableDateTimeProperty, NullableDoubleProperty, NullableIntProperty,
    NullableStringProperty, Numeric, Promote, StringProperty,
};
pub use view_model::{PropertyId, Subscription, TaskKey, ViewModel, BUSY_PROPERTY_NAME};
