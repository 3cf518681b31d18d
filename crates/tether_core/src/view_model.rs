//! View models: property ownership, change streams, and busy tracking
//!
//! A [`ViewModel`] owns a registry of bound properties and two broadcast
//! streams. Every notifying property write lands on the change stream as a
//! [`ChangeBatch`]; errors reported by the host go to the error stream.
//!
//! - **Binding**: each property is bound to at most one view model. The view
//!   model holds the property strongly, the property only holds a weak
//!   back-reference used to route its notifications.
//! - **Batching**: [`ViewModel::set_multiple`] applies N writes silently and
//!   emits their N events as one batch, so listeners re-render once.
//! - **Busy state**: [`ViewModel::set_busy_status`] tracks overlapping tasks
//!   by key; the view model is busy while any key is active or the unkeyed
//!   flag is set. [`ViewModel::do_async`] scopes this around a future.
//!
//! # Example
//!
//! ```
//! use tether_core::{ChangeEvents, ViewModel};
//!
//! let vm = ViewModel::new();
//! let first = vm.property("first", "Ada".to_string());
//! let last = vm.property("last", "Lovelace".to_string());
//! let mut changes = vm.subscribe_changes().unwrap();
//!
//! vm.set_multiple(vec![
//!     first.write("Grace".into()),
//!     last.write("Hopper".into()),
//! ])
//! .unwrap();
//!
//! let batch = changes.try_recv().unwrap();
//! assert_eq!(batch.len(), 2);
//! assert_eq!(batch.next_value_for::<String>("last").unwrap(), "Hopper");
//! ```

use crate::config::ViewModelConfig;
use crate::error::{Result, TetherError};
use crate::event::{ChangeBatch, ChangeEvent, ChangeKind, ErrorEvent, ErrorMetadata, EventValue};
use crate::property::sealed::{Binding, Bindable, ErasedCell};
use crate::property::{AnyProperty, Property, PropertyWrite};
use crate::value::PropertyValue;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashSet;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use tokio::sync::broadcast;

new_key_type! {
    /// Key of a property within its owning view model
    pub struct PropertyId;
}

/// Property name carried by busy-state change events
pub const BUSY_PROPERTY_NAME: &str = "is_busy";

/// Opaque caller-supplied token identifying one long-running task
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey(Cow<'static, str>);

impl TaskKey {
    pub fn new(key: impl Into<Cow<'static, str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for TaskKey {
    fn from(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }
}

impl From<String> for TaskKey {
    fn from(key: String) -> Self {
        Self(Cow::Owned(key))
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Default)]
struct BusyState {
    /// Set by unkeyed `set_busy_status` calls
    explicit: bool,
    active: FxHashSet<TaskKey>,
}

impl BusyState {
    fn is_busy(&self) -> bool {
        self.explicit || !self.active.is_empty()
    }
}

struct Channels {
    changes: broadcast::Sender<ChangeBatch>,
    errors: broadcast::Sender<ErrorEvent>,
}

/// A cleanup owned by a view model, run on dispose
pub struct Subscription {
    cancel: Box<dyn FnOnce() + Send>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Box::new(cancel),
        }
    }

    pub fn cancel(self) {
        (self.cancel)()
    }
}

impl<T: Send + 'static> From<tokio::task::JoinHandle<T>> for Subscription {
    fn from(handle: tokio::task::JoinHandle<T>) -> Self {
        Self::new(move || handle.abort())
    }
}

impl From<tokio::task::AbortHandle> for Subscription {
    fn from(handle: tokio::task::AbortHandle) -> Self {
        Self::new(move || handle.abort())
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// State shared between a view model handle and its properties
pub(crate) struct ViewModelShared {
    config: ViewModelConfig,
    /// Properties are never removed, so iteration follows bind order
    registry: RwLock<SlotMap<PropertyId, Arc<dyn ErasedCell>>>,
    busy: Mutex<BusyState>,
    /// `None` once disposed
    channels: RwLock<Option<Channels>>,
    subscriptions: Mutex<Vec<Subscription>>,
    owner: OnceLock<String>,
}

impl ViewModelShared {
    pub(crate) fn notify(&self, events: Vec<ChangeEvent>) {
        if events.is_empty() {
            return;
        }
        let sender = self.channels.read().as_ref().map(|c| c.changes.clone());
        let Some(sender) = sender else {
            tracing::debug!(
                view_model = %self.config.name,
                dropped = events.len(),
                "change notification after dispose ignored"
            );
            return;
        };

        let count = events.len();
        let batch: ChangeBatch = events.into();
        match sender.send(batch) {
            Ok(receivers) => tracing::debug!(
                view_model = %self.config.name,
                events = count,
                receivers,
                "emitted change batch"
            ),
            Err(_) => tracing::trace!(
                view_model = %self.config.name,
                events = count,
                "change batch emitted with no listeners"
            ),
        }
    }

    fn disposed_error(&self) -> TetherError {
        TetherError::Disposed {
            view_model: self.config.name.clone(),
        }
    }
}

impl Drop for ViewModelShared {
    fn drop(&mut self) {
        for subscription in self.subscriptions.get_mut().drain(..) {
            subscription.cancel();
        }
    }
}

/// Restores busy state when a `do_async` future completes or is dropped
struct BusyGuard<'a> {
    view_model: &'a ViewModel,
    task_key: Option<TaskKey>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.view_model.set_busy_status(false, self.task_key.take());
    }
}

/// Aggregates properties and routes their change notifications
///
/// `ViewModel` is a cheap handle; clones refer to the same view model.
#[derive(Clone)]
pub struct ViewModel {
    shared: Arc<ViewModelShared>,
}

impl ViewModel {
    pub fn new() -> Self {
        Self::with_config(ViewModelConfig::default())
    }

    pub fn with_config(config: ViewModelConfig) -> Self {
        // broadcast channels reject a zero capacity
        let (changes, _) = broadcast::channel(config.change_capacity.max(1));
        let (errors, _) = broadcast::channel(config.error_capacity.max(1));
        Self {
            shared: Arc::new(ViewModelShared {
                config,
                registry: RwLock::new(SlotMap::with_key()),
                busy: Mutex::new(BusyState::default()),
                channels: RwLock::new(Some(Channels { changes, errors })),
                subscriptions: Mutex::new(Vec::new()),
                owner: OnceLock::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    pub fn config(&self) -> &ViewModelConfig {
        &self.shared.config
    }

    // =========================================================================
    // BINDING
    // =========================================================================

    /// Create a property already bound to this view model
    pub fn property<T: PropertyValue>(&self, name: impl Into<String>, value: T) -> Property<T> {
        let property = Property::named(name, value);
        let cell = property.cell().clone();
        let id = self.shared.registry.write().insert(cell.clone());
        cell.bind_fresh(Binding {
            id,
            owner: Arc::downgrade(&self.shared),
        });
        tracing::trace!(view_model = %self.name(), property = %cell.name(), "bound property");
        property
    }

    /// Bind an existing property to this view model
    pub fn bind<T: PropertyValue>(&self, property: &Property<T>) -> Result<PropertyId> {
        self.bind_cell(property.erased_cell())
    }

    /// Bind every property in `properties`, stopping at the first failure
    pub fn bind_properties(&self, properties: &[&dyn AnyProperty]) -> Result<()> {
        for property in properties {
            self.bind_cell(property.erased_cell())?;
        }
        Ok(())
    }

    fn bind_cell(&self, cell: Arc<dyn ErasedCell>) -> Result<PropertyId> {
        if cell.binding().is_some() {
            return Err(TetherError::PropertyAlreadyBound {
                name: cell.display_name(),
            });
        }

        let id = self.shared.registry.write().insert(cell.clone());
        let binding = Binding {
            id,
            owner: Arc::downgrade(&self.shared),
        };
        if let Err(err) = cell.attach(binding) {
            // Lost a race with another bind; undo our registration
            self.shared.registry.write().remove(id);
            return Err(err);
        }

        tracing::trace!(
            view_model = %self.name(),
            property = %cell.display_name(),
            value_type = cell.value_type_name(),
            "bound property"
        );
        Ok(id)
    }

    pub fn property_count(&self) -> usize {
        self.shared.registry.read().len()
    }

    /// Names of the bound properties in bind order
    pub fn property_names(&self) -> Vec<String> {
        self.shared
            .registry
            .read()
            .values()
            .map(|cell| cell.display_name())
            .collect()
    }

    /// Name a bound property was created with
    pub fn property_name(&self, id: PropertyId) -> Option<String> {
        self.shared
            .registry
            .read()
            .get(id)
            .and_then(|cell| cell.property_name().map(str::to_string))
    }

    /// Whether any bound property differs from its original value
    pub fn has_changes(&self) -> bool {
        self.shared
            .registry
            .read()
            .values()
            .any(|cell| cell.modified())
    }

    /// Attach this view model to an owner
    ///
    /// Re-attaching the same owner is a no-op; a different owner fails.
    pub fn attach(&self, owner: impl Into<String>) -> Result<()> {
        let requested = owner.into();
        let current = self.shared.owner.get_or_init(|| requested.clone());
        if *current == requested {
            Ok(())
        } else {
            Err(TetherError::ViewModelAlreadyAttached {
                view_model: self.name().to_string(),
                owner: current.clone(),
                requested,
            })
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.shared.owner.get().map(String::as_str)
    }

    // =========================================================================
    // STREAMS
    // =========================================================================

    /// Receive every change batch emitted from now on
    pub fn subscribe_changes(&self) -> Result<broadcast::Receiver<ChangeBatch>> {
        self.shared
            .channels
            .read()
            .as_ref()
            .map(|c| c.changes.subscribe())
            .ok_or_else(|| self.shared.disposed_error())
    }

    /// Receive every error reported from now on
    pub fn subscribe_errors(&self) -> Result<broadcast::Receiver<ErrorEvent>> {
        self.shared
            .channels
            .read()
            .as_ref()
            .map(|c| c.errors.subscribe())
            .ok_or_else(|| self.shared.disposed_error())
    }

    /// Emit `events` as one batch; a no-op once disposed
    pub fn notify(&self, events: Vec<ChangeEvent>) {
        self.shared.notify(events);
    }

    /// Report an error to error-stream listeners
    pub fn report_error(&self, error: impl Error + Send + Sync + 'static, metadata: ErrorMetadata) {
        let mut event = ErrorEvent::new(error);
        event.metadata = metadata;
        if self.shared.config.capture_backtraces {
            event.backtrace = Some(Arc::new(Backtrace::capture()));
        }
        self.report(event);
    }

    /// Emit a prepared error event
    pub fn report(&self, event: ErrorEvent) {
        let sender = self.shared.channels.read().as_ref().map(|c| c.errors.clone());
        match sender {
            Some(sender) => {
                tracing::debug!(view_model = %self.name(), error = %event.error, "reporting error");
                // No receivers is fine; errors are advisory
                let _ = sender.send(event);
            }
            None => tracing::debug!(
                view_model = %self.name(),
                error = %event.error,
                "error reported after dispose ignored"
            ),
        }
    }

    // =========================================================================
    // BATCHING
    // =========================================================================

    /// Apply several writes and emit their events as one batch
    ///
    /// Every target is checked before any write is applied, so a failure
    /// leaves all properties untouched. Each write contributes one event, in
    /// the order given.
    pub fn set_multiple(&self, writes: Vec<PropertyWrite>) -> Result<()> {
        for write in &writes {
            self.check_owned(write.target.as_ref())?;
        }

        let events: SmallVec<[ChangeEvent; 4]> = writes.into_iter().map(|w| (w.apply)()).collect();
        self.shared.notify(events.into_vec());
        Ok(())
    }

    /// Restore every bound property to its original value in one batch
    pub fn reset_all(&self) -> Result<()> {
        let writes: Vec<PropertyWrite> = self
            .shared
            .registry
            .read()
            .values()
            .map(|cell| cell.clone().restore_write())
            .collect();
        self.set_multiple(writes)
    }

    fn check_owned(&self, cell: &dyn ErasedCell) -> Result<()> {
        match cell.binding() {
            None => Err(TetherError::PropertyNotBound {
                name: cell.display_name(),
                type_name: cell.value_type_name(),
            }),
            Some(binding) if !std::ptr::eq(binding.owner.as_ptr(), Arc::as_ptr(&self.shared)) => {
                Err(TetherError::ForeignProperty {
                    name: cell.display_name(),
                })
            }
            Some(_) => Ok(()),
        }
    }

    // =========================================================================
    // BUSY STATE
    // =========================================================================

    /// Mark a task (or the view model itself, when `task_key` is `None`) busy or idle
    ///
    /// The view model is busy while any task key is active or an unkeyed busy
    /// flag is set. A busy event is emitted when the aggregate state changes
    /// or a task key is supplied.
    pub fn set_busy_status(&self, is_busy: bool, task_key: Option<TaskKey>) {
        let (was_busy, now_busy) = {
            let mut busy = self.shared.busy.lock();
            let was_busy = busy.is_busy();
            match &task_key {
                Some(key) if is_busy => {
                    busy.active.insert(key.clone());
                }
                Some(key) => {
                    busy.active.remove(key);
                }
                None => busy.explicit = is_busy,
            }
            (was_busy, busy.is_busy())
        };

        if was_busy == now_busy && task_key.is_none() {
            return;
        }

        let description = match (&task_key, is_busy) {
            (Some(key), true) => format!("task `{}` started", key),
            (Some(key), false) => format!("task `{}` finished", key),
            (None, true) => "busy".to_string(),
            (None, false) => "idle".to_string(),
        };
        tracing::debug!(
            view_model = %self.name(),
            was_busy,
            now_busy,
            task = task_key.as_ref().map(TaskKey::as_str),
            "busy status changed"
        );

        let event = ChangeEvent::from_values(
            ChangeKind::Busy,
            Some(EventValue::new(was_busy)),
            Some(EventValue::new(now_busy)),
        )
        .with_property_name(BUSY_PROPERTY_NAME)
        .with_description(description);
        self.shared.notify(vec![event]);
    }

    pub fn is_busy(&self) -> bool {
        self.shared.busy.lock().is_busy()
    }

    pub fn is_task_in_progress(&self, task_key: &TaskKey) -> bool {
        self.shared.busy.lock().active.contains(task_key)
    }

    /// Currently active task keys, in no particular order
    pub fn active_tasks(&self) -> Vec<TaskKey> {
        self.shared.busy.lock().active.iter().cloned().collect()
    }

    /// Run `work` with the view model marked busy
    ///
    /// Busy status is cleared when `work` finishes, whether it returns, fails,
    /// or the returned future is dropped. Its output is returned unchanged.
    pub async fn do_async<F, Fut, R>(&self, task_key: Option<TaskKey>, work: F) -> R
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        self.set_busy_status(true, task_key.clone());
        let _guard = BusyGuard {
            view_model: self,
            task_key,
        };
        work().await
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Hand a cleanup to the view model; it runs on dispose
    ///
    /// Subscriptions added after dispose are cancelled immediately.
    pub fn add_subscription(&self, subscription: impl Into<Subscription>) {
        let subscription = subscription.into();
        if self.is_disposed() {
            subscription.cancel();
            return;
        }
        self.shared.subscriptions.lock().push(subscription);
    }

    /// Cancel owned subscriptions, then close both streams
    pub fn dispose(&self) {
        let subscriptions = std::mem::take(&mut *self.shared.subscriptions.lock());
        let cancelled = subscriptions.len();
        for subscription in subscriptions {
            subscription.cancel();
        }

        if self.shared.channels.write().take().is_some() {
            tracing::debug!(view_model = %self.name(), cancelled, "view model disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.channels.read().is_none()
    }
}

impl Default for ViewModel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewModel")
            .field("name", &self.name())
            .field("properties", &self.property_count())
            .field("is_busy", &self.is_busy())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    fn busy_events(rx: &mut broadcast::Receiver<ChangeBatch>) -> Vec<(bool, bool)> {
        let mut out = Vec::new();
        while let Ok(batch) = rx.try_recv() {
            for event in batch.iter() {
                assert_eq!(event.kind(), ChangeKind::Busy);
                out.push((*event.previous::<bool>().unwrap(), *event.next::<bool>().unwrap()));
            }
        }
        out
    }

    #[test]
    fn test_bind_rejects_second_view_model() {
        let a = ViewModel::new();
        let b = ViewModel::new();
        let count = Property::named("count", 0i64);

        let id = a.bind(&count).unwrap();
        assert_eq!(count.id(), Some(id));
        assert_eq!(
            b.bind(&count),
            Err(TetherError::PropertyAlreadyBound {
                name: "count".into()
            })
        );
        assert_eq!(b.property_count(), 0);
    }

    #[test]
    fn test_bind_properties_mixed_types() {
        let vm = ViewModel::new();
        let name = Property::named("name", String::new());
        let age = Property::named("age", 0i64);
        vm.bind_properties(&[&name, &age]).unwrap();
        assert_eq!(vm.property_names(), vec!["name", "age"]);
        assert_eq!(vm.property_name(age.id().unwrap()).as_deref(), Some("age"));
    }

    #[test]
    fn test_set_multiple_rejects_foreign_property_before_writing() {
        let a = ViewModel::new();
        let b = ViewModel::new();
        let mine = a.property("mine", 1i64);
        let theirs = b.property("theirs", 1i64);

        let err = a
            .set_multiple(vec![mine.write(2), theirs.write(2)])
            .unwrap_err();
        assert_eq!(err, TetherError::ForeignProperty { name: "theirs".into() });
        assert_eq!(mine.value(), 1);
        assert_eq!(theirs.value(), 1);
    }

    #[test]
    fn test_reset_all_emits_one_batch() {
        let vm = ViewModel::new();
        let count = vm.property("count", 1i64);
        let label = vm.property("label", "a".to_string());
        count.set(2).unwrap();
        label.set("b".into()).unwrap();
        assert!(vm.has_changes());

        let mut rx = vm.subscribe_changes().unwrap();
        vm.reset_all().unwrap();

        let batch = rx.try_recv().unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|e| e.kind() == ChangeKind::Reset));
        assert_eq!(batch[0].next::<i64>(), Some(&1));
        assert_eq!(batch[1].next::<String>().map(String::as_str), Some("a"));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert!(!vm.has_changes());
    }

    #[test]
    fn test_busy_aggregates_over_task_keys() {
        let vm = ViewModel::new();
        let mut rx = vm.subscribe_changes().unwrap();
        let a = TaskKey::from("load");
        let b = TaskKey::from("save");

        vm.set_busy_status(true, Some(a.clone()));
        vm.set_busy_status(true, Some(b.clone()));
        vm.set_busy_status(true, Some(b.clone()));
        assert_eq!(vm.active_tasks().len(), 2);

        vm.set_busy_status(false, Some(a.clone()));
        assert!(vm.is_busy());
        assert!(!vm.is_task_in_progress(&a));
        assert!(vm.is_task_in_progress(&b));

        vm.set_busy_status(false, Some(b));
        assert!(!vm.is_busy());

        // Every keyed call emits, the aggregate only flips twice
        let events = busy_events(&mut rx);
        assert_eq!(events.len(), 5);
        assert_eq!(events.first(), Some(&(false, true)));
        assert_eq!(events.last(), Some(&(true, false)));
    }

    #[test]
    fn test_unkeyed_busy_flag() {
        let vm = ViewModel::new();
        let mut rx = vm.subscribe_changes().unwrap();

        vm.set_busy_status(false, None);
        assert!(busy_events(&mut rx).is_empty());

        vm.set_busy_status(true, None);
        vm.set_busy_status(true, Some("job".into()));
        vm.set_busy_status(false, Some("job".into()));
        assert!(vm.is_busy());

        vm.set_busy_status(false, None);
        assert!(!vm.is_busy());
        assert_eq!(busy_events(&mut rx).len(), 4);
    }

    #[tokio::test]
    async fn test_do_async_clears_busy_on_success_and_error() {
        let vm = ViewModel::new();

        let probe = vm.clone();
        let value = vm
            .do_async(Some("fetch".into()), || async move {
                assert!(probe.is_busy());
                assert!(probe.is_task_in_progress(&"fetch".into()));
                42
            })
            .await;
        assert_eq!(value, 42);
        assert!(!vm.is_busy());

        let result: std::result::Result<(), String> = vm
            .do_async(None, || async { Err("boom".to_string()) })
            .await;
        assert_eq!(result, Err("boom".to_string()));
        assert!(!vm.is_busy());
    }

    #[tokio::test]
    async fn test_do_async_clears_busy_when_dropped() {
        let vm = ViewModel::new();
        let pending = vm.do_async(Some("slow".into()), || std::future::pending::<()>());
        let mut pending = Box::pin(pending);
        // Poll once so busy is set, then drop
        tokio::select! {
            biased;
            _ = &mut pending => unreachable!(),
            _ = async {} => {}
        }
        assert!(vm.is_busy());
        drop(pending);
        assert!(!vm.is_busy());
    }

    #[test]
    fn test_attach_rejects_second_owner() {
        let vm = ViewModel::with_config(ViewModelConfig::standard().named("profile"));
        vm.attach("profile_page").unwrap();
        vm.attach("profile_page").unwrap();
        let err = vm.attach("settings_page").unwrap_err();
        assert_eq!(
            err,
            TetherError::ViewModelAlreadyAttached {
                view_model: "profile".into(),
                owner: "profile_page".into(),
                requested: "settings_page".into(),
            }
        );
        assert_eq!(vm.owner(), Some("profile_page"));
    }

    #[tokio::test]
    async fn test_dispose_cancels_subscriptions_and_closes_streams() {
        let vm = ViewModel::new();
        let count = vm.property("count", 0i64);
        let mut changes = vm.subscribe_changes().unwrap();
        let mut errors = vm.subscribe_errors().unwrap();

        let cancelled = Arc::new(AtomicUsize::new(0));
        let flag = cancelled.clone();
        vm.add_subscription(Subscription::new(move || {
            flag.fetch_add(1, Ordering::SeqCst);
        }));

        vm.dispose();
        assert!(vm.is_disposed());
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
        assert!(matches!(changes.recv().await, Err(RecvError::Closed)));
        assert!(matches!(errors.recv().await, Err(RecvError::Closed)));

        // Writes still land, notifications are dropped
        count.set(3).unwrap();
        assert_eq!(count.value(), 3);
        assert!(matches!(
            vm.subscribe_changes(),
            Err(TetherError::Disposed { .. })
        ));

        let flag = cancelled.clone();
        vm.add_subscription(Subscription::new(move || {
            flag.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(cancelled.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dispose_aborts_listener_task() {
        let vm = ViewModel::new();
        let mut changes = vm.subscribe_changes().unwrap();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let handle = tokio::spawn(async move {
            while let Ok(batch) = changes.recv().await {
                counter.fetch_add(batch.len(), Ordering::SeqCst);
            }
        });
        let abort = handle.abort_handle();
        vm.add_subscription(abort);
        vm.dispose();

        match handle.await {
            Ok(()) => {}
            Err(err) => assert!(err.is_cancelled()),
        }
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispose_aborts_owned_join_handle() {
        let vm = ViewModel::new();
        let (alive, gone) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _alive = alive;
            std::future::pending::<String>().await
        });
        vm.add_subscription(handle);
        vm.dispose();

        // The sender is dropped with the aborted task
        assert!(gone.await.is_err());
    }

    #[test]
    fn test_report_error_reaches_listeners() {
        let vm = ViewModel::with_config(ViewModelConfig::minimal());
        let mut errors = vm.subscribe_errors().unwrap();
        let mut metadata = ErrorMetadata::default();
        metadata.insert("operation".into(), "load".into());

        vm.report_error(
            TetherError::MissingKey {
                name: "prices".into(),
                key: "\"eur\"".into(),
            },
            metadata,
        );

        let event = errors.try_recv().unwrap();
        assert!(event.backtrace.is_none());
        assert_eq!(event.metadata["operation"], "load");
        assert!(event.error.to_string().contains("prices"));
    }

    #[test]
    fn test_property_outlives_view_model() {
        let count = {
            let vm = ViewModel::new();
            vm.property("count", 0i64)
        };
        // Owner is gone; the write still succeeds without a listener
        assert_eq!(count.set(1).unwrap(), 1);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut config = ViewModelConfig::standard();
        config.change_capacity = 0;
        config.error_capacity = 0;
        let vm = ViewModel::with_config(config);
        let count = vm.property("count", 0i64);
        let mut rx = vm.subscribe_changes().unwrap();
        count.set(1).unwrap();
        assert_eq!(rx.try_recv().unwrap().len(), 1);
    }
}
