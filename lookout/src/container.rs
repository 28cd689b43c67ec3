use std::{
    any::Any,
    cell::RefCell,
    fmt,
    sync::{Arc, Weak},
};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::{
    context::{ExecutionContext, Immediate},
    disposable::{Disposable, Unregister},
    observer::{Notify, Observer, ObserverId},
    state::ContainerState,
    ObservedChange,
};

/// A value whose changes are pushed to registered observers.
///
/// `Container` is a cheap handle: clones share the same value and observers.
/// Every update, from any clone on any thread, is delivered to every live
/// observer, in the order the updates were made.
///
/// # Delivery
///
/// [`update`][Self::update] holds the container's reentrant lock for the whole
/// fan-out, so concurrent writers are serialized and no observer ever sees two
/// updates interleaved. Each notification goes through the container's
/// [`ExecutionContext`]: when the writer is already inside it, the observer is
/// called before `update` returns, otherwise the call is scheduled on the
/// context and `update` does not wait for it.
///
/// The list of observers is captured before the fan-out starts. Observers
/// added by a handler take part from the next update on; observers disposed by
/// a handler are skipped for the rest of the current fan-out.
///
/// # Re-entrancy
///
/// A handler called synchronously may update the same container again. That
/// nested update runs its complete fan-out before the outer one continues, so
/// observers after the handler in the outer fan-out see the nested change
/// first and the outer change after it.
pub struct Container<V> {
    pub(crate) shared: Arc<Shared<V>>,
}

pub(crate) struct Shared<V> {
    state: ReentrantMutex<RefCell<ContainerState<V>>>,
    context: Arc<dyn ExecutionContext>,
    /// The container this one was derived from, if any. Kept alive so chains
    /// of combinators keep working when only the last container is held.
    _upstream: Option<Arc<dyn Any + Send + Sync>>,
}

impl<V> Container<V>
where
    V: Clone + Send + 'static,
{
    /// Create a new `Container` with the given initial value that delivers
    /// notifications synchronously.
    pub fn new(value: V) -> Self {
        Self::with_context(value, Arc::new(Immediate))
    }

    /// Create a new `Container` with the given initial value that delivers
    /// notifications on `context`.
    pub fn with_context(value: V, context: Arc<dyn ExecutionContext>) -> Self {
        Self::from_parts(value, context, None)
    }

    pub(crate) fn from_parts(
        value: V,
        context: Arc<dyn ExecutionContext>,
        upstream: Option<Arc<dyn Any + Send + Sync>>,
    ) -> Self {
        let state = ReentrantMutex::new(RefCell::new(ContainerState::new(value)));
        Self { shared: Arc::new(Shared { state, context, _upstream: upstream }) }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> V {
        self.shared.lock().borrow().get().clone()
    }

    /// The context notifications are delivered on.
    pub fn context(&self) -> &Arc<dyn ExecutionContext> {
        &self.shared.context
    }

    /// Set the value and notify observers.
    ///
    /// Observers are notified even if `value` is equal to the current value.
    /// Use [`dedupe_by_equality`][Self::dedupe_by_equality] to get a container
    /// that skips those.
    ///
    /// Observers whose liveness binding no longer holds are removed first and
    /// not notified.
    pub fn update(&self, value: V) {
        let guard = self.shared.lock();

        let (change, observers, dead) = {
            let mut state = guard.borrow_mut();
            let old = state.replace(value.clone());
            let dead = state.sweep();
            (ObservedChange::new(old, value), state.snapshot(), dead)
        };
        drop(dead);

        #[cfg(feature = "tracing")]
        tracing::debug!(observers = observers.len(), "Notifying observers");

        for observer in observers {
            if observer.is_live() {
                self.shared.deliver(observer, change.clone());
            }
        }
    }

    /// Compute a new value from the current one and [`update`][Self::update]
    /// with it.
    ///
    /// No other writer can update the container between reading the current
    /// value and setting the new one.
    pub fn update_with(&self, f: impl FnOnce(&V) -> V) {
        let _guard = self.shared.lock();
        let value = f(&self.get());
        self.update(value);
    }

    /// Register an observer that is notified of every future update.
    ///
    /// The handler is not called for the current value, see
    /// [`subscribe_immediate`][Self::subscribe_immediate] for that.
    pub fn subscribe(
        &self,
        handler: impl Fn(ObservedChange<V>) + Send + Sync + 'static,
    ) -> Disposable {
        self.register(Box::new(handler)).0
    }

    /// Register an observer and deliver the current value to it right away.
    ///
    /// The first change the handler receives has no `old` value. Like every
    /// other notification it goes through the container's context, so it has
    /// already happened when this returns only if the caller is inside that
    /// context.
    pub fn subscribe_immediate(
        &self,
        handler: impl Fn(ObservedChange<V>) + Send + Sync + 'static,
    ) -> Disposable {
        let _guard = self.shared.lock();
        let (disposable, observer) = self.register(Box::new(handler));
        self.shared.deliver(observer, ObservedChange::initial(self.get()));
        disposable
    }

    /// Register an observer that lives only as long as `owner`.
    ///
    /// The handler gets the owner passed in. No strong reference to the owner
    /// is kept, so the owner may hold the container (or the handle) itself
    /// without creating a cycle. Once the owner is dropped the handler is not
    /// called anymore, and the observer is removed on the next update.
    pub fn subscribe_for<O>(
        &self,
        owner: &Arc<O>,
        handler: impl Fn(&O, ObservedChange<V>) + Send + Sync + 'static,
    ) -> Disposable
    where
        O: ?Sized + Send + Sync + 'static,
    {
        let weak_owner = Arc::downgrade(owner);
        self.subscribe(move |change| {
            if let Some(owner) = weak_owner.upgrade() {
                handler(&*owner, change);
            }
        })
        .bind_to(owner)
    }

    /// Remove all observers.
    ///
    /// Notifications already scheduled on another context still run.
    pub fn remove_all_observers(&self) {
        let guard = self.shared.lock();
        let removed = guard.borrow_mut().clear();

        #[cfg(feature = "tracing")]
        tracing::debug!(removed = removed.len(), "Removed all observers");

        drop(removed);
    }

    /// Number of registered observers.
    ///
    /// Observers whose owner is gone are still counted until the next update
    /// prunes them.
    pub fn observer_count(&self) -> usize {
        self.shared.lock().borrow().len()
    }

    fn register(&self, notify: Box<Notify<V>>) -> (Disposable, Arc<Observer<V>>) {
        let guard = self.shared.lock();
        let (key, observer) = guard.borrow_mut().insert(notify);

        #[cfg(feature = "tracing")]
        tracing::trace!(observer = %observer.id(), "Registered observer");

        let registration =
            Arc::new(Registration { shared: Arc::downgrade(&self.shared), key, id: observer.id() });
        (Disposable::new(Arc::clone(observer.liveness()), registration), observer)
    }
}

impl<V> Shared<V> {
    /// Lock out writers on other threads.
    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, RefCell<ContainerState<V>>> {
        self.state.lock()
    }
}

impl<V> Shared<V>
where
    V: Send + 'static,
{
    fn deliver(&self, observer: Arc<Observer<V>>, change: ObservedChange<V>) {
        if self.context.is_current() {
            observer.notify(change);
        } else {
            self.context.execute(Box::new(move || observer.notify(change)));
        }
    }

    fn remove(&self, key: usize, id: ObserverId) -> bool {
        let guard = self.lock();
        // Bound to a variable so the observer is dropped after the borrow
        // ends; its handler may own a `DisposeBag` that points back here.
        let removed = guard.borrow_mut().remove(key, id);
        removed.is_some()
    }
}

struct Registration<V> {
    shared: Weak<Shared<V>>,
    key: usize,
    id: ObserverId,
}

impl<V> Unregister for Registration<V>
where
    V: Send + 'static,
{
    fn unregister(&self) -> bool {
        self.shared.upgrade().is_some_and(|shared| shared.remove(self.key, self.id))
    }
}

impl<V> Clone for Container<V> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<V> Default for Container<V>
where
    V: Clone + Default + Send + 'static,
{
    fn default() -> Self {
        Self::new(V::default())
    }
}

impl<V: fmt::Debug> fmt::Debug for Container<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.shared.lock();
        let state = guard.borrow();
        f.debug_struct("Container")
            .field("value", state.get())
            .field("observers", &state.len())
            .finish_non_exhaustive()
    }
}
