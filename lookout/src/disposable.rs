use std::{
    fmt, mem,
    sync::{Arc, Weak},
};

use parking_lot::Mutex;

use crate::observer::Liveness;

/// Removal of one registration from its container, with the value type erased.
pub(crate) trait Unregister: Send + Sync {
    /// Returns `true` if a live registration was removed.
    fn unregister(&self) -> bool;
}

/// A handle controlling one observer's removal and lifetime.
///
/// Returned by the `subscribe` family of methods on
/// [`Container`](crate::Container). Until it is bound to something with
/// [`bind_to`][Self::bind_to] or [`bind_to_handle`][Self::bind_to_handle], the
/// observer stays registered until [`dispose`][Self::dispose] is called or the
/// container is dropped; dropping the handle itself does nothing.
///
/// Clones control the same registration.
#[derive(Clone)]
pub struct Disposable {
    liveness: Arc<Liveness>,
    registration: Arc<dyn Unregister>,
}

impl Disposable {
    pub(crate) fn new(liveness: Arc<Liveness>, registration: Arc<dyn Unregister>) -> Self {
        Self { liveness, registration }
    }

    /// Remove the observer from its container.
    ///
    /// No notification is delivered to the observer once this returns, except
    /// for ones already handed to another execution context.
    ///
    /// Returns `true` if this call removed a live registration, and `false` if
    /// it had already been removed, by an earlier call, by pruning after its
    /// owner went away, or by [`remove_all_observers`] on the container.
    ///
    /// [`remove_all_observers`]: crate::Container::remove_all_observers
    pub fn dispose(&self) -> bool {
        let removed = self.registration.unregister();

        #[cfg(feature = "tracing")]
        tracing::trace!(observer = %self.liveness.id(), removed, "Disposed observer");

        removed
    }

    /// Alias for [`dispose`][Self::dispose].
    pub fn stop(&self) -> bool {
        self.dispose()
    }

    /// Whether the observer is no longer registered with its container.
    ///
    /// An observer whose owner was dropped is only reported as disposed once
    /// the container has pruned it, which happens on its next update.
    pub fn is_disposed(&self) -> bool {
        self.liveness.is_removed()
    }

    /// Tie the observer's lifetime to `target`.
    ///
    /// - `&Arc<O>`: the observer is pruned once the owner has been dropped.
    ///   Only a [`Weak`] reference to the owner is kept.
    /// - `&DisposeBag`: the handle is added to the bag, and the observer is
    ///   disposed together with the bag.
    /// - `&mut` any [`Extend<Disposable>`] collection: the handle is stored in
    ///   the collection and the observer stays live regardless of what
    ///   happens to the collection afterwards.
    ///
    /// Only the most recent binding determines liveness. Storing the handle in
    /// a bag or collection is additive though: an earlier bag will still
    /// dispose the observer when it is torn down.
    pub fn bind_to<T: BindTarget>(self, target: T) -> Self {
        target.bind(&self);
        self
    }

    /// Keep the observer live for as long as this handle or any of its clones
    /// is alive.
    pub fn bind_to_handle(self) -> Self {
        let handle = Arc::downgrade(&self.registration);
        self.liveness.set(move || handle.strong_count() > 0);
        self
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("observer", &self.liveness.id())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Something a [`Disposable`] can be bound to, see [`Disposable::bind_to`].
pub trait BindTarget {
    /// Install the binding.
    fn bind(self, disposable: &Disposable);
}

impl<O> BindTarget for &Arc<O>
where
    O: ?Sized + Send + Sync + 'static,
{
    fn bind(self, disposable: &Disposable) {
        let owner: Weak<O> = Arc::downgrade(self);
        disposable.liveness.set(move || owner.strong_count() > 0);
    }
}

impl BindTarget for &DisposeBag {
    fn bind(self, disposable: &Disposable) {
        let bag = Arc::downgrade(&self.alive);
        disposable.liveness.set(move || bag.strong_count() > 0);
        self.add(disposable.clone());
    }
}

impl<C> BindTarget for &mut C
where
    C: Extend<Disposable>,
{
    fn bind(self, disposable: &Disposable) {
        disposable.liveness.set_always();
        self.extend([disposable.clone()]);
    }
}

/// A set of [`Disposable`]s that are disposed together.
///
/// The bag disposes everything it holds when [`dispose_all`] is called and
/// when it is dropped.
///
/// [`dispose_all`]: Self::dispose_all
#[derive(Default)]
pub struct DisposeBag {
    disposables: Mutex<Vec<Disposable>>,
    /// Observers bound to the bag hold a `Weak` to this.
    alive: Arc<()>,
}

impl DisposeBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handle to the bag without changing its liveness binding.
    ///
    /// Use [`Disposable::bind_to`] to also make the observer's liveness follow
    /// the bag.
    pub fn add(&self, disposable: Disposable) {
        self.disposables.lock().push(disposable);
    }

    /// Dispose every handle in the bag and empty it.
    ///
    /// Returns the number of live registrations that were removed.
    pub fn dispose_all(&self) -> usize {
        let disposables = mem::take(&mut *self.disposables.lock());
        let removed = disposables.iter().filter(|disposable| disposable.dispose()).count();

        #[cfg(feature = "tracing")]
        tracing::debug!(held = disposables.len(), removed, "Disposed bag");

        removed
    }

    /// Number of handles currently held.
    pub fn len(&self) -> usize {
        self.disposables.lock().len()
    }

    /// Whether the bag holds no handles.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for DisposeBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposeBag").field("disposables", &*self.disposables.lock()).finish()
    }
}

impl Drop for DisposeBag {
    fn drop(&mut self) {
        self.dispose_all();
    }
}
