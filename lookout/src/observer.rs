use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

use crate::ObservedChange;

pub(crate) type Notify<V> = dyn Fn(ObservedChange<V>) + Send + Sync;
type Predicate = dyn Fn() -> bool + Send + Sync;

/// Identity of one registration, unique per container.
///
/// Ids are handed out in increasing order and never reused, unlike the slab
/// keys they are stored under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct ObserverId(u64);

impl ObserverId {
    pub(crate) const FIRST: Self = Self(1);

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The liveness half of a registration.
///
/// Shared between the observer record inside the container and every
/// [`Disposable`](crate::Disposable) handle for it, so a handle can rebind the
/// predicate and query removal without knowing the value type.
pub(crate) struct Liveness {
    id: ObserverId,
    predicate: Mutex<Arc<Predicate>>,
    removed: AtomicBool,
}

impl Liveness {
    fn new(id: ObserverId) -> Self {
        let always: Arc<Predicate> = Arc::new(|| true);
        Self { id, predicate: Mutex::new(always), removed: AtomicBool::new(false) }
    }

    pub(crate) fn id(&self) -> ObserverId {
        self.id
    }

    /// Replace the predicate. The last binding wins.
    pub(crate) fn set(&self, predicate: impl Fn() -> bool + Send + Sync + 'static) {
        *self.predicate.lock() = Arc::new(predicate);
    }

    pub(crate) fn set_always(&self) {
        self.set(|| true);
    }

    /// Whether the observer is still registered and its predicate holds.
    pub(crate) fn check(&self) -> bool {
        if self.is_removed() {
            return false;
        }

        // Run the predicate without holding the lock.
        let predicate = Arc::clone(&self.predicate.lock());
        predicate()
    }

    pub(crate) fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// Returns `true` if this call flipped the flag.
    pub(crate) fn mark_removed(&self) -> bool {
        !self.removed.swap(true, Ordering::AcqRel)
    }
}

impl fmt::Debug for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Liveness")
            .field("id", &self.id)
            .field("removed", &self.is_removed())
            .finish_non_exhaustive()
    }
}

/// A registered listener of a container.
pub(crate) struct Observer<V> {
    liveness: Arc<Liveness>,
    notify: Box<Notify<V>>,
}

impl<V> Observer<V> {
    pub(crate) fn new(id: ObserverId, notify: Box<Notify<V>>) -> Self {
        Self { liveness: Arc::new(Liveness::new(id)), notify }
    }

    pub(crate) fn id(&self) -> ObserverId {
        self.liveness.id()
    }

    pub(crate) fn liveness(&self) -> &Arc<Liveness> {
        &self.liveness
    }

    pub(crate) fn is_live(&self) -> bool {
        self.liveness.check()
    }

    pub(crate) fn mark_removed(&self) -> bool {
        self.liveness.mark_removed()
    }

    pub(crate) fn notify(&self, change: ObservedChange<V>) {
        (self.notify)(change);
    }
}

impl<V> fmt::Debug for Observer<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer").field("liveness", &self.liveness).finish_non_exhaustive()
    }
}
