use std::{mem, sync::Arc};

use slab::Slab;

use crate::observer::{Notify, Observer, ObserverId};

#[derive(Debug)]
pub(crate) struct ContainerState<V> {
    /// The wrapped value.
    value: V,

    /// Registered observers.
    ///
    /// Slab keys are reused after removal, so every lookup by key is checked
    /// against the observer's id as well.
    observers: Slab<Arc<Observer<V>>>,

    /// Id for the next registration.
    next_id: ObserverId,
}

impl<V> ContainerState<V> {
    pub(crate) fn new(value: V) -> Self {
        Self { value, observers: Slab::new(), next_id: ObserverId::FIRST }
    }

    /// Get a reference to the inner value.
    pub(crate) fn get(&self) -> &V {
        &self.value
    }

    /// Number of registered observers, including dead ones that have not been
    /// swept yet.
    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn insert(&mut self, notify: Box<Notify<V>>) -> (usize, Arc<Observer<V>>) {
        let id = self.next_id;
        self.next_id = id.next();

        let observer = Arc::new(Observer::new(id, notify));
        let key = self.observers.insert(Arc::clone(&observer));
        (key, observer)
    }

    /// Remove the observer stored under `key` if it is still the one with the
    /// given `id`.
    ///
    /// The removed observer is returned so the caller can drop it after
    /// releasing its borrow of the state.
    pub(crate) fn remove(&mut self, key: usize, id: ObserverId) -> Option<Arc<Observer<V>>> {
        if !self.observers.get(key).is_some_and(|observer| observer.id() == id) {
            return None;
        }

        let observer = self.observers.remove(key);
        observer.mark_removed();
        Some(observer)
    }

    /// Remove all observers.
    pub(crate) fn clear(&mut self) -> Vec<Arc<Observer<V>>> {
        mem::take(&mut self.observers)
            .into_iter()
            .map(|(_, observer)| {
                observer.mark_removed();
                observer
            })
            .collect()
    }

    /// Set the inner value and return the previous one.
    pub(crate) fn replace(&mut self, value: V) -> V {
        mem::replace(&mut self.value, value)
    }

    /// Remove every observer whose liveness predicate no longer holds.
    pub(crate) fn sweep(&mut self) -> Vec<Arc<Observer<V>>> {
        let mut dead = Vec::new();
        self.observers.retain(|_, observer| {
            if observer.is_live() {
                return true;
            }

            observer.mark_removed();
            dead.push(Arc::clone(observer));
            false
        });

        #[cfg(feature = "tracing")]
        {
            if !dead.is_empty() {
                tracing::trace!(pruned = dead.len(), "Pruned dead observers");
            }
        }

        dead
    }

    /// The currently registered observers, in slot order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<Observer<V>>> {
        self.observers.iter().map(|(_, observer)| Arc::clone(observer)).collect()
    }
}

impl<V> Drop for ContainerState<V> {
    fn drop(&mut self) {
        for (_, observer) in &self.observers {
            observer.mark_removed();
        }
    }
}
