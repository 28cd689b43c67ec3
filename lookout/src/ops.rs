//! Combinators producing derived containers.

use std::{any::Any, sync::Arc};

use crate::{
    context::{ExecutionContext, Immediate},
    Container, ObservedChange,
};

/// Types that may or may not hold a value, see [`Container::drop_nil`].
pub trait OptionLike {
    /// The type of the held value.
    type Wrapped;

    /// Convert into an `Option`.
    fn into_option(self) -> Option<Self::Wrapped>;
}

impl<T> OptionLike for Option<T> {
    type Wrapped = T;

    fn into_option(self) -> Option<T> {
        self
    }
}

/// Derived containers.
///
/// Every combinator returns a new container that is fed by exactly one
/// subscription to `self`. The derived container keeps `self` alive, but the
/// subscription only holds a weak reference to the derived container: once
/// all handles to the derived container are dropped, it stops receiving
/// values and the subscription is removed from `self` on its next update.
/// Keep the last container of a chain around for as long as you observe it.
///
/// A derived container does not notify its observers of the value it was
/// created with; use [`subscribe_immediate`][Container::subscribe_immediate]
/// on it to receive that value.
impl<V> Container<V>
where
    V: Clone + Send + 'static,
{
    /// Get a container holding `transform` applied to this container's value.
    pub fn map<U, F>(&self, transform: F) -> Container<U>
    where
        U: Clone + Send + 'static,
        F: Fn(V) -> U + Send + Sync + 'static,
    {
        let _guard = self.shared.lock();
        let initial = transform(self.get());
        self.derive(initial, Arc::new(Immediate), move |derived, change| {
            derived.update(transform(change.new));
        })
    }

    /// Get a container that follows this one, except for the changes for which
    /// `predicate` returns `true`.
    pub fn drop_while<P>(&self, predicate: P) -> Container<V>
    where
        P: Fn(&ObservedChange<V>) -> bool + Send + Sync + 'static,
    {
        let _guard = self.shared.lock();
        self.derive(self.get(), Arc::new(Immediate), move |derived, change| {
            if !predicate(&change) {
                derived.update(change.new);
            }
        })
    }

    /// Get a container that follows this one, except for updates that set a
    /// value equal to the previous one.
    ///
    /// Repeated equal values are not forwarded at all, so observers of the
    /// returned container never see a change where `old == new`.
    pub fn dedupe_by_equality(&self) -> Container<V>
    where
        V: PartialEq,
    {
        self.drop_while(|change| change.old.as_ref() == Some(&change.new))
    }

    /// Get a container that follows this one, but notifies its observers on
    /// `context`.
    ///
    /// Values are forwarded directly when this container is updated from
    /// inside `context`, and scheduled on `context` otherwise. This container's
    /// own delivery is not affected.
    pub fn dispatch(&self, context: Arc<dyn ExecutionContext>) -> Container<V> {
        let _guard = self.shared.lock();
        let target = Arc::clone(&context);
        self.derive(self.get(), context, move |derived, change| {
            if target.is_current() {
                derived.update(change.new);
            } else {
                let derived = derived.clone();
                target.execute(Box::new(move || derived.update(change.new)));
            }
        })
    }

    /// Create a container with the given initial value and context and feed
    /// it through `forward` on every change of `self`.
    ///
    /// Callers reading `self` for the initial value hold the lock across this
    /// call so no update is missed in between.
    fn derive<U, F>(
        &self,
        initial: U,
        context: Arc<dyn ExecutionContext>,
        forward: F,
    ) -> Container<U>
    where
        U: Clone + Send + 'static,
        F: Fn(&Container<U>, ObservedChange<V>) + Send + Sync + 'static,
    {
        let upstream: Arc<dyn Any + Send + Sync> = self.shared.clone();
        let derived = Container::from_parts(initial, context, Some(upstream));
        let target = Arc::downgrade(&derived.shared);

        self.subscribe(move |change| {
            if let Some(shared) = target.upgrade() {
                forward(&Container { shared }, change);
            }
        })
        .bind_to(&derived.shared);

        derived
    }
}

impl<V> Container<V>
where
    V: OptionLike + Clone + Send + 'static,
    V::Wrapped: Clone + Send + 'static,
{
    /// Get a container of the inner type that only follows the values of this
    /// one that are not `None`.
    ///
    /// The returned container starts out with `initial`, whatever the current
    /// value of this one is.
    pub fn drop_nil(&self, initial: V::Wrapped) -> Container<V::Wrapped> {
        self.derive(initial, Arc::new(Immediate), |derived, change| {
            if let Some(value) = change.new.into_option() {
                derived.update(value);
            }
        })
    }
}
