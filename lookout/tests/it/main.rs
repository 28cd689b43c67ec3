#![allow(missing_docs)]

use std::sync::{Arc, Mutex};

use lookout::ObservedChange;

mod ops;
mod stream;

/// Records the changes delivered to its handlers.
struct Log<V>(Arc<Mutex<Vec<ObservedChange<V>>>>);

impl<V: Send + 'static> Log<V> {
    fn new() -> Self {
        Self(Arc::default())
    }

    fn handler(&self) -> impl Fn(ObservedChange<V>) + Send + Sync + 'static {
        let changes = Arc::clone(&self.0);
        move |change| changes.lock().unwrap().push(change)
    }

    fn take(&self) -> Vec<ObservedChange<V>> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

fn change<V>(old: V, new: V) -> ObservedChange<V> {
    ObservedChange::new(old, new)
}
