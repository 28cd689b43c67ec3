/// A snapshot of one transition of a [`Container`](crate::Container)'s value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservedChange<V> {
    /// The value before the update.
    ///
    /// This is `None` only for the synthetic delivery performed by
    /// [`Container::subscribe_immediate`](crate::Container::subscribe_immediate).
    pub old: Option<V>,
    /// The value after the update.
    pub new: V,
}

impl<V> ObservedChange<V> {
    /// Create a change from `old` to `new`.
    pub fn new(old: V, new: V) -> Self {
        Self { old: Some(old), new }
    }

    /// Create the synthetic change delivered when subscribing, which has no
    /// previous value.
    pub fn initial(new: V) -> Self {
        Self { old: None, new }
    }

    /// Whether this is the synthetic change delivered when subscribing.
    pub fn is_initial(&self) -> bool {
        self.old.is_none()
    }
}
