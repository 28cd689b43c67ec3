//! Observable single values with lifetime-bound listeners.
//!
//! This crate implements the push flavor of the [Observer pattern][]: a
//! [`Container<V>`] holds a value and calls every registered observer with an
//! [`ObservedChange`] whenever the value is updated. Subscribing returns a
//! [`Disposable`], which removes the observer on request or ties it to the
//! lifetime of an owner, a [`DisposeBag`] or the handle itself. Observers whose
//! owner is gone are pruned lazily, on the container's next update.
//!
//! Containers can be derived from other containers with [`map`],
//! [`drop_while`], [`dedupe_by_equality`], [`drop_nil`] and [`dispatch`], the
//! last of which moves delivery to another [`ExecutionContext`].
//!
//! Here is a quick walk-through:
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use lookout::{Container, DisposeBag};
//!
//! let celsius = Container::new(20);
//! let fahrenheit = celsius.map(|c| c * 9 / 5 + 32);
//! assert_eq!(fahrenheit.get(), 68);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let bag = DisposeBag::new();
//! fahrenheit
//!     .subscribe({
//!         let seen = seen.clone();
//!         move |change| seen.lock().unwrap().push((change.old, change.new))
//!     })
//!     .bind_to(&bag);
//!
//! celsius.update(100);
//! assert_eq!(*seen.lock().unwrap(), [(Some(68), 212)]);
//!
//! // Once the bag is gone, so is the observer.
//! drop(bag);
//! celsius.update(0);
//! assert_eq!(seen.lock().unwrap().len(), 1);
//! assert_eq!(fahrenheit.get(), 32);
//! ```
//!
//! Cargo features:
//!
//! - `tracing` (enabled by default): Emit [tracing] events when observers are
//!   registered, notified and removed
//!
//! [Observer pattern]: https://en.wikipedia.org/wiki/Observer_pattern
//! [`map`]: Container::map
//! [`drop_while`]: Container::drop_while
//! [`dedupe_by_equality`]: Container::dedupe_by_equality
//! [`drop_nil`]: Container::drop_nil
//! [`dispatch`]: Container::dispatch
#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms, unreachable_pub)]

mod change;
mod container;
pub mod context;
mod disposable;
mod observer;
mod ops;
mod state;
mod stream;

pub use self::{
    change::ObservedChange,
    container::Container,
    context::{ExecutionContext, Immediate, SerialQueue},
    disposable::{BindTarget, DisposeBag, Disposable},
    ops::OptionLike,
    stream::Changes,
};
