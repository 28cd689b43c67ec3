use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures_core::Stream;
use tokio::sync::mpsc;

use crate::{Container, Disposable, ObservedChange};

/// A stream of the changes of a [`Container`].
///
/// Created through [`Container::changes`]. Dropping the stream disposes the
/// underlying subscription. The stream ends once the container and all of its
/// clones have been dropped and every change made before that was received.
#[derive(Debug)]
pub struct Changes<V> {
    receiver: mpsc::UnboundedReceiver<ObservedChange<V>>,
    disposable: Disposable,
}

impl<V> Changes<V> {
    /// Wait for the next change.
    ///
    /// This method is a convenience so you don't have to import a `Stream`
    /// extension trait such as `futures::StreamExt` or
    /// `tokio_stream::StreamExt`.
    pub async fn next(&mut self) -> Option<ObservedChange<V>> {
        self.receiver.recv().await
    }

    /// The handle of the underlying subscription.
    pub fn disposable(&self) -> &Disposable {
        &self.disposable
    }
}

impl<V> Container<V>
where
    V: Clone + Send + 'static,
{
    /// Get a stream of all future changes.
    ///
    /// Changes are buffered without limit until the stream is polled, none
    /// are skipped.
    pub fn changes(&self) -> Changes<V> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let disposable = self.subscribe(move |change| {
            // Only fails for notifications still queued when the stream was dropped.
            let _ = sender.send(change);
        });

        Changes { receiver, disposable }
    }
}

impl<V> Stream for Changes<V> {
    type Item = ObservedChange<V>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl<V> Drop for Changes<V> {
    fn drop(&mut self) {
        self.disposable.dispose();
    }
}
