use futures_util::StreamExt;
use lookout::Container;
use stream_assert::{assert_closed, assert_next_eq, assert_pending};

use crate::change;

#[test]
fn changes_in_order() {
    let ob = Container::new(0);
    let mut changes = ob.changes();
    assert_pending!(changes);

    ob.update(1);
    ob.update(2);
    assert_next_eq!(changes, change(0, 1));
    assert_next_eq!(changes, change(1, 2));
    assert_pending!(changes);
}

#[test]
fn dropping_stream_disposes() {
    let ob = Container::new(0);
    let changes = ob.changes();
    let disposable = changes.disposable().clone();
    assert_eq!(ob.observer_count(), 1);

    drop(changes);
    assert!(disposable.is_disposed());
    assert_eq!(ob.observer_count(), 0);
}

#[test]
fn closes_after_container_is_dropped() {
    let ob = Container::new("a");
    let mut changes = ob.changes();

    ob.update("b");
    drop(ob);

    assert_next_eq!(changes, change("a", "b"));
    assert_closed!(changes);
}

#[tokio::test]
async fn next_waits_for_update() {
    let ob = Container::new(0);
    let mut changes = ob.changes();

    let handle = tokio::spawn(async move { changes.next().await });
    tokio::task::yield_now().await;
    ob.update(1);

    assert_eq!(handle.await.unwrap(), Some(change(0, 1)));
}

#[tokio::test]
async fn stream_combinators() {
    let ob = Container::new(0);
    let changes = ob.changes();

    for i in 1..=3 {
        ob.update(i);
    }

    let values: Vec<_> = changes.map(|change| change.new).take(3).collect().await;
    assert_eq!(values, [1, 2, 3]);
}
