use lookout::{Container, ObservedChange};

use crate::{change, Log};

#[test]
fn map() {
    let ob = Container::new(false);
    let mapped = ob.map(|b| if b { 1 } else { 0 });
    assert_eq!(mapped.get(), 0);

    let log = Log::new();
    mapped.subscribe(log.handler());
    ob.update(true);
    assert_eq!(log.take(), [change(0, 1)]);
}

#[test]
fn derived_container_is_silent_on_creation() {
    let ob = Container::new(2);
    let doubled = ob.map(|n| n * 2);

    let silent = Log::new();
    doubled.subscribe(silent.handler());
    let immediate = Log::new();
    doubled.subscribe_immediate(immediate.handler());

    assert_eq!(silent.len(), 0);
    assert_eq!(immediate.take(), [ObservedChange::initial(4)]);
}

#[test]
fn derived_container_does_not_write_upstream() {
    let ob = Container::new(1);
    let mapped = ob.map(|n| n + 1);

    mapped.update(10);
    assert_eq!(ob.get(), 1);

    ob.update(5);
    assert_eq!(mapped.get(), 6);
}

#[test]
fn dedupe_by_equality() {
    let ob = Container::new(1);
    let deduped = ob.dedupe_by_equality();
    let log = Log::new();
    deduped.subscribe(log.handler());

    ob.update(1);
    ob.update(1);
    assert_eq!(log.len(), 0);

    ob.update(2);
    ob.update(2);
    assert_eq!(log.take(), [change(1, 2)]);
}

#[test]
fn drop_while() {
    let ob = Container::new(0);
    let odd = ob.drop_while(|change| change.new % 2 == 0);
    let log = Log::new();
    odd.subscribe(log.handler());

    for i in 1..=5 {
        ob.update(i);
    }

    assert_eq!(log.take(), [change(0, 1), change(1, 3), change(3, 5)]);
    assert_eq!(odd.get(), 5);
}

#[test]
fn drop_nil() {
    let ob = Container::new(Some(false));
    let unwrapped = ob.drop_nil(false);
    let log = Log::new();
    unwrapped.subscribe(log.handler());
    assert_eq!(log.len(), 0);

    ob.update(Some(false));
    assert_eq!(log.take(), [change(false, false)]);

    ob.update(Some(true));
    assert_eq!(log.take(), [change(false, true)]);

    ob.update(None);
    assert_eq!(log.len(), 0);
    assert!(unwrapped.get());
}

#[test]
fn drop_nil_starts_with_fallback() {
    let ob = Container::new(Some(3));
    let unwrapped = ob.drop_nil(0);
    assert_eq!(unwrapped.get(), 0);
}

#[test]
fn chain_keeps_intermediate_containers_alive() {
    let ob = Container::new(0);
    let tens = ob.map(|n| n / 10).dedupe_by_equality();
    let log = Log::new();
    tens.subscribe(log.handler());

    for i in 1..=25 {
        ob.update(i);
    }

    assert_eq!(log.take(), [change(0, 1), change(1, 2)]);
}

#[test]
fn dropped_derived_container_is_pruned_from_upstream() {
    let ob = Container::new(0);
    let mapped = ob.map(|n| n + 1);
    assert_eq!(ob.observer_count(), 1);

    drop(mapped);
    assert_eq!(ob.observer_count(), 1);

    ob.update(1);
    assert_eq!(ob.observer_count(), 0);
}
