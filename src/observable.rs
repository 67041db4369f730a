//! Single-slot publish/subscribe store.
//!
//! An [`Observable`] holds one current value and a list of observers. [`Observable::set`]
//! replaces the value and notifies every observer synchronously, in subscription order,
//! before it returns. Delivery is single-threaded: the store uses `RefCell`s so it can be
//! shared through an `Rc` by the catalog that publishes and the views that subscribe.
//!
//! Observers may read the store, subscribe further observers, or call `set` again from
//! inside a notification. A nested `set` does not recurse: once the current round ends,
//! every observer is notified again with the latest value.

use log::debug;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Receiver of store updates
pub trait Observer<T> {
    /// Called with the new value on every `set`
    fn next(&mut self, value: &T);

    /// Called once when the store completes
    fn complete(&mut self) {}
}

impl<T, F> Observer<T> for F
where
    F: FnMut(&T),
{
    fn next(&mut self, value: &T) {
        self(value)
    }
}

/// An observer built from an update callback and a completion callback
pub struct FnObserver<N, C> {
    on_next: N,
    on_complete: Option<C>,
}

/// Build an observer with both callbacks
pub fn observer_fn<T, N, C>(on_next: N, on_complete: C) -> FnObserver<N, C>
where
    N: FnMut(&T),
    C: FnOnce(),
{
    FnObserver {
        on_next,
        on_complete: Some(on_complete),
    }
}

impl<T, N, C> Observer<T> for FnObserver<N, C>
where
    N: FnMut(&T),
    C: FnOnce(),
{
    fn next(&mut self, value: &T) {
        (self.on_next)(value)
    }

    fn complete(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete()
        }
    }
}

type BoxedObserver<T> = Box<dyn Observer<T>>;

/// Reactive value store
pub struct Observable<T> {
    value: RefCell<Rc<T>>,
    observers: RefCell<Vec<BoxedObserver<T>>>,
    completed: Cell<bool>,
    notifying: Cell<bool>,
    /// Set by a nested `set` while a round is in progress
    pending: Cell<bool>,
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: RefCell::new(Rc::new(initial)),
            observers: RefCell::new(Vec::new()),
            completed: Cell::new(false),
            notifying: Cell::new(false),
            pending: Cell::new(false),
        }
    }

    /// Register an observer. The current value is not replayed to it.
    pub fn subscribe<O>(&self, observer: O)
    where
        O: Observer<T> + 'static,
    {
        if self.completed.get() {
            debug!("Ignoring subscription to a completed store");
            return;
        }
        self.observers.borrow_mut().push(Box::new(observer));
    }

    /// Replace the value and notify every observer registered before this call
    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = Rc::new(value);
        if self.completed.get() {
            return;
        }
        if self.notifying.get() {
            self.pending.set(true);
            return;
        }

        // Take the list out so observers can subscribe, read or set while being notified.
        self.notifying.set(true);
        let mut notified = std::mem::take(&mut *self.observers.borrow_mut());
        loop {
            self.pending.set(false);
            let current = Rc::clone(&self.value.borrow());
            for observer in notified.iter_mut() {
                observer.next(&current);
            }
            if self.completed.get() || !self.pending.get() {
                break;
            }
            debug!("Value replaced during notification, notifying again");
            let added_meanwhile = std::mem::take(&mut *self.observers.borrow_mut());
            notified.extend(added_meanwhile);
        }
        self.notifying.set(false);

        // An observer may have completed the store while it was being notified.
        if self.completed.get() {
            for observer in notified.iter_mut() {
                observer.complete();
            }
            return;
        }
        let mut observers = self.observers.borrow_mut();
        let added_meanwhile = std::mem::replace(&mut *observers, notified);
        observers.extend(added_meanwhile);
    }

    /// Run `f` against the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&**self.value.borrow())
    }

    /// Notify completion to every observer and drop them all.
    /// The value stays readable; later `set` calls notify nobody.
    pub fn complete(&self) {
        self.completed.set(true);
        let mut observers = std::mem::take(&mut *self.observers.borrow_mut());
        for observer in observers.iter_mut() {
            observer.complete();
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed.get()
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.borrow().len()
    }
}

impl<T: Clone> Observable<T> {
    /// The current value
    pub fn get(&self) -> T {
        (**self.value.borrow()).clone()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value.borrow())
            .field("subscribers", &self.subscriber_count())
            .field("completed", &self.completed.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    #[test]
    fn test_get_returns_default_then_set_value() {
        let store = Observable::new(vec![1]);
        assert_eq!(store.get(), vec![1]);
        store.set(vec![2, 3]);
        assert_eq!(store.get(), vec![2, 3]);
    }

    #[test]
    fn test_subscribe_does_not_replay() {
        let store = Observable::new(5);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |v: &i32| sink.borrow_mut().push(*v));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_set_notifies_each_observer_once_in_order() {
        let store = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        for name in ["first", "second"] {
            let log = Rc::clone(&log);
            store.subscribe(move |v: &i32| log.borrow_mut().push(format!("{}:{}", name, v)));
        }

        store.set(7);

        assert_eq!(*log.borrow(), vec!["first:7", "second:7"]);
    }

    #[test]
    fn test_complete_stops_notifications() {
        let store = Observable::new(0);
        let updates = Rc::new(Cell::new(0));
        let completions = Rc::new(Cell::new(0));
        let (u, c) = (Rc::clone(&updates), Rc::clone(&completions));
        store.subscribe(observer_fn(move |_: &i32| u.set(u.get() + 1), move || c.set(c.get() + 1)));

        store.set(1);
        store.complete();
        store.set(2);

        assert_eq!(updates.get(), 1);
        assert_eq!(completions.get(), 1);
        assert_eq!(store.get(), 2);
        assert_eq!(store.subscriber_count(), 0);
        assert!(store.is_completed());
    }

    #[test]
    fn test_subscribe_after_complete_is_ignored() {
        let store = Observable::new(0);
        store.complete();
        store.subscribe(|_: &i32| panic!("must not be called"));
        store.set(3);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_observer_can_read_store_during_notification() {
        let store = Rc::new(Observable::new(String::new()));
        let seen = Rc::new(RefCell::new(String::new()));
        let (inner, sink) = (Rc::clone(&store), Rc::clone(&seen));
        store.subscribe(move |_: &String| *sink.borrow_mut() = inner.get());

        store.set("fresh".to_string());

        assert_eq!(*seen.borrow(), "fresh");
    }

    #[test]
    fn test_set_from_inside_notification() {
        let store = Rc::new(Observable::new(0));
        let log = Rc::new(RefCell::new(Vec::new()));

        let (inner, sink) = (Rc::clone(&store), Rc::clone(&log));
        store.subscribe(move |v: &i32| {
            sink.borrow_mut().push(format!("clamp:{}", v));
            if *v > 10 {
                inner.set(10);
            }
        });
        let sink = Rc::clone(&log);
        store.subscribe(move |v: &i32| sink.borrow_mut().push(format!("view:{}", v)));

        store.set(42);

        assert_eq!(
            *log.borrow(),
            vec!["clamp:42", "view:42", "clamp:10", "view:10"]
        );
        assert_eq!(store.get(), 10);
        assert_eq!(store.subscriber_count(), 2);
    }

    #[test]
    fn test_observer_subscribed_during_notification_sees_later_updates() {
        let store = Rc::new(Observable::new(0));
        let late = Rc::new(RefCell::new(Vec::new()));
        let (inner, sink) = (Rc::clone(&store), Rc::clone(&late));
        let mut registered = false;
        store.subscribe(move |_: &i32| {
            if !registered {
                registered = true;
                let sink = Rc::clone(&sink);
                inner.subscribe(move |v: &i32| sink.borrow_mut().push(*v));
            }
        });

        store.set(1);
        store.set(2);

        assert_eq!(*late.borrow(), vec![2]);
        assert_eq!(store.subscriber_count(), 2);
    }
}
