//! Observable state container and the comment state it holds.
//!
//! # Responsibility
//! - Provide the `StateStore` contract consumed by widgets and annotations.
//! - Funnel every mutation through one dispatch path.
//! - Notify subscribers in commit order with fully settled snapshots.
//!
//! # Invariants
//! - Actions dispatched while a notification round is running are queued and
//!   applied after that round, in FIFO order.
//! - Listeners added during a round are first called on the next round.
//! - Listeners removed during a round are not called again.
//! - `Subscription::unsubscribe` only has effect the first time.

pub mod comments;
pub mod selectors;

use log::trace;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

/// Change callback registered with a store.
///
/// Callbacks read the new snapshot through `StateStore::get_state`.
pub type Listener = Rc<dyn Fn()>;

/// Observable store capability.
pub trait StateStore {
    type State;
    type Action;

    /// Returns the current settled snapshot.
    fn get_state(&self) -> Rc<Self::State>;
    /// Registers `listener` for every committed change.
    fn subscribe(&self, listener: Listener) -> Subscription;
    /// Applies `action` through the reducer and notifies subscribers.
    fn dispatch(&self, action: Self::Action);
}

struct ListenerSlot {
    active: Cell<bool>,
    callback: Listener,
}

#[derive(Default)]
struct ListenerRegistry {
    slots: RefCell<Vec<Rc<ListenerSlot>>>,
}

impl ListenerRegistry {
    fn snapshot(&self) -> Vec<Rc<ListenerSlot>> {
        self.slots.borrow().clone()
    }
}

/// Handle returned by `StateStore::subscribe`.
///
/// Dropping the handle does not unsubscribe; call `unsubscribe` explicitly.
pub struct Subscription {
    slot: Weak<ListenerSlot>,
    registry: Weak<ListenerRegistry>,
}

impl Subscription {
    /// Removes the listener. Safe to call any number of times.
    pub fn unsubscribe(&self) {
        let Some(slot) = self.slot.upgrade() else {
            return;
        };
        if !slot.active.replace(false) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry
                .slots
                .borrow_mut()
                .retain(|candidate| !Rc::ptr_eq(candidate, &slot));
        }
    }

    pub fn is_active(&self) -> bool {
        self.slot.upgrade().is_some_and(|slot| slot.active.get())
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

type Reducer<S, A> = Box<dyn Fn(&S, A) -> S>;

struct StoreInner<S, A> {
    state: RefCell<Rc<S>>,
    reducer: Reducer<S, A>,
    registry: Rc<ListenerRegistry>,
    pending: RefCell<VecDeque<A>>,
    dispatching: Cell<bool>,
}

/// Single-threaded reducer store.
///
/// Cloning yields another handle to the same state.
pub struct Store<S, A> {
    inner: Rc<StoreInner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: 'static, A: 'static> Store<S, A> {
    /// Creates a store holding `initial` and reducing actions with `reducer`.
    pub fn new(initial: S, reducer: impl Fn(&S, A) -> S + 'static) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(Rc::new(initial)),
                reducer: Box::new(reducer),
                registry: Rc::new(ListenerRegistry::default()),
                pending: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
            }),
        }
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.registry.slots.borrow().len()
    }

    /// Whether a notification round is running on this store.
    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatching.get()
    }

    fn drain_pending(&self) {
        loop {
            let next_action = self.inner.pending.borrow_mut().pop_front();
            let Some(action) = next_action else {
                break;
            };

            let current = self.inner.state.borrow().clone();
            let next = (self.inner.reducer)(&current, action);
            *self.inner.state.borrow_mut() = Rc::new(next);

            for slot in self.inner.registry.snapshot() {
                if slot.active.get() {
                    (slot.callback)();
                }
            }
        }
    }
}

impl<S: 'static, A: 'static> StateStore for Store<S, A> {
    type State = S;
    type Action = A;

    fn get_state(&self) -> Rc<S> {
        self.inner.state.borrow().clone()
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        let slot = Rc::new(ListenerSlot {
            active: Cell::new(true),
            callback: listener,
        });
        self.inner.registry.slots.borrow_mut().push(slot.clone());
        Subscription {
            slot: Rc::downgrade(&slot),
            registry: Rc::downgrade(&self.inner.registry),
        }
    }

    fn dispatch(&self, action: A) {
        self.inner.pending.borrow_mut().push_back(action);
        if self.inner.dispatching.get() {
            trace!("event=dispatch_deferred module=store status=queued");
            return;
        }

        self.inner.dispatching.set(true);
        let _reset = DispatchGuard(&self.inner.dispatching);
        self.drain_pending();
    }
}

/// Clears the dispatching flag even if a listener unwinds.
struct DispatchGuard<'a>(&'a Cell<bool>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
