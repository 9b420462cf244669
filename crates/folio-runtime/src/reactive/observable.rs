#![forbid(unsafe_code)]

//! Shared tracker state with change listeners.
//!
//! The scroll and pointer trackers and the progress sequencer each publish
//! their latest snapshot through an [`Observable`]. Readers call
//! [`Observable::get`] synchronously; renderers [`subscribe`](Observable::subscribe)
//! and keep the returned [`Subscription`] alive for as long as they care.
//!
//! Listeners are stored as `Weak` pointers. The only strong pointer lives in
//! the guard, so the host never has to unregister explicitly.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener<T> = dyn Fn(&T);

struct Slot<T> {
    current: T,
    revision: u64,
    listeners: Vec<Weak<Listener<T>>>,
}

/// A snapshot cell that notifies listeners when the snapshot changes.
///
/// Clones share the same cell. Writing an equal snapshot is ignored and does
/// not bump [`version`](Self::version). Listeners run in subscription order
/// after the cell is released, so they may read it or write it again.
pub struct Observable<T> {
    cell: Rc<RefCell<Slot<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cell = self.cell.borrow();
        f.debug_struct("Observable")
            .field("current", &cell.current)
            .field("revision", &cell.revision)
            .field("listeners", &cell.listeners.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            cell: Rc::new(RefCell::new(Slot {
                current: initial,
                revision: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Clone out the current snapshot.
    #[must_use]
    pub fn get(&self) -> T {
        self.cell.borrow().current.clone()
    }

    /// Borrow the current snapshot for the duration of `read`.
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.cell.borrow().current)
    }

    /// Replace the snapshot.
    pub fn set(&self, next: T) {
        self.update(move |current| *current = next);
    }

    /// Edit the snapshot in place; listeners run only if it changed.
    pub fn update(&self, edit: impl FnOnce(&mut T)) {
        let mut cell = self.cell.borrow_mut();
        let before = cell.current.clone();
        edit(&mut cell.current);
        if cell.current == before {
            return;
        }
        cell.revision += 1;
        drop(cell);
        self.publish();
    }

    /// Register `listener`; it stays registered while the guard lives.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let strong: Rc<Listener<T>> = Rc::new(listener);
        self.cell
            .borrow_mut()
            .listeners
            .push(Rc::downgrade(&strong));
        Subscription::hold(strong)
    }

    /// Number of changes published so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.cell.borrow().revision
    }

    /// Registered listeners, counting dropped ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.cell.borrow().listeners.len()
    }

    fn publish(&self) {
        let (live, snapshot, revision) = {
            let mut cell = self.cell.borrow_mut();
            cell.listeners.retain(|w| w.strong_count() > 0);
            let live: Vec<Rc<Listener<T>>> =
                cell.listeners.iter().filter_map(Weak::upgrade).collect();
            (live, cell.current.clone(), cell.revision)
        };
        tracing::trace!(revision, listeners = live.len(), "observable.publish");
        for listener in &live {
            listener(&snapshot);
        }
    }
}

/// Keeps a callback registered. Dropping it unregisters.
///
/// Besides observable listeners, the guard can own timer guards and oracle
/// watches, so any lifetime-bound registration in the runtime hands one out.
pub struct Subscription {
    _owned: Box<dyn Any>,
}

impl Subscription {
    pub(crate) fn hold(owned: impl Any) -> Self {
        Self {
            _owned: Box::new(owned),
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Subscription")
    }
}
