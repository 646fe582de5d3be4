//! Idempotent disposal handles.
//!
//! Every subscription in Rill, at every boundary, is released through a
//! `Disposable`. Disposing runs the release action at most once; later calls
//! are silent no-ops. Clones share the same action.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

type DisposeAction = Box<dyn FnOnce()>;

/// A handle that releases a resource or subscription.
#[derive(Clone)]
pub struct Disposable {
    action: Rc<RefCell<Option<DisposeAction>>>,
}

impl Disposable {
    /// Creates a disposable that runs `action` on the first `dispose()`.
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            action: Rc::new(RefCell::new(Some(Box::new(action)))),
        }
    }

    /// Creates a disposable with nothing to release.
    pub fn empty() -> Self {
        Self {
            action: Rc::new(RefCell::new(None)),
        }
    }

    /// Creates a disposable that disposes every member, in order.
    pub fn from_all<I>(disposables: I) -> Self
    where
        I: IntoIterator<Item = Disposable>,
    {
        let members: Vec<Disposable> = disposables.into_iter().collect();
        Self::new(move || {
            for member in members {
                member.dispose();
            }
        })
    }

    /// Releases the resource. Safe to call any number of times.
    pub fn dispose(&self) {
        // Take the action before running it so a re-entrant dispose is a no-op.
        let action = self.action.borrow_mut().take();
        if let Some(action) = action {
            action();
        }
    }

    /// Returns true once there is nothing left to release.
    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.action.borrow().is_none()
    }

    /// Wraps the disposable in a guard that disposes it on drop.
    pub fn guard(self) -> DisposeGuard {
        DisposeGuard(Some(self))
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Disposes the wrapped `Disposable` when dropped.
#[must_use = "dropping the guard disposes immediately"]
#[derive(Debug)]
pub struct DisposeGuard(Option<Disposable>);

impl DisposeGuard {
    /// Releases the guard without disposing.
    pub fn into_inner(mut self) -> Disposable {
        self.0.take().unwrap_or_else(Disposable::empty)
    }
}

impl Drop for DisposeGuard {
    fn drop(&mut self) {
        if let Some(disposable) = self.0.take() {
            disposable.dispose();
        }
    }
}
