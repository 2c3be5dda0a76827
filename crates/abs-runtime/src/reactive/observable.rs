#![forbid(unsafe_code)]

//! Observable value wrapper with change notification and version tracking.
//!
//! # Design
//!
//! [`Observable<T>`] wraps a value of type `T` in shared, reference-counted
//! storage (`Rc<RefCell<..>>`). When the value changes (determined by
//! `PartialEq`), all live subscribers are called with `(new, old)` in
//! registration order. The value the cell was built with is remembered so
//! [`Observable::reset`] can restore it.
//!
//! # Performance
//!
//! | Operation    | Complexity               |
//! |-------------|--------------------------|
//! | `get()`     | O(1)                     |
//! | `set()`     | O(S) where S = subscribers |
//! | `subscribe()` | O(1) amortized          |
//! | Memory      | ~64 bytes + 2 * sizeof(T) |
//!
//! # Failure Modes
//!
//! - **Re-entrant set**: Writing an observable from within one of its own
//!   subscriber callbacks is rejected with [`ReactiveError::ReentrantSet`]
//!   and the value is left untouched. Re-entrant mutations indicate a
//!   cycle in the subscriber graph.
//! - **Write after dispose**: Rejected with [`ReactiveError::Disposed`].
//! - **Subscriber leak**: If `Subscription` guards are stored indefinitely
//!   without being dropped, callbacks accumulate. Dead weak references are
//!   cleaned lazily during `notify()`.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// A subscriber callback stored as a strong `Rc` internally, handed out
/// as `Weak` to the observable. Arguments are `(new, old)`.
type CallbackRc<T> = Rc<dyn Fn(&T, &T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T, &T)>;

/// Why a write to an [`Observable`] was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactiveError {
    /// The write came from inside one of this observable's own listeners.
    ReentrantSet,
    /// The observable was disposed.
    Disposed,
}

impl fmt::Display for ReactiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReentrantSet => write!(f, "observable written from its own listener"),
            Self::Disposed => write!(f, "observable written after dispose"),
        }
    }
}

impl std::error::Error for ReactiveError {}

/// Shared interior for [`Observable<T>`].
struct ObservableInner<T> {
    value: T,
    initial: T,
    version: u64,
    /// Depth of in-flight notification cycles. Writes are refused while > 0.
    notifying: u32,
    disposed: bool,
    /// Subscribers stored as weak references. Dead entries are pruned on notify.
    subscribers: Vec<CallbackWeak<T>>,
}

impl<T> ObservableInner<T> {
    fn check_writable(&self) -> Result<(), ReactiveError> {
        if self.disposed {
            return Err(ReactiveError::Disposed);
        }
        if self.notifying > 0 {
            return Err(ReactiveError::ReentrantSet);
        }
        Ok(())
    }
}

/// Clears the in-flight marker even if a listener panics.
struct NotifyGuard<'a, T> {
    inner: &'a RefCell<ObservableInner<T>>,
}

impl<T> Drop for NotifyGuard<'_, T> {
    fn drop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.notifying = inner.notifying.saturating_sub(1);
    }
}

/// A shared, version-tracked value with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** inner state:
/// both handles see the same value and share subscribers.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each value-changing mutation.
/// 2. `set(v)` where `v == current` is a no-op.
/// 3. Subscribers are notified in registration order.
/// 4. Dead subscribers (dropped [`Subscription`] guards) are pruned lazily
///    and never called.
/// 5. `initial()` never changes after construction.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

// Manual Clone: shares the same Rc.
impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("initial", &inner.initial)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .field("disposed", &inner.disposed)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new observable with the given initial value.
    ///
    /// The initial version is 0 and no subscribers are registered.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                initial: value.clone(),
                value,
                version: 0,
                notifying: 0,
                disposed: false,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// The value this observable was constructed with.
    #[must_use]
    pub fn initial(&self) -> T {
        self.inner.borrow().initial.clone()
    }

    /// Access the current value by reference without cloning.
    ///
    /// The closure `f` receives an immutable reference to the value and
    /// must not write this observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Set a new value. If the new value differs from the current value
    /// (by `PartialEq`), the version is incremented and all live subscribers
    /// are notified before this returns.
    ///
    /// Returns `true` if the value changed. A refused write (see
    /// [`Observable::try_set`]) is logged and reported as `false`.
    pub fn set(&self, value: T) -> bool {
        match self.try_set(value) {
            Ok(changed) => changed,
            Err(err) => {
                tracing::warn!(error = %err, "observable write rejected");
                false
            }
        }
    }

    /// Like [`Observable::set`], but surfaces refused writes.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::ReentrantSet`] when called from one of this
    /// observable's listeners, [`ReactiveError::Disposed`] after
    /// [`Observable::dispose`].
    pub fn try_set(&self, value: T) -> Result<bool, ReactiveError> {
        let old = {
            let mut inner = self.inner.borrow_mut();
            inner.check_writable()?;
            if inner.value == value {
                return Ok(false);
            }
            inner.version += 1;
            std::mem::replace(&mut inner.value, value)
        };
        self.notify(&old);
        Ok(true)
    }

    /// Modify the value in place via a closure. If the value changes
    /// (compared by `PartialEq` against a snapshot), the version is
    /// incremented and subscribers are notified.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let old = {
            let mut inner = self.inner.borrow_mut();
            if let Err(err) = inner.check_writable() {
                tracing::warn!(error = %err, "observable update rejected");
                return false;
            }
            let old = inner.value.clone();
            f(&mut inner.value);
            if inner.value == old {
                return false;
            }
            inner.version += 1;
            old
        };
        self.notify(&old);
        true
    }

    /// Restore the construction-time value, notifying if it differs.
    pub fn reset(&self) -> bool {
        let initial = self.initial();
        self.set(initial)
    }

    /// Store a value without notifying anyone yet.
    ///
    /// The returned [`Staged`] must be published (or reverted) by the
    /// caller. Returns `Ok(None)` when the value is unchanged.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Observable::try_set`].
    pub fn stage(&self, value: T) -> Result<Option<Staged<T>>, ReactiveError> {
        let mut inner = self.inner.borrow_mut();
        inner.check_writable()?;
        if inner.value == value {
            return Ok(None);
        }
        inner.version += 1;
        let old = std::mem::replace(&mut inner.value, value);
        Ok(Some(Staged {
            target: self.clone(),
            old,
        }))
    }

    /// Subscribe to value changes. The callback is invoked with
    /// `(new, old)` each time the value changes, but not immediately.
    ///
    /// Returns a [`Subscription`] guard. Dropping the guard unsubscribes
    /// the callback (it will not be called after drop, though it may still
    /// be in the subscriber list until the next `notify()` prunes it).
    pub fn subscribe(&self, callback: impl Fn(&T, &T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        let weak = Rc::downgrade(&strong);
        self.inner.borrow_mut().subscribers.push(weak);
        // Wrap in a holder struct that can be type-erased as `dyn Any`,
        // since `Rc<dyn Fn(&T, &T)>` itself cannot directly coerce to `Rc<dyn Any>`.
        Subscription {
            guard: Some(Box::new(strong)),
        }
    }

    /// Call `callback` right away with `(current, current)`, then subscribe
    /// it to future changes.
    pub fn subscribe_and_fire(&self, callback: impl Fn(&T, &T) + 'static) -> Subscription {
        let current = self.get();
        callback(&current, &current);
        self.subscribe(callback)
    }

    /// A handle that can be read and subscribed to, but not written.
    #[must_use]
    pub fn read_only(&self) -> ReadOnlyObservable<T> {
        ReadOnlyObservable {
            source: self.clone(),
        }
    }

    /// Drop every subscriber and refuse further writes.
    pub fn dispose(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.subscribers.clear();
        inner.disposed = true;
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }

    /// Current version number. Increments by 1 on each value-changing
    /// mutation. Useful for dirty-checking in render loops.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of currently registered subscribers (including dead ones
    /// not yet pruned).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Notify live subscribers and prune dead ones.
    fn notify(&self, old: &T) {
        // Snapshot the list so subscribe/unsubscribe during the cycle cannot
        // disturb iteration.
        let (snapshot, value) = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner.notifying += 1;
            (inner.subscribers.clone(), inner.value.clone())
        };
        let _guard = NotifyGuard {
            inner: self.inner.as_ref(),
        };

        // Upgrade lazily: a listener unsubscribed earlier in this cycle is skipped.
        for weak in &snapshot {
            if let Some(cb) = weak.upgrade() {
                cb(&value, old);
            }
        }
    }
}

/// A change stored by [`Observable::stage`] whose notification is pending.
#[must_use = "a staged change is invisible to listeners until published"]
pub struct Staged<T: Clone + PartialEq + 'static> {
    target: Observable<T>,
    old: T,
}

impl<T: Clone + PartialEq + 'static> Staged<T> {
    /// The value that was replaced.
    pub fn old(&self) -> &T {
        &self.old
    }

    /// Deliver the pending `(new, old)` notification.
    pub fn publish(self) {
        self.target.notify(&self.old);
    }

    /// Put the old value back without notifying.
    pub fn revert(self) {
        let mut inner = self.target.inner.borrow_mut();
        inner.value = self.old;
        inner.version += 1;
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for Staged<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Staged")
            .field("old", &self.old)
            .field("new", &self.target.get())
            .finish()
    }
}

/// Read and subscribe access to an [`Observable`] owned elsewhere.
pub struct ReadOnlyObservable<T> {
    source: Observable<T>,
}

impl<T> Clone for ReadOnlyObservable<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadOnlyObservable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnlyObservable").field(&self.source).finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReadOnlyObservable<T> {
    #[must_use]
    pub fn get(&self) -> T {
        self.source.get()
    }

    #[must_use]
    pub fn initial(&self) -> T {
        self.source.initial()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.source.with(f)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.source.version()
    }

    pub fn subscribe(&self, callback: impl Fn(&T, &T) + 'static) -> Subscription {
        self.source.subscribe(callback)
    }

    pub fn subscribe_and_fire(&self, callback: impl Fn(&T, &T) + 'static) -> Subscription {
        self.source.subscribe_and_fire(callback)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.source.subscriber_count()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.source.is_disposed()
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping the `Subscription`, or calling [`Subscription::unsubscribe`],
/// causes the associated callback to become unreachable (the strong `Rc` is
/// dropped, so the `Weak` in the observable's subscriber list will fail to
/// upgrade on the next call attempt).
pub struct Subscription {
    /// Type-erased strong reference keeping the callback `Rc` alive.
    guard: Option<Box<dyn Any>>,
}

impl Subscription {
    /// Stop receiving notifications. Calling this more than once is a no-op.
    pub fn unsubscribe(&mut self) {
        self.guard = None;
    }

    /// Whether [`Subscription::unsubscribe`] has not been called yet.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.guard.is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
