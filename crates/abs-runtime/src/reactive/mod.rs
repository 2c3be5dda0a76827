#![forbid(unsafe_code)]

//! Reactive data bindings for the equilibrium model.
//!
//! This module provides change-tracking primitives:
//!
//! - [`Observable`]: A shared, version-tracked value wrapper with change
//!   notification via `(new, old)` listener callbacks.
//! - [`ReadOnlyObservable`]: A view that can be read and subscribed to but
//!   not written.
//! - [`Subscription`]: RAII guard that unsubscribes on drop or on an
//!   explicit [`Subscription::unsubscribe`].
//! - [`Staged`]: A silently stored change whose notification is delivered
//!   later, so a group of cells can be updated as one consistent step.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and cleaned up lazily
//! during notification.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications).
//! 4. An unsubscribed listener is never called again, even if it is
//!    removed in the middle of a notification cycle.
//! 5. A listener may not write the observable it is being notified by.

pub mod observable;

pub use observable::{Observable, ReactiveError, ReadOnlyObservable, Staged, Subscription};
