#![forbid(unsafe_code)]

//! Runtime: reactive value cells for the Acid-Base Solutions model.
//!
//! # Role in Acid-Base Solutions
//! `abs-runtime` is the leaf of the workspace. It owns the observable
//! property primitive that every model quantity is published through, and
//! knows nothing about chemistry.
//!
//! # How it fits in the system
//! `abs-model` builds solutions and the solution registry on top of
//! [`reactive::Observable`]. A presentation layer subscribes to the
//! read-only views the model hands out and re-renders on change.

pub mod reactive;

pub use reactive::{Observable, ReactiveError, ReadOnlyObservable, Staged, Subscription};
