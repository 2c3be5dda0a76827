//! Property-based invariant tests for [`Observable`].
//!
//! 1. Version counts exactly the value-changing writes.
//! 2. Every listener sees every change, with the correct `(new, old)` pair.
//! 3. `reset()` restores the construction value regardless of prior writes.
//! 4. A listener that drops itself mid-cycle never perturbs its neighbours.

use std::cell::RefCell;
use std::rc::Rc;

use abs_runtime::{Observable, Subscription};
use proptest::prelude::*;

fn writes_strategy() -> impl Strategy<Value = Vec<i32>> {
    proptest::collection::vec(-5i32..=5, 0..=64)
}

proptest! {
    #[test]
    fn version_counts_changes(initial in -5i32..=5, writes in writes_strategy()) {
        let obs = Observable::new(initial);
        let mut expected = 0u64;
        let mut current = initial;
        for w in &writes {
            if *w != current {
                expected += 1;
                current = *w;
            }
            obs.set(*w);
        }
        prop_assert_eq!(obs.version(), expected);
        prop_assert_eq!(obs.get(), current);
    }

    #[test]
    fn listeners_see_consistent_pairs(initial in -5i32..=5, writes in writes_strategy()) {
        let obs = Observable::new(initial);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = obs.subscribe(move |new, old| seen_clone.borrow_mut().push((*new, *old)));

        for w in &writes {
            obs.set(*w);
        }

        let seen = seen.borrow();
        prop_assert_eq!(seen.len() as u64, obs.version());
        let mut previous = initial;
        for (new, old) in seen.iter() {
            prop_assert_eq!(*old, previous);
            prop_assert_ne!(*new, *old);
            previous = *new;
        }
    }

    #[test]
    fn reset_round_trip(initial in any::<i64>(), writes in proptest::collection::vec(any::<i64>(), 0..=16)) {
        let obs = Observable::new(initial);
        for w in writes {
            obs.set(w);
        }
        obs.reset();
        prop_assert_eq!(obs.get(), initial);
    }

    #[test]
    fn self_removal_never_skips_or_duplicates(
        listeners in 2usize..=8,
        quitter in 0usize..8,
        writes in 1usize..=6,
    ) {
        let quitter = quitter % listeners;
        let obs = Observable::new(0usize);
        let counts = Rc::new(RefCell::new(vec![0usize; listeners]));
        let slots: Vec<Rc<RefCell<Option<Subscription>>>> =
            (0..listeners).map(|_| Rc::new(RefCell::new(None))).collect();

        for (idx, slot) in slots.iter().enumerate() {
            let counts = Rc::clone(&counts);
            let own_slot = Rc::clone(slot);
            let sub = obs.subscribe(move |_, _| {
                counts.borrow_mut()[idx] += 1;
                if idx == quitter {
                    let taken = own_slot.borrow_mut().take();
                    drop(taken);
                }
            });
            *slot.borrow_mut() = Some(sub);
        }

        for w in 1..=writes {
            obs.set(w);
        }

        let counts = counts.borrow();
        for (idx, count) in counts.iter().enumerate() {
            let expected = if idx == quitter { 1 } else { writes };
            prop_assert_eq!(*count, expected);
        }
    }
}
