//! Property-based invariant tests for the equilibrium model.
//!
//! 1. `[H3O+][OH-] == Kw` for every variant and every valid input.
//! 2. Weak solutes conserve mass: `solute + product == c`, `0 < x < c`.
//! 3. Water ignores its inputs.
//! 4. pH is monotonically non-increasing in `[H3O+]` and stays in [0, 14].
//! 5. `reset()` restores construction-time inputs after any edit sequence.
//! 6. Every derived concentration is non-negative.

use std::rc::Rc;

use abs_model::{AbsConfig, AqueousSolution, SolutionKind, ph};
use proptest::prelude::*;

const KW: f64 = 1e-14;

fn kw_ok(h3o: f64, oh: f64) -> bool {
    let product = h3o * oh;
    (product - KW).abs() <= 1e-18 || ((product - KW) / KW).abs() <= 1e-6
}

// ── Strategies ────────────────────────────────────────────────────────────

/// Log-uniform concentration inside the default range.
fn concentration_strategy() -> impl Strategy<Value = f64> {
    (-3.0f64..=0.0).prop_map(|e| 10f64.powf(e))
}

/// Log-uniform weak strength inside the default range.
fn weak_strength_strategy() -> impl Strategy<Value = f64> {
    (-10.0f64..=2.0).prop_map(|e| 10f64.powf(e).clamp(1e-10, 1e2))
}

fn kind_strategy() -> impl Strategy<Value = SolutionKind> {
    prop::sample::select(SolutionKind::ALL.to_vec())
}

fn fresh(kind: SolutionKind) -> AqueousSolution {
    AqueousSolution::new(kind, Rc::new(AbsConfig::default()))
}

proptest! {
    #[test]
    fn water_product_holds(
        kind in kind_strategy(),
        c in concentration_strategy(),
        k in weak_strength_strategy(),
    ) {
        let s = fresh(kind);
        s.set_concentration(c).unwrap();
        if kind.is_weak() {
            s.set_strength(k).unwrap();
        }
        prop_assert!(kw_ok(s.h3o().get(), s.oh().get()), "{kind} c={c} k={k}");
        let d = s.derived();
        for value in [d.solute, d.product, d.h3o, d.oh, d.h2o] {
            prop_assert!(value >= 0.0);
        }
    }

    #[test]
    fn weak_solutes_conserve_mass(
        acid in any::<bool>(),
        c in concentration_strategy(),
        k in weak_strength_strategy(),
    ) {
        let kind = SolutionKind::custom(acid, true);
        let s = fresh(kind);
        s.set_inputs(c, Some(k)).unwrap();
        let d = s.derived();
        let x = if acid { d.h3o } else { d.oh };
        prop_assert!(x > 0.0 && x <= c);
        prop_assert!(((d.solute + d.product) - c).abs() <= c * 1e-12);
        prop_assert!((d.product - x).abs() <= x * 1e-12);
    }

    #[test]
    fn water_ignores_inputs(c in concentration_strategy()) {
        let s = fresh(SolutionKind::Water);
        s.set_concentration(c).unwrap();
        prop_assert!((s.h3o().get() - 1e-7).abs() < 1e-18);
        prop_assert_eq!(s.h3o().get(), s.oh().get());
    }

    #[test]
    fn ph_is_monotone(a in -16.0f64..=2.0, b in -16.0f64..=2.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (p_lo, p_hi) = (ph(10f64.powf(lo)), ph(10f64.powf(hi)));
        prop_assert!(p_lo >= p_hi);
        prop_assert!((0.0..=14.0).contains(&p_lo));
        prop_assert!((0.0..=14.0).contains(&p_hi));
    }

    #[test]
    fn reset_round_trip(
        kind in kind_strategy(),
        edits in proptest::collection::vec((concentration_strategy(), weak_strength_strategy()), 0..=8),
    ) {
        let s = fresh(kind);
        let initial = s.snapshot();
        for (c, k) in edits {
            s.set_concentration(c).unwrap();
            if kind.is_weak() {
                s.set_strength(k).unwrap();
            }
        }
        s.reset().unwrap();
        prop_assert_eq!(s.snapshot(), initial);
    }
}

#[test]
fn strong_acid_reference_point() {
    let s = fresh(SolutionKind::StrongAcid);
    s.set_concentration(1e-2).unwrap();
    assert_eq!(s.product().get(), 1e-2);
    assert_eq!(s.h3o().get(), 1e-2);
    assert_eq!(s.solute().get(), 0.0);
}

#[test]
fn weak_acid_reference_point() {
    let s = fresh(SolutionKind::WeakAcid);
    s.set_inputs(1e-2, Some(1e-7)).unwrap();
    let (c, ka): (f64, f64) = (1e-2, 1e-7);
    let root = (-ka + (ka * ka + 4.0 * ka * c).sqrt()) / 2.0;
    let h3o = s.h3o().get();
    assert!(((h3o - root) / root).abs() < 1e-9);
    assert!(0.0 < h3o && h3o < c);
    assert!((s.solute().get() - (c - h3o)).abs() < 1e-15);
}
