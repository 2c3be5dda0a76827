//! Closed-form equilibrium concentrations.
//!
//! Every variant shares water's autoionization, so each result satisfies
//! `h3o * oh == Kw` up to rounding. Weak solutes dissociate by `x`, the
//! positive root of `x² + K·x − K·c = 0` (mass action with `[A-] = [H3O+]`
//! and `[HA] = c − [H3O+]`, or the base analogue).

use crate::config::AbsConfig;
use crate::solution::SolutionKind;

/// Concentrations (mol/L) of every species in a solution at equilibrium.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct DerivedConcentrations {
    /// Undissociated solute: HA, MOH or B.
    pub solute: f64,
    /// Dissociation product: A-, M+ or BH+.
    pub product: f64,
    pub h3o: f64,
    pub oh: f64,
    pub h2o: f64,
}

/// Equilibrium state of `kind` at `concentration` and `strength`.
///
/// `strength` is ignored for water and strong solutes. A weak solute given
/// `None` uses the configured weak default.
#[must_use]
pub fn derive(
    kind: SolutionKind,
    concentration: f64,
    strength: Option<f64>,
    config: &AbsConfig,
) -> DerivedConcentrations {
    let weak_k = strength.unwrap_or(config.weak_strength.default);
    match kind {
        SolutionKind::Water => water(config),
        SolutionKind::StrongAcid => strong_acid(concentration, config),
        SolutionKind::WeakAcid => weak_acid(concentration, weak_k, config),
        SolutionKind::StrongBase => strong_base(concentration, config),
        SolutionKind::WeakBase => weak_base(concentration, weak_k, config),
    }
}

#[must_use]
pub fn water(config: &AbsConfig) -> DerivedConcentrations {
    let ion = config.water_equilibrium_constant.sqrt();
    DerivedConcentrations {
        solute: 0.0,
        product: 0.0,
        h3o: ion,
        oh: ion,
        h2o: config.water_concentration,
    }
}

/// HA + H2O -> A- + H3O+, complete.
#[must_use]
pub fn strong_acid(concentration: f64, config: &AbsConfig) -> DerivedConcentrations {
    let h3o = concentration;
    DerivedConcentrations {
        solute: 0.0,
        product: concentration,
        h3o,
        oh: config.water_equilibrium_constant / h3o,
        h2o: config.water_concentration - concentration,
    }
}

/// HA + H2O <-> A- + H3O+ with Ka = `ka`.
#[must_use]
pub fn weak_acid(concentration: f64, ka: f64, config: &AbsConfig) -> DerivedConcentrations {
    let h3o = dissociated(concentration, ka);
    DerivedConcentrations {
        solute: concentration - h3o,
        product: h3o,
        h3o,
        oh: config.water_equilibrium_constant / h3o,
        h2o: config.water_concentration - h3o,
    }
}

/// MOH -> M+ + OH-, complete. No water is consumed.
#[must_use]
pub fn strong_base(concentration: f64, config: &AbsConfig) -> DerivedConcentrations {
    let oh = concentration;
    DerivedConcentrations {
        solute: 0.0,
        product: concentration,
        h3o: config.water_equilibrium_constant / oh,
        oh,
        h2o: config.water_concentration,
    }
}

/// B + H2O <-> BH+ + OH- with Kb = `kb`.
#[must_use]
pub fn weak_base(concentration: f64, kb: f64, config: &AbsConfig) -> DerivedConcentrations {
    let oh = dissociated(concentration, kb);
    DerivedConcentrations {
        solute: concentration - oh,
        product: oh,
        h3o: config.water_equilibrium_constant / oh,
        oh,
        h2o: config.water_concentration - oh,
    }
}

/// Positive root of `x² + k·x − k·c = 0`, clamped to `[0, c]`.
///
/// `(-k + sqrt(k² + 4kc)) / 2` loses every significant digit when `k` is
/// tiny next to `c`, so the conjugate `2kc / (k + sqrt(k² + 4kc))` is used.
#[must_use]
pub fn dissociated(concentration: f64, k: f64) -> f64 {
    if concentration <= 0.0 || k <= 0.0 {
        return 0.0;
    }
    let disc = (k * k + 4.0 * k * concentration).sqrt();
    (2.0 * k * concentration / (k + disc)).clamp(0.0, concentration)
}

/// Whether `strength` is acceptable for `kind`.
///
/// Water never has a strength. Strong solutes need a value above the
/// concentration ceiling; weak ones need a value inside the weak range.
#[must_use]
pub fn is_valid_strength(kind: SolutionKind, strength: f64, config: &AbsConfig) -> bool {
    match kind {
        SolutionKind::Water => false,
        SolutionKind::StrongAcid | SolutionKind::StrongBase => {
            strength.is_finite() && strength > config.concentration.max
        }
        SolutionKind::WeakAcid | SolutionKind::WeakBase => config.weak_strength.contains(strength),
    }
}
