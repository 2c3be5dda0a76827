//! Aqueous solutions and their observable equilibrium state.
//!
//! # Design
//!
//! The five variants form a closed set, so [`SolutionKind`] is a plain enum
//! and [`AqueousSolution`] dispatches on it with `match`. Inputs
//! (concentration, strength) and derived concentrations are all
//! [`Observable`] cells owned by the solution and handed out read-only.
//!
//! # Consistency
//!
//! A write stages the new inputs and every derived value before any
//! listener runs, then publishes them in dependency order:
//!
//! ```text
//! acids, water : concentration, strength, H3O+, solute, product, OH-, H2O, pH
//! bases        : concentration, strength, OH-,  solute, product, H3O+, H2O, pH
//! ```
//!
//! A listener on any of these cells therefore reads a fully updated state,
//! and `[H3O+][OH-] == Kw` holds at every observation point.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use abs_runtime::{Observable, ReadOnlyObservable};

use crate::aggregate;
use crate::config::AbsConfig;
use crate::equilibrium::{self, DerivedConcentrations};
use crate::error::ModelError;

/// The closed set of solution variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum SolutionKind {
    Water,
    StrongAcid,
    WeakAcid,
    StrongBase,
    WeakBase,
}

impl SolutionKind {
    pub const ALL: [SolutionKind; 5] = [
        Self::Water,
        Self::StrongAcid,
        Self::WeakAcid,
        Self::StrongBase,
        Self::WeakBase,
    ];

    /// The variant picked by the custom-solution acid/base and weak/strong
    /// radio buttons.
    #[must_use]
    pub const fn custom(is_acid: bool, is_weak: bool) -> Self {
        match (is_acid, is_weak) {
            (true, true) => Self::WeakAcid,
            (true, false) => Self::StrongAcid,
            (false, true) => Self::WeakBase,
            (false, false) => Self::StrongBase,
        }
    }

    #[must_use]
    pub const fn is_acid(self) -> bool {
        matches!(self, Self::StrongAcid | Self::WeakAcid)
    }

    #[must_use]
    pub const fn is_base(self) -> bool {
        matches!(self, Self::StrongBase | Self::WeakBase)
    }

    #[must_use]
    pub const fn is_weak(self) -> bool {
        matches!(self, Self::WeakAcid | Self::WeakBase)
    }

    #[must_use]
    pub const fn is_strong(self) -> bool {
        matches!(self, Self::StrongAcid | Self::StrongBase)
    }

    /// Water has no dissociation constant.
    #[must_use]
    pub const fn has_strength(self) -> bool {
        !matches!(self, Self::Water)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::StrongAcid => "strong-acid",
            Self::WeakAcid => "weak-acid",
            Self::StrongBase => "strong-base",
            Self::WeakBase => "weak-base",
        }
    }

    /// Species shown for this variant, in bar-chart order.
    #[must_use]
    pub const fn species(self) -> &'static [Species] {
        match self {
            Self::Water => &[Species::Water, Species::Hydronium, Species::Hydroxide],
            Self::StrongAcid | Self::WeakAcid => &[
                Species::Solute,
                Species::Water,
                Species::Product,
                Species::Hydronium,
            ],
            Self::StrongBase => &[Species::Solute, Species::Product, Species::Hydroxide],
            Self::WeakBase => &[
                Species::Solute,
                Species::Water,
                Species::Product,
                Species::Hydroxide,
            ],
        }
    }

    /// Chemical symbol of `species` in this variant, `None` where water has
    /// no solute.
    #[must_use]
    pub const fn symbol(self, species: Species) -> Option<&'static str> {
        match (self, species) {
            (_, Species::Water) => Some("H2O"),
            (_, Species::Hydronium) => Some("H3O+"),
            (_, Species::Hydroxide) => Some("OH-"),
            (Self::Water, _) => None,
            (Self::StrongAcid | Self::WeakAcid, Species::Solute) => Some("HA"),
            (Self::StrongAcid | Self::WeakAcid, Species::Product) => Some("A-"),
            (Self::StrongBase, Species::Solute) => Some("MOH"),
            (Self::StrongBase, Species::Product) => Some("M+"),
            (Self::WeakBase, Species::Solute) => Some("B"),
            (Self::WeakBase, Species::Product) => Some("BH+"),
        }
    }

    /// Strength a fresh solution of this variant starts with.
    #[must_use]
    pub fn default_strength(self, config: &AbsConfig) -> Option<f64> {
        match self {
            Self::Water => None,
            Self::StrongAcid | Self::StrongBase => Some(config.strong_strength),
            Self::WeakAcid | Self::WeakBase => Some(config.weak_strength.default),
        }
    }
}

impl fmt::Display for SolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolutionKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| ModelError::UnknownSolutionName(s.to_string()))
    }
}

/// Role of a molecule in a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum Species {
    /// Undissociated solute.
    Solute,
    /// Conjugate ion produced by dissociation.
    Product,
    Hydronium,
    Hydroxide,
    Water,
}

/// Plain copy of a solution's inputs and outputs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct SolutionSnapshot {
    pub kind: SolutionKind,
    pub concentration: f64,
    pub strength: Option<f64>,
    pub derived: DerivedConcentrations,
    pub ph: f64,
}

/// One solution variant with observable inputs and equilibrium outputs.
pub struct AqueousSolution {
    kind: SolutionKind,
    config: Rc<AbsConfig>,
    concentration: Observable<f64>,
    strength: Option<Observable<f64>>,
    solute: Observable<f64>,
    product: Observable<f64>,
    h3o: Observable<f64>,
    oh: Observable<f64>,
    h2o: Observable<f64>,
    ph: Observable<f64>,
}

impl fmt::Debug for AqueousSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AqueousSolution")
            .field("kind", &self.kind)
            .field("concentration", &self.concentration.get())
            .field("strength", &self.current_strength())
            .field("h3o", &self.h3o.get())
            .field("oh", &self.oh.get())
            .finish_non_exhaustive()
    }
}

impl AqueousSolution {
    /// A solution at the configured default concentration and strength.
    ///
    /// `config` is used as given; run [`AbsConfig::validate`] on hand-built
    /// configs first.
    #[must_use]
    pub fn new(kind: SolutionKind, config: Rc<AbsConfig>) -> Self {
        let concentration = config.concentration.default;
        let strength = kind.default_strength(&config);
        let derived = equilibrium::derive(kind, concentration, strength, &config);
        Self {
            kind,
            concentration: Observable::new(concentration),
            strength: strength.map(Observable::new),
            solute: Observable::new(derived.solute),
            product: Observable::new(derived.product),
            h3o: Observable::new(derived.h3o),
            oh: Observable::new(derived.oh),
            h2o: Observable::new(derived.h2o),
            ph: Observable::new(aggregate::ph(derived.h3o)),
            config,
        }
    }

    #[must_use]
    pub fn kind(&self) -> SolutionKind {
        self.kind
    }

    #[must_use]
    pub fn config(&self) -> &AbsConfig {
        &self.config
    }

    #[must_use]
    pub fn concentration(&self) -> ReadOnlyObservable<f64> {
        self.concentration.read_only()
    }

    /// `None` for water.
    #[must_use]
    pub fn strength(&self) -> Option<ReadOnlyObservable<f64>> {
        self.strength.as_ref().map(Observable::read_only)
    }

    #[must_use]
    pub fn solute(&self) -> ReadOnlyObservable<f64> {
        self.solute.read_only()
    }

    #[must_use]
    pub fn product(&self) -> ReadOnlyObservable<f64> {
        self.product.read_only()
    }

    #[must_use]
    pub fn h3o(&self) -> ReadOnlyObservable<f64> {
        self.h3o.read_only()
    }

    #[must_use]
    pub fn oh(&self) -> ReadOnlyObservable<f64> {
        self.oh.read_only()
    }

    #[must_use]
    pub fn h2o(&self) -> ReadOnlyObservable<f64> {
        self.h2o.read_only()
    }

    #[must_use]
    pub fn ph(&self) -> ReadOnlyObservable<f64> {
        self.ph.read_only()
    }

    /// Current value of the cell backing `species`.
    #[must_use]
    pub fn concentration_of(&self, species: Species) -> f64 {
        match species {
            Species::Solute => self.solute.get(),
            Species::Product => self.product.get(),
            Species::Hydronium => self.h3o.get(),
            Species::Hydroxide => self.oh.get(),
            Species::Water => self.h2o.get(),
        }
    }

    #[must_use]
    pub fn derived(&self) -> DerivedConcentrations {
        DerivedConcentrations {
            solute: self.solute.get(),
            product: self.product.get(),
            h3o: self.h3o.get(),
            oh: self.oh.get(),
            h2o: self.h2o.get(),
        }
    }

    #[must_use]
    pub fn current_strength(&self) -> Option<f64> {
        self.strength.as_ref().map(Observable::get)
    }

    /// Set the analytical concentration, clamped into the configured range.
    ///
    /// # Errors
    ///
    /// [`ModelError::NonFinite`] for NaN; [`ModelError::Reactive`] if a
    /// listener of this solution triggered the write.
    pub fn set_concentration(&self, concentration: f64) -> Result<(), ModelError> {
        self.set_inputs(concentration, None)
    }

    /// Set Ka/Kb.
    ///
    /// # Errors
    ///
    /// [`ModelError::StrengthNotApplicable`] on water;
    /// [`ModelError::InvalidStrength`] when the value fails
    /// [`equilibrium::is_valid_strength`].
    pub fn set_strength(&self, strength: f64) -> Result<(), ModelError> {
        self.set_inputs(self.concentration.get(), Some(strength))
    }

    /// Set concentration and, optionally, strength as one update.
    ///
    /// Listeners are notified once per changed cell, after every cell holds
    /// its new value. Nothing changes if validation fails.
    ///
    /// # Errors
    ///
    /// Same as [`AqueousSolution::set_concentration`] and
    /// [`AqueousSolution::set_strength`].
    pub fn set_inputs(&self, concentration: f64, strength: Option<f64>) -> Result<(), ModelError> {
        if concentration.is_nan() {
            return Err(ModelError::NonFinite {
                name: "concentration",
                value: concentration,
            });
        }
        if let Some(strength) = strength {
            if !self.kind.has_strength() {
                return Err(ModelError::StrengthNotApplicable { kind: self.kind });
            }
            if !equilibrium::is_valid_strength(self.kind, strength, &self.config) {
                return Err(ModelError::InvalidStrength {
                    kind: self.kind,
                    strength,
                });
            }
        }
        let concentration = self.config.concentration.clamp(concentration);
        self.apply(concentration, strength.or_else(|| self.current_strength()))
    }

    /// Restore the construction-time inputs.
    ///
    /// # Errors
    ///
    /// [`ModelError::Reactive`] if called from one of this solution's listeners.
    pub fn reset(&self) -> Result<(), ModelError> {
        self.apply(
            self.concentration.initial(),
            self.strength.as_ref().map(Observable::initial),
        )
    }

    #[must_use]
    pub fn snapshot(&self) -> SolutionSnapshot {
        SolutionSnapshot {
            kind: self.kind,
            concentration: self.concentration.get(),
            strength: self.current_strength(),
            derived: self.derived(),
            ph: self.ph.get(),
        }
    }

    /// Drop every listener on every cell and refuse further writes.
    pub fn dispose(&self) {
        for cell in self.cells() {
            cell.dispose();
        }
        if let Some(strength) = &self.strength {
            strength.dispose();
        }
    }

    fn cells(&self) -> [&Observable<f64>; 7] {
        [
            &self.concentration,
            &self.solute,
            &self.product,
            &self.h3o,
            &self.oh,
            &self.h2o,
            &self.ph,
        ]
    }

    /// Stage inputs and derived values, then publish in dependency order.
    fn apply(&self, concentration: f64, strength: Option<f64>) -> Result<(), ModelError> {
        let derived = equilibrium::derive(self.kind, concentration, strength, &self.config);
        let ph = aggregate::ph(derived.h3o);

        let mut writes: Vec<(&Observable<f64>, f64)> = Vec::with_capacity(8);
        writes.push((&self.concentration, concentration));
        if let (Some(cell), Some(value)) = (&self.strength, strength) {
            writes.push((cell, value));
        }
        // The ion set directly by the solute goes first; its water partner
        // follows from Kw.
        if self.kind.is_base() {
            writes.extend([
                (&self.oh, derived.oh),
                (&self.solute, derived.solute),
                (&self.product, derived.product),
                (&self.h3o, derived.h3o),
            ]);
        } else {
            writes.extend([
                (&self.h3o, derived.h3o),
                (&self.solute, derived.solute),
                (&self.product, derived.product),
                (&self.oh, derived.oh),
            ]);
        }
        writes.extend([(&self.h2o, derived.h2o), (&self.ph, ph)]);

        let mut staged = Vec::with_capacity(writes.len());
        for (cell, value) in writes {
            match cell.stage(value) {
                Ok(Some(change)) => staged.push(change),
                Ok(None) => {}
                Err(err) => {
                    for change in staged.into_iter().rev() {
                        change.revert();
                    }
                    return Err(err.into());
                }
            }
        }

        tracing::trace!(
            kind = %self.kind,
            concentration,
            ?strength,
            h3o = derived.h3o,
            oh = derived.oh,
            changed = staged.len(),
            "solution recomputed"
        );
        for change in staged {
            change.publish();
        }
        Ok(())
    }
}
