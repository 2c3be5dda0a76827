//! One solution per variant, plus the active selection.
//!
//! # Mirrors
//!
//! The registry publishes `concentration`, `strength` and `ph` properties
//! that always show the active solution's values. They are kept in sync by
//! delegating subscriptions on the active solution's cells, which are
//! dropped and re-made whenever the active variant changes. The three
//! mirrors are staged together and then published, so a listener on one
//! reads the other two already current.
//!
//! # Switching
//!
//! ```text
//! set_active(next)
//!   validate next is held        (error: nothing changed)
//!   stage active = next          (error: nothing changed)
//!   drop links to previous
//!   copy previous inputs → next  (error: relink previous, revert active)
//!   link next (mirrors catch up immediately)
//!   publish active
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;

use abs_runtime::{Observable, ReadOnlyObservable, Subscription};
use tracing::{debug, warn};

use crate::config::AbsConfig;
use crate::equilibrium;
use crate::error::ModelError;
use crate::solution::{AqueousSolution, SolutionKind, SolutionSnapshot};

/// Arrow-button direction for [`SolutionRegistry::step_concentration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Up,
    Down,
}

/// Plain copy of every solution in a registry and which one is active.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct RegistrySnapshot {
    pub active: SolutionKind,
    pub solutions: Vec<SolutionSnapshot>,
}

pub struct SolutionRegistry {
    config: Rc<AbsConfig>,
    /// Fixed after construction. Always holds `active`.
    solutions: BTreeMap<SolutionKind, AqueousSolution>,
    default_kind: SolutionKind,
    active: Observable<SolutionKind>,
    concentration: Observable<f64>,
    strength: Observable<Option<f64>>,
    ph: Observable<f64>,
    /// Delegating subscriptions on the active solution.
    links: Vec<Subscription>,
}

impl std::fmt::Debug for SolutionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolutionRegistry")
            .field("kinds", &self.solutions.keys().collect::<Vec<_>>())
            .field("active", &self.active.get())
            .field("concentration", &self.concentration.get())
            .field("strength", &self.strength.get())
            .finish_non_exhaustive()
    }
}

impl SolutionRegistry {
    /// A registry holding `kinds`, with `default` active.
    ///
    /// # Errors
    ///
    /// [`ModelError::Config`] when `config` fails [`AbsConfig::validate`],
    /// and [`ModelError::MissingDefault`] when `default` is not in `kinds`.
    pub fn new(
        config: Rc<AbsConfig>,
        kinds: &[SolutionKind],
        default: SolutionKind,
    ) -> Result<Self, ModelError> {
        config.validate()?;
        if !kinds.contains(&default) {
            return Err(ModelError::MissingDefault(default));
        }
        Ok(Self::assemble(config, kinds, default))
    }

    /// All five variants, water active.
    ///
    /// `config` is used as given; run [`AbsConfig::validate`] on hand-built
    /// configs or go through [`SolutionRegistry::new`].
    #[must_use]
    pub fn introduction(config: Rc<AbsConfig>) -> Self {
        Self::assemble(config, &SolutionKind::ALL, SolutionKind::Water)
    }

    /// The four solute variants, weak acid active.
    #[must_use]
    pub fn custom_solution(config: Rc<AbsConfig>) -> Self {
        Self::assemble(
            config,
            &[
                SolutionKind::StrongAcid,
                SolutionKind::WeakAcid,
                SolutionKind::StrongBase,
                SolutionKind::WeakBase,
            ],
            SolutionKind::WeakAcid,
        )
    }

    /// `default` must be one of `kinds`.
    fn assemble(config: Rc<AbsConfig>, kinds: &[SolutionKind], default: SolutionKind) -> Self {
        let solutions: BTreeMap<_, _> = kinds
            .iter()
            .map(|&kind| (kind, AqueousSolution::new(kind, Rc::clone(&config))))
            .collect();
        let mut registry = Self {
            concentration: Observable::new(config.concentration.default),
            strength: Observable::new(default.default_strength(&config)),
            ph: Observable::new(7.0),
            config,
            solutions,
            default_kind: default,
            active: Observable::new(default),
            links: Vec::new(),
        };
        let links = registry.link_kind(default);
        registry.links = links;
        debug!(
            kinds = registry.solutions.len(),
            active = %default,
            "solution registry ready"
        );
        registry
    }

    #[must_use]
    pub fn config(&self) -> &AbsConfig {
        &self.config
    }

    /// Variants held, in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = SolutionKind> + '_ {
        self.solutions.keys().copied()
    }

    #[must_use]
    pub fn solution(&self, kind: SolutionKind) -> Option<&AqueousSolution> {
        self.solutions.get(&kind)
    }

    #[must_use]
    pub fn active_kind(&self) -> ReadOnlyObservable<SolutionKind> {
        self.active.read_only()
    }

    #[must_use]
    pub fn active_solution(&self) -> &AqueousSolution {
        &self.solutions[&self.active.get()]
    }

    /// Concentration of the active solution.
    #[must_use]
    pub fn concentration(&self) -> ReadOnlyObservable<f64> {
        self.concentration.read_only()
    }

    /// Strength of the active solution; `None` while water is active.
    #[must_use]
    pub fn strength(&self) -> ReadOnlyObservable<Option<f64>> {
        self.strength.read_only()
    }

    /// pH of the active solution.
    #[must_use]
    pub fn ph(&self) -> ReadOnlyObservable<f64> {
        self.ph.read_only()
    }

    /// Make `kind` active, carrying the current concentration and strength
    /// over to it.
    ///
    /// The carried concentration is clamped into range. Strength only moves
    /// between weak variants, clamped into the weak range. Strong targets
    /// keep their pinned strength and water takes none. Coming from water or
    /// a strong variant, the target keeps its own strength.
    ///
    /// # Errors
    ///
    /// [`ModelError::UnknownSolution`] if `kind` is not held. On any error
    /// the registry is left as it was.
    pub fn set_active(&mut self, kind: SolutionKind) -> Result<(), ModelError> {
        let previous = self.active.get();
        if kind == previous {
            return Ok(());
        }
        let next = self
            .solutions
            .get(&kind)
            .ok_or(ModelError::UnknownSolution(kind))?;
        let prev = &self.solutions[&previous];
        let concentration = prev.concentration().get();
        let strength = carried_strength(previous, prev.current_strength(), kind, &self.config);

        let staged_active = self.active.stage(kind)?;
        self.links.clear();

        if let Err(err) = next.set_inputs(concentration, strength) {
            if let Some(change) = staged_active {
                change.revert();
            }
            let links = self.link(prev);
            self.links = links;
            return Err(err);
        }

        let links = self.link(next);
        self.links = links;
        if let Some(change) = staged_active {
            change.publish();
        }
        debug!(
            from = %previous,
            to = %kind,
            concentration = self.concentration.get(),
            strength = ?self.strength.get(),
            "active solution switched"
        );
        Ok(())
    }

    /// Activate the variant named by the custom-solution radio buttons.
    ///
    /// # Errors
    ///
    /// Same as [`SolutionRegistry::set_active`].
    pub fn select_custom(&mut self, is_acid: bool, is_weak: bool) -> Result<(), ModelError> {
        self.set_active(SolutionKind::custom(is_acid, is_weak))
    }

    /// Write the active solution's concentration (clamped).
    ///
    /// # Errors
    ///
    /// See [`AqueousSolution::set_concentration`].
    pub fn set_concentration(&self, concentration: f64) -> Result<(), ModelError> {
        self.active_solution().set_concentration(concentration)
    }

    /// Write the active solution's strength.
    ///
    /// # Errors
    ///
    /// See [`AqueousSolution::set_strength`].
    pub fn set_strength(&self, strength: f64) -> Result<(), ModelError> {
        self.active_solution().set_strength(strength)
    }

    /// One arrow-button press on the concentration control.
    ///
    /// # Errors
    ///
    /// See [`AqueousSolution::set_concentration`].
    pub fn step_concentration(&self, direction: StepDirection) -> Result<(), ModelError> {
        let delta = match direction {
            StepDirection::Up => self.config.concentration_step,
            StepDirection::Down => -self.config.concentration_step,
        };
        let stepped = self
            .config
            .concentration
            .step(self.concentration.get(), delta);
        self.set_concentration(stepped)
    }

    /// Whether the arrow button in `direction` would change anything.
    #[must_use]
    pub fn can_step(&self, direction: StepDirection) -> bool {
        let current = self.concentration.get();
        match direction {
            StepDirection::Up => current < self.config.concentration.max,
            StepDirection::Down => current > self.config.concentration.min,
        }
    }

    /// Reset every solution and re-activate the default, without carrying
    /// values across.
    ///
    /// # Errors
    ///
    /// [`ModelError::Reactive`] if called from a listener of a cell it writes.
    pub fn reset(&mut self) -> Result<(), ModelError> {
        for solution in self.solutions.values() {
            solution.reset()?;
        }
        self.activate_without_carry(self.default_kind)?;
        debug!(active = %self.default_kind, "solution registry reset");
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            active: self.active.get(),
            solutions: self.solutions.values().map(AqueousSolution::snapshot).collect(),
        }
    }

    /// Load inputs and the active selection from a snapshot. Derived values
    /// in the snapshot are ignored and recomputed.
    ///
    /// # Errors
    ///
    /// Any variant the registry does not hold, or any input its solution
    /// would reject, fails the whole restore before anything changes.
    pub fn restore(&mut self, snapshot: &RegistrySnapshot) -> Result<(), ModelError> {
        if !self.solutions.contains_key(&snapshot.active) {
            return Err(ModelError::UnknownSolution(snapshot.active));
        }
        for saved in &snapshot.solutions {
            validate_snapshot(saved, &self.config)?;
            if !self.solutions.contains_key(&saved.kind) {
                return Err(ModelError::UnknownSolution(saved.kind));
            }
        }

        for saved in &snapshot.solutions {
            self.solutions[&saved.kind].set_inputs(saved.concentration, saved.strength)?;
        }
        self.activate_without_carry(snapshot.active)?;
        debug!(
            active = %snapshot.active,
            solutions = snapshot.solutions.len(),
            "solution registry restored"
        );
        Ok(())
    }

    /// Drop all links and listeners. The registry is inert afterwards.
    pub fn dispose(&mut self) {
        self.links.clear();
        for solution in self.solutions.values() {
            solution.dispose();
        }
        self.active.dispose();
        self.concentration.dispose();
        self.strength.dispose();
        self.ph.dispose();
    }

    fn activate_without_carry(&mut self, kind: SolutionKind) -> Result<(), ModelError> {
        if self.active.get() == kind {
            return Ok(());
        }
        let staged_active = self.active.stage(kind)?;
        self.links.clear();
        let links = self.link_kind(kind);
        self.links = links;
        if let Some(change) = staged_active {
            change.publish();
        }
        Ok(())
    }

    fn link_kind(&self, kind: SolutionKind) -> Vec<Subscription> {
        match self.solutions.get(&kind) {
            Some(solution) => self.link(solution),
            None => Vec::new(),
        }
    }

    fn mirrors(&self) -> Mirrors {
        Mirrors {
            concentration: self.concentration.clone(),
            strength: self.strength.clone(),
            ph: self.ph.clone(),
        }
    }

    /// Subscribe the mirrors to `solution` and bring them up to date.
    ///
    /// Any change on a linked cell re-syncs all three mirrors at once. The
    /// solution stages every cell before publishing the first, so the values
    /// read here are already final.
    fn link(&self, solution: &AqueousSolution) -> Vec<Subscription> {
        let mut sources = vec![solution.concentration(), solution.ph()];
        sources.extend(solution.strength());

        let mirrors = self.mirrors();
        let concentration = solution.concentration();
        let strength = solution.strength();
        let ph = solution.ph();
        let sync: Rc<dyn Fn()> = Rc::new(move || {
            mirrors.sync(
                concentration.get(),
                strength.as_ref().map(|cell| cell.get()),
                ph.get(),
            );
        });

        let links = sources
            .iter()
            .map(|cell| {
                let sync = Rc::clone(&sync);
                cell.subscribe(move |_, _| sync())
            })
            .collect();
        sync();
        links
    }
}

/// Registry-side handles on the mirror cells.
struct Mirrors {
    concentration: Observable<f64>,
    strength: Observable<Option<f64>>,
    ph: Observable<f64>,
}

impl Mirrors {
    /// Stage all three mirrors, then publish. A listener on one mirror reads
    /// the other two already updated.
    fn sync(&self, concentration: f64, strength: Option<f64>, ph: f64) {
        let staged = (
            self.concentration.stage(concentration),
            self.strength.stage(strength),
            self.ph.stage(ph),
        );
        match staged {
            (Ok(concentration), Ok(strength), Ok(ph)) => {
                if let Some(change) = concentration {
                    change.publish();
                }
                if let Some(change) = strength {
                    change.publish();
                }
                if let Some(change) = ph {
                    change.publish();
                }
            }
            (concentration, strength, ph) => {
                if let Ok(Some(change)) = ph {
                    change.revert();
                }
                if let Ok(Some(change)) = strength {
                    change.revert();
                }
                if let Ok(Some(change)) = concentration {
                    change.revert();
                }
                warn!("mirror sync rejected; mirrors keep their previous values");
            }
        }
    }
}

/// Strength carried onto `next` during a switch; `None` keeps its own.
///
/// A strong variant's pinned strength is not a user value, so only weak to
/// weak switches carry anything.
fn carried_strength(
    previous: SolutionKind,
    strength: Option<f64>,
    next: SolutionKind,
    config: &AbsConfig,
) -> Option<f64> {
    if !(previous.is_weak() && next.is_weak()) {
        return None;
    }
    strength.map(|strength| config.weak_strength.clamp(strength))
}

fn validate_snapshot(saved: &SolutionSnapshot, config: &AbsConfig) -> Result<(), ModelError> {
    if saved.concentration.is_nan() {
        return Err(ModelError::NonFinite {
            name: "concentration",
            value: saved.concentration,
        });
    }
    if let Some(strength) = saved.strength {
        if !saved.kind.has_strength() {
            return Err(ModelError::StrengthNotApplicable { kind: saved.kind });
        }
        if !equilibrium::is_valid_strength(saved.kind, strength, config) {
            return Err(ModelError::InvalidStrength {
                kind: saved.kind,
                strength,
            });
        }
    }
    Ok(())
}
