//! Model-wide constants and input ranges.
//!
//! [`AbsConfig`] is built once at startup and shared as `Rc<AbsConfig>` by
//! every solution and by the registry. Nothing reads these values from
//! global state.
//!
//! # Environment overrides
//!
//! [`AbsConfig::from_env`] starts from the defaults and applies:
//!
//! | Variable | Field |
//! |---|---|
//! | `ABS_CONCENTRATION_DEFAULT` | `concentration.default` |
//! | `ABS_WEAK_STRENGTH_DEFAULT` | `weak_strength.default` |
//! | `ABS_CONCENTRATION_STEP` | `concentration_step` |

use crate::error::ConfigError;

/// A closed interval with a default value inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl ValueRange {
    #[must_use]
    pub const fn new(min: f64, max: f64, default: f64) -> Self {
        Self { min, max, default }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp into `[min, max]`. NaN passes through unchanged.
    ///
    /// Never panics, even on an inverted range; `min` wins there.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// `value + delta`, clamped.
    #[must_use]
    pub fn step(&self, value: f64, delta: f64) -> f64 {
        self.clamp(value + delta)
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        let finite = self.min.is_finite() && self.max.is_finite() && self.default.is_finite();
        if !finite || self.min <= 0.0 || self.min > self.max || !self.contains(self.default) {
            return Err(ConfigError::InvalidRange {
                name,
                min: self.min,
                max: self.max,
                default: self.default,
            });
        }
        Ok(())
    }
}

/// Upper bound of the weak-strength range; strong solutes sit just above it.
const WEAK_STRENGTH_MAX: f64 = 1e2;

/// Constants and ranges of the equilibrium model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AbsConfig {
    /// Analytical solute concentration, mol/L. Default: `[1e-3, 1]`, `1e-2`.
    pub concentration: ValueRange,

    /// Ka or Kb of a weak solute. Default: `[1e-10, 1e2]`, `1e-7`.
    pub weak_strength: ValueRange,

    /// Pinned strength of strong solutes. Must exceed both range maxima.
    /// Default: 101.
    pub strong_strength: f64,

    /// Kw = [H3O+][OH-]. Default: 1e-14.
    pub water_equilibrium_constant: f64,

    /// Concentration of water as the solvent, mol/L. Default: 55.6.
    pub water_concentration: f64,

    /// Concentration delta of one arrow-button press. Default: 0.1.
    pub concentration_step: f64,
}

impl Default for AbsConfig {
    fn default() -> Self {
        Self {
            concentration: ValueRange::new(1e-3, 1.0, 1e-2),
            weak_strength: ValueRange::new(1e-10, WEAK_STRENGTH_MAX, 1e-7),
            strong_strength: WEAK_STRENGTH_MAX + 1.0,
            water_equilibrium_constant: 1e-14,
            water_concentration: 55.6,
            concentration_step: 0.1,
        }
    }
}

impl AbsConfig {
    #[must_use]
    pub fn with_concentration_range(mut self, range: ValueRange) -> Self {
        self.concentration = range;
        self
    }

    #[must_use]
    pub fn with_weak_strength_range(mut self, range: ValueRange) -> Self {
        self.weak_strength = range;
        self
    }

    #[must_use]
    pub fn with_concentration_step(mut self, step: f64) -> Self {
        self.concentration_step = step;
        self
    }

    /// Check every range and constant.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidRange`] or [`ConfigError::InvalidValue`] for the
    /// first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.concentration.validate("concentration")?;
        self.weak_strength.validate("weak_strength")?;
        positive("water_equilibrium_constant", self.water_equilibrium_constant)?;
        positive("water_concentration", self.water_concentration)?;
        positive("concentration_step", self.concentration_step)?;
        if !(self.strong_strength > self.concentration.max
            && self.strong_strength > self.weak_strength.max)
        {
            return Err(ConfigError::InvalidValue {
                name: "strong_strength",
                value: self.strong_strength,
            });
        }
        Ok(())
    }

    /// Defaults with environment overrides applied, then validated.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Env`] for an unparseable variable, or any
    /// [`AbsConfig::validate`] failure.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// [`AbsConfig::from_env`] with an injectable variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AbsConfig::from_env`].
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = env_f64(&lookup, "ABS_CONCENTRATION_DEFAULT")? {
            config.concentration.default = v;
        }
        if let Some(v) = env_f64(&lookup, "ABS_WEAK_STRENGTH_DEFAULT")? {
            config.weak_strength.default = v;
        }
        if let Some(v) = env_f64(&lookup, "ABS_CONCENTRATION_STEP")? {
            config.concentration_step = v;
        }
        config.validate()?;
        tracing::debug!(?config, "equilibrium config loaded");
        Ok(config)
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue { name, value })
    }
}

fn env_f64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<f64>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ConfigError::Env { key, value: raw }),
    }
}
