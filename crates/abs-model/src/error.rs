//! Error types for the equilibrium model.
//!
//! Out-of-range user input is clamped and never reaches these types. What
//! remains are caller bugs (strength on water, a strength outside the
//! variant's policy, NaN) and registry lookups for variants it does not hold.

use std::fmt;

use abs_runtime::ReactiveError;

use crate::solution::SolutionKind;

/// Errors from an invalid [`crate::AbsConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A range has non-finite or non-positive bounds, or its default lies outside it.
    InvalidRange {
        name: &'static str,
        min: f64,
        max: f64,
        default: f64,
    },
    /// A scalar setting is out of its allowed domain.
    InvalidValue { name: &'static str, value: f64 },
    /// An environment override could not be parsed.
    Env { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRange {
                name,
                min,
                max,
                default,
            } => write!(
                f,
                "invalid range '{name}': [{min:e}, {max:e}] with default {default:e}"
            ),
            Self::InvalidValue { name, value } => write!(f, "invalid value for '{name}': {value:e}"),
            Self::Env { key, value } => write!(f, "cannot parse {key}={value:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors from solution and registry operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Strength was written on a solution that has none (water).
    StrengthNotApplicable { kind: SolutionKind },
    /// The strength fails the variant's validity policy.
    InvalidStrength { kind: SolutionKind, strength: f64 },
    /// A NaN input.
    NonFinite { name: &'static str, value: f64 },
    /// The registry does not hold this variant.
    UnknownSolution(SolutionKind),
    /// No variant has this name.
    UnknownSolutionName(String),
    /// The registry's default variant is not among the variants it holds.
    MissingDefault(SolutionKind),
    /// A property write was refused.
    Reactive(ReactiveError),
    /// The registry was given a config that fails [`crate::AbsConfig::validate`].
    Config(ConfigError),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrengthNotApplicable { kind } => write!(f, "{kind} has no strength"),
            Self::InvalidStrength { kind, strength } => {
                write!(f, "strength {strength:e} is not valid for {kind}")
            }
            Self::NonFinite { name, value } => write!(f, "{name} must be a number, got {value}"),
            Self::UnknownSolution(kind) => write!(f, "solution {kind} is not available here"),
            Self::UnknownSolutionName(name) => write!(f, "unknown solution '{name}'"),
            Self::MissingDefault(kind) => {
                write!(f, "default solution {kind} is not in the registry")
            }
            Self::Reactive(err) => write!(f, "property update failed: {err}"),
            Self::Config(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Reactive(err) => Some(err),
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ReactiveError> for ModelError {
    fn from(err: ReactiveError) -> Self {
        Self::Reactive(err)
    }
}

impl From<ConfigError> for ModelError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}
