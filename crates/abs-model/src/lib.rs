#![forbid(unsafe_code)]

//! Model: acid-base equilibrium for aqueous solutions.
//!
//! # Role in Acid-Base Solutions
//! `abs-model` turns user inputs (concentration, strength, which solution is
//! selected) into the derived quantities a presentation layer draws: pH,
//! per-species concentrations, and bar-chart magnitudes.
//!
//! # Primary responsibilities
//! - **AbsConfig**: the immutable constants and input ranges, built once.
//! - **equilibrium**: closed-form concentrations for each solution variant.
//! - **AqueousSolution**: observable inputs and derived concentrations that
//!   stay consistent (`[H3O+][OH-] = Kw`) across every notification.
//! - **SolutionRegistry**: one solution per variant, the active selection,
//!   and mirror properties that follow whichever solution is active.
//! - **aggregate**: pH and log-scale bar readings.
//!
//! # How it fits in the system
//! All state is published through [`abs_runtime::Observable`]. The host
//! subscribes to the read-only views and writes only through the model's
//! methods, which clamp or validate before recomputing.

pub mod aggregate;
pub mod config;
pub mod equilibrium;
pub mod error;
pub mod registry;
pub mod solution;

pub use aggregate::{BarLabel, BarMagnitude, BarReading, bar_label, bar_magnitude, bar_reading, ph};
pub use config::{AbsConfig, ValueRange};
pub use equilibrium::DerivedConcentrations;
pub use error::{ConfigError, ModelError};
pub use registry::{RegistrySnapshot, SolutionRegistry, StepDirection};
pub use solution::{AqueousSolution, SolutionKind, SolutionSnapshot, Species};
