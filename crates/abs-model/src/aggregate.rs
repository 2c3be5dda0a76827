//! pH and equilibrium bar-chart readings.
//!
//! Pure functions over concentrations. The bar chart is log-scaled: a bar
//! of `scale_height` spans ten decades, anchored so `1e-8` mol/L has zero
//! height.

use std::fmt;

use crate::config::ValueRange;

/// Display range of pH.
pub const PH_RANGE: ValueRange = ValueRange::new(0.0, 14.0, 7.0);

/// Concentrations below this are labelled negligible and get no bar.
pub const NEGLIGIBLE_CONCENTRATION: f64 = 1e-13;

const BAR_LOG_OFFSET: f64 = 8.0;
const BAR_DECADES: f64 = 10.0;

/// `-log10([H3O+])`, clamped to [`PH_RANGE`].
///
/// Non-positive (or NaN) input is treated as the most basic reading.
#[must_use]
pub fn ph(h3o_concentration: f64) -> f64 {
    if h3o_concentration.is_nan() || h3o_concentration <= 0.0 {
        return PH_RANGE.max;
    }
    PH_RANGE.clamp(-h3o_concentration.log10())
}

/// Height classification of one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarMagnitude {
    Negligible,
    Height(f64),
}

impl BarMagnitude {
    #[must_use]
    pub fn height(self) -> Option<f64> {
        match self {
            Self::Negligible => None,
            Self::Height(h) => Some(h),
        }
    }
}

/// `|log10(c) + 8| * scale_height / 10`, or negligible below `1e-13`.
#[must_use]
pub fn bar_magnitude(concentration: f64, scale_height: f64) -> BarMagnitude {
    if concentration.is_nan() || concentration < NEGLIGIBLE_CONCENTRATION {
        return BarMagnitude::Negligible;
    }
    BarMagnitude::Height((concentration.log10() + BAR_LOG_OFFSET).abs() * scale_height / BAR_DECADES)
}

/// Text shown on a bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarLabel {
    Negligible,
    /// `mantissa x 10^exponent`, mantissa rounded to two decimals.
    Scientific { mantissa: f64, exponent: i32 },
    /// Values above 1 mol/L (solvent water), one decimal.
    Decimal(f64),
}

impl fmt::Display for BarLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negligible => f.write_str("negligible"),
            Self::Scientific { mantissa, exponent } => write!(f, "{mantissa:.2} x 10^{exponent}"),
            Self::Decimal(value) => write!(f, "{value:.1}"),
        }
    }
}

#[must_use]
pub fn bar_label(concentration: f64) -> BarLabel {
    if concentration.is_nan() || concentration < NEGLIGIBLE_CONCENTRATION {
        return BarLabel::Negligible;
    }
    if concentration > 1.0 {
        return BarLabel::Decimal(concentration);
    }
    let mut exponent = concentration.log10().floor() as i32;
    let mut mantissa = concentration / 10f64.powi(exponent);
    // 9.996 would print as 10.00.
    if (mantissa - 10.0).abs() < 1e-2 {
        exponent += 1;
        mantissa = 1.0;
    }
    BarLabel::Scientific {
        mantissa: (mantissa * 100.0).round() / 100.0,
        exponent,
    }
}

/// Everything a bar needs: its height class and its label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarReading {
    pub magnitude: BarMagnitude,
    pub label: BarLabel,
}

#[must_use]
pub fn bar_reading(concentration: f64, scale_height: f64) -> BarReading {
    BarReading {
        magnitude: bar_magnitude(concentration, scale_height),
        label: bar_label(concentration),
    }
}
