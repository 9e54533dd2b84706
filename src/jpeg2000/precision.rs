//! Sample precision conversion.
//!
//! Two policies are available: scaling (the sample keeps its relative
//! position in the range) and clipping (the sample value is kept and
//! clamped to the new range).

use super::image::{Component, max_sample_value};
use crate::constants::{MAXIMUM_PRECISION, MINIMUM_PRECISION};
use crate::error::NormalizeError;

/// How component samples are brought to a new precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrecisionMode {
    #[default]
    Scale,
    Clip,
}

impl PrecisionMode {
    pub fn apply(self, component: &mut Component, target: u32) -> Result<(), NormalizeError> {
        match self {
            Self::Scale => rescale_component_precision(component, target),
            Self::Clip => clip_component(component, target),
        }
    }
}

/// Rescales every sample of `component` to `target` bits of precision.
///
/// Widening multiplies into the new range using 64-bit intermediates;
/// narrowing shifts right, arithmetically for signed samples.
pub fn rescale_component_precision(
    component: &mut Component,
    target: u32,
) -> Result<(), NormalizeError> {
    check_precision(target)?;
    check_precision(component.precision)?;
    let current = component.precision;
    if current == target {
        return Ok(());
    }

    if current < target {
        if component.is_signed {
            let new_max = 1i64 << (target - 1);
            let old_max = 1i64 << (current - 1);
            for sample in &mut component.data {
                *sample = (*sample as i64 * new_max / old_max) as i32;
            }
        } else {
            let new_max = max_sample_value(target);
            let old_max = max_sample_value(current);
            for sample in &mut component.data {
                *sample = (*sample as u32 as u64 * new_max / old_max) as u32 as i32;
            }
        }
    } else {
        let shift = current - target;
        if component.is_signed {
            for sample in &mut component.data {
                *sample >>= shift;
            }
        } else {
            for sample in &mut component.data {
                *sample = ((*sample as u32) >> shift) as i32;
            }
        }
    }

    component.precision = target;
    Ok(())
}

/// Clamps every sample of `component` into the `target`-bit range.
pub fn clip_component(component: &mut Component, target: u32) -> Result<(), NormalizeError> {
    check_precision(target)?;
    let umax = max_sample_value(target) as u32;

    if component.is_signed {
        let max = (umax / 2) as i32;
        let min = -max - 1;
        for sample in &mut component.data {
            *sample = (*sample).clamp(min, max);
        }
    } else {
        for sample in &mut component.data {
            *sample = (*sample as u32).min(umax) as i32;
        }
    }

    component.precision = target;
    Ok(())
}

/// Re-centers signed samples into the unsigned range by adding `2^(prec-1)`.
pub fn level_shift_to_unsigned(component: &mut Component) -> Result<(), NormalizeError> {
    if !component.is_signed {
        return Ok(());
    }
    check_precision(component.precision)?;
    let shift = 1i64 << (component.precision - 1);
    for sample in &mut component.data {
        *sample = (*sample as i64 + shift) as i32;
    }
    component.is_signed = false;
    Ok(())
}

fn check_precision(precision: u32) -> Result<(), NormalizeError> {
    if (MINIMUM_PRECISION..=MAXIMUM_PRECISION).contains(&precision) {
        Ok(())
    } else {
        Err(NormalizeError::InvalidPrecision(precision))
    }
}
