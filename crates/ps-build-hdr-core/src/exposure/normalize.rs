//! EV range normalization.
//!
//! The merge engine accepts exposure values in `[-10, 10]`. A batch whose
//! maximum exceeds 10 is shifted down so the maximum lands on 10; otherwise a
//! batch whose minimum is below -10 is shifted up so the minimum lands on -10.
//! Only one bound is corrected per call: a batch spanning more than 20 stops
//! keeps the opposite bound out of range.

use crate::types::{Batch, EvMap, ExposureSample, ImageRef};

/// Magnitude of the engine's accepted EV range.
pub const EV_LIMIT: f64 = 10.0;

/// Offset to add to every value of a batch with the given extremes.
fn shift_for(min: f64, max: f64) -> f64 {
    if max > EV_LIMIT {
        -(max - EV_LIMIT)
    } else if min < -EV_LIMIT {
        -(min + EV_LIMIT)
    } else {
        0.0
    }
}

/// Shift a batch's EVs into the engine's range, preserving their spacing.
pub fn normalize(evs: &EvMap) -> EvMap {
    let max = evs.values().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = evs.values().copied().fold(f64::INFINITY, f64::min);
    let shift = shift_for(min, max);
    if shift == 0.0 {
        return evs.clone();
    }
    tracing::debug!("EV range [{min:.3}, {max:.3}] out of bounds, shifting by {shift:.3}");

    evs.iter()
        .map(|(image, &ev)| {
            let shifted = ev + shift;
            // Pin the corrected bound against rounding so a second pass is a no-op.
            let shifted = if shift < 0.0 {
                shifted.min(EV_LIMIT)
            } else {
                shifted.max(-EV_LIMIT)
            };
            (image.clone(), shifted)
        })
        .collect()
}

/// Normalized EVs for one batch, consumed by the merge stage.
#[derive(Debug, Clone, PartialEq)]
pub struct EvWindow {
    evs: EvMap,
}

impl EvWindow {
    /// Build the window from a batch's samples.
    pub fn from_samples(samples: &[ExposureSample]) -> Self {
        let raw: EvMap = samples.iter().map(|s| (s.image.clone(), s.ev)).collect();
        Self {
            evs: normalize(&raw),
        }
    }

    pub fn ev(&self, image: &ImageRef) -> Option<f64> {
        self.evs.get(image).copied()
    }

    /// EVs in batch order, one per input image.
    pub fn values_for(&self, batch: &Batch) -> Option<Vec<f64>> {
        batch.images().iter().map(|image| self.ev(image)).collect()
    }
}
