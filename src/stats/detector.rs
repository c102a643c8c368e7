//! ITCZ Detector Module
//! Latitude of maximum precipitation within a restricted band.

use crate::stats::ItczError;
use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Inclusive latitude band searched for the precipitation maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatBand {
    pub south: f64,
    pub north: f64,
}

impl Default for LatBand {
    fn default() -> Self {
        Self {
            south: -20.0,
            north: 20.0,
        }
    }
}

impl LatBand {
    pub fn contains(&self, lat: f64) -> bool {
        lat >= self.south && lat <= self.north
    }

    pub fn is_valid(&self) -> bool {
        self.south.is_finite() && self.north.is_finite() && self.south <= self.north
    }
}

/// Indices of `lat` inside `band`, in axis order.
pub fn band_indices(lat: &[f64], band: &LatBand) -> Result<Vec<usize>, ItczError> {
    let idx: Vec<usize> = lat
        .iter()
        .enumerate()
        .filter(|(_, l)| band.contains(**l))
        .map(|(i, _)| i)
        .collect();
    if idx.is_empty() {
        return Err(ItczError::EmptyBand {
            south: band.south,
            north: band.north,
        });
    }
    Ok(idx)
}

/// Position of the first maximum among non-NaN values.
fn first_argmax(values: impl Iterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// ITCZ latitude of a zonal-mean profile.
pub fn detect_profile(
    profile: ArrayView1<f64>,
    lat: &[f64],
    band: &LatBand,
) -> Result<f64, ItczError> {
    let idx = band_indices(lat, band)?;
    let best = first_argmax(idx.iter().map(|&j| profile[j])).ok_or(ItczError::AllMissingBand)?;
    Ok(lat[idx[best]])
}

/// ITCZ latitude for every longitude column of a (lat, lon) field.
pub fn detect_columns(
    field: ArrayView2<f64>,
    lat: &[f64],
    lon: &[f64],
    band: &LatBand,
) -> Result<Vec<f64>, ItczError> {
    let idx = band_indices(lat, band)?;
    field
        .axis_iter(Axis(1))
        .enumerate()
        .map(|(i, column)| {
            first_argmax(idx.iter().map(|&j| column[j]))
                .map(|best| lat[idx[best]])
                .ok_or(ItczError::AllMissingColumn { lon: lon[i] })
        })
        .collect()
}
