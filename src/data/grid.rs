//! Precipitation Grid Module
//! In-memory (time, lat, lon) field with sentinel cells masked to NaN.

use ndarray::Array3;
use thiserror::Error;

/// Sentinel code for absent precipitation in the TRMM monthly product.
pub const MISSING_SENTINEL: f64 = -9999.9;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("Grid shape {actual:?} does not match coordinates (time={time}, lat={lat}, lon={lon})")]
    ShapeMismatch {
        actual: (usize, usize, usize),
        time: usize,
        lat: usize,
        lon: usize,
    },
    #[error("Latitude must be strictly monotonic (break at index {0})")]
    NonMonotonicLatitude(usize),
    #[error("Month {month} at timestep {index} is outside 1..=12")]
    InvalidMonth { index: usize, month: u32 },
    #[error("Grid has an empty {0} axis")]
    EmptyAxis(&'static str),
}

/// True when `value` is NaN or one of the sentinel codes.
///
/// Files usually store precipitation as float32, where -9999.9 is not exactly
/// representable, so the comparison is done at single precision.
pub fn is_missing(value: f64, sentinels: &[f64]) -> bool {
    value.is_nan() || sentinels.iter().any(|&s| (s as f32) == (value as f32))
}

/// Monthly precipitation indexed by (time, latitude, longitude).
#[derive(Debug, Clone)]
pub struct PrecipGrid {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    /// Calendar month (1..=12) of each timestep.
    pub months: Vec<u32>,
    /// Missing cells are NaN.
    pub values: Array3<f64>,
}

impl PrecipGrid {
    /// Build a grid, replacing every sentinel cell with NaN.
    pub fn new(
        lat: Vec<f64>,
        lon: Vec<f64>,
        months: Vec<u32>,
        mut values: Array3<f64>,
        sentinels: &[f64],
    ) -> Result<Self, GridError> {
        if months.is_empty() {
            return Err(GridError::EmptyAxis("time"));
        }
        if lat.is_empty() {
            return Err(GridError::EmptyAxis("lat"));
        }
        if lon.is_empty() {
            return Err(GridError::EmptyAxis("lon"));
        }

        let actual = values.dim();
        if actual != (months.len(), lat.len(), lon.len()) {
            return Err(GridError::ShapeMismatch {
                actual,
                time: months.len(),
                lat: lat.len(),
                lon: lon.len(),
            });
        }

        if let Some(index) = months.iter().position(|m| !(1..=12).contains(m)) {
            return Err(GridError::InvalidMonth {
                index,
                month: months[index],
            });
        }

        Self::check_monotonic(&lat)?;

        values.mapv_inplace(|v| if is_missing(v, sentinels) { f64::NAN } else { v });

        Ok(Self {
            lat,
            lon,
            months,
            values,
        })
    }

    fn check_monotonic(lat: &[f64]) -> Result<(), GridError> {
        if lat.len() < 2 {
            return Ok(());
        }
        let ascending = lat[1] > lat[0];
        for i in 1..lat.len() {
            let ok = if ascending {
                lat[i] > lat[i - 1]
            } else {
                lat[i] < lat[i - 1]
            };
            if !ok {
                return Err(GridError::NonMonotonicLatitude(i));
            }
        }
        Ok(())
    }

    pub fn n_time(&self) -> usize {
        self.months.len()
    }

    pub fn n_lat(&self) -> usize {
        self.lat.len()
    }

    pub fn n_lon(&self) -> usize {
        self.lon.len()
    }
}
