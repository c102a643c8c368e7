//! Seasonal Mean Reducer Module
//! Time (and optionally longitude) means that skip missing cells.

use crate::data::PrecipGrid;
use crate::stats::ItczError;
use ndarray::{Array1, Array2, Axis};

fn check_steps(grid: &PrecipGrid, steps: &[usize]) -> Result<(), ItczError> {
    if steps.is_empty() {
        return Err(ItczError::EmptySeason);
    }
    if let Some(&bad) = steps.iter().find(|&&t| t >= grid.n_time()) {
        return Err(ItczError::TimestepOutOfRange(bad));
    }
    Ok(())
}

fn ensure_any_valid<'a>(mut values: impl Iterator<Item = &'a f64>) -> Result<(), ItczError> {
    if values.any(|v| !v.is_nan()) {
        Ok(())
    } else {
        Err(ItczError::SeasonAllMissing)
    }
}

/// Mean over the selected timesteps and all longitudes, per latitude.
///
/// Every valid (time, lon) sample at a latitude carries equal weight.
pub fn zonal_seasonal_mean(grid: &PrecipGrid, steps: &[usize]) -> Result<Array1<f64>, ItczError> {
    check_steps(grid, steps)?;

    let mut sum = Array1::<f64>::zeros(grid.n_lat());
    let mut count = Array1::<usize>::zeros(grid.n_lat());

    for &t in steps {
        let slice = grid.values.index_axis(Axis(0), t);
        for ((j, _), &v) in slice.indexed_iter() {
            if !v.is_nan() {
                sum[j] += v;
                count[j] += 1;
            }
        }
    }

    let mean: Array1<f64> = sum
        .iter()
        .zip(count.iter())
        .map(|(&s, &n)| if n > 0 { s / n as f64 } else { f64::NAN })
        .collect();

    ensure_any_valid(mean.iter())?;
    Ok(mean)
}

/// Per-cell mean over the selected timesteps, shaped (lat, lon).
pub fn seasonal_mean_field(grid: &PrecipGrid, steps: &[usize]) -> Result<Array2<f64>, ItczError> {
    check_steps(grid, steps)?;

    let shape = (grid.n_lat(), grid.n_lon());
    let mut sum = Array2::<f64>::zeros(shape);
    let mut count = Array2::<usize>::zeros(shape);

    for &t in steps {
        let slice = grid.values.index_axis(Axis(0), t);
        for (idx, &v) in slice.indexed_iter() {
            if !v.is_nan() {
                sum[idx] += v;
                count[idx] += 1;
            }
        }
    }

    let mut mean = sum;
    ndarray::Zip::from(&mut mean).and(&count).for_each(|m, &n| {
        *m = if n > 0 { *m / n as f64 } else { f64::NAN };
    });

    ensure_any_valid(mean.iter())?;
    Ok(mean)
}
