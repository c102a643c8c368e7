//! NetCDF Data Loader Module
//! Reads the precipitation variable and its coordinates into a [`PrecipGrid`].

use crate::data::calendar::{self, CalendarError};
use crate::data::grid::{GridError, PrecipGrid};
use ndarray::Array3;
use netcdf::AttributeValue;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read netCDF: {0}")]
    NetcdfError(#[from] netcdf::Error),
    #[error("Variable '{0}' not found")]
    MissingVariable(String),
    #[error("Variable '{name}' has {ndim} dimensions, expected 3 (time, lat, lon)")]
    WrongRank { name: String, ndim: usize },
    #[error("Variable '{name}' is laid out as {found:?}, expected {expected:?}")]
    DimensionOrder {
        name: String,
        found: Vec<String>,
        expected: Vec<String>,
    },
    #[error("Time axis: {0}")]
    TimeError(#[from] CalendarError),
    #[error("Invalid grid: {0}")]
    GridError(#[from] GridError),
    #[error("Array shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),
}

/// Options controlling how a file is read.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Name of the precipitation variable.
    pub variable: String,
    /// Sentinel code in addition to any `_FillValue` / `missing_value`.
    pub missing_value: f64,
    /// Fail instead of substituting a synthetic monthly axis.
    pub strict_time: bool,
}

/// Loads gridded monthly precipitation from netCDF files.
pub struct DataLoader;

impl DataLoader {
    /// Load `path` into an in-memory grid. The file handle is released on return.
    pub fn load(path: &Path, options: &LoadOptions) -> Result<PrecipGrid, LoaderError> {
        log::info!("Opening {}", path.display());
        let file = netcdf::open(path)?;

        let lat_var = Self::variable(&file, "lat")?;
        let lon_var = Self::variable(&file, "lon")?;
        let lat = lat_var.get_values::<f64, _>(..)?;
        let lon = lon_var.get_values::<f64, _>(..)?;

        let time_var = Self::variable(&file, "time")?;
        let time_values = time_var.get_values::<f64, _>(..)?;
        let units = Self::string_attribute(&time_var, "units");
        let calendar = Self::string_attribute(&time_var, "calendar");
        let months = calendar::resolve_months(
            &time_values,
            units.as_deref(),
            calendar.as_deref(),
            options.strict_time,
        )?;

        let var = Self::variable(&file, &options.variable)?;
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        if shape.len() != 3 {
            return Err(LoaderError::WrongRank {
                name: options.variable.clone(),
                ndim: shape.len(),
            });
        }

        // Each axis must be the dimension its coordinate variable is defined on
        let found: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let expected: Vec<String> = [&time_var, &lat_var, &lon_var]
            .iter()
            .zip(&found)
            .map(|(coord, actual)| Self::axis_dimension(coord).unwrap_or_else(|| actual.clone()))
            .collect();
        if found != expected {
            return Err(LoaderError::DimensionOrder {
                name: options.variable.clone(),
                found,
                expected,
            });
        }

        let mut sentinels = vec![options.missing_value];
        for name in ["_FillValue", "missing_value"] {
            if let Some(v) = Self::numeric_attribute(&var, name) {
                sentinels.push(v);
            }
        }
        log::debug!(
            "{}: shape {:?}, sentinels {:?}",
            options.variable,
            shape,
            sentinels
        );

        let raw = var.get_values::<f64, _>(..)?;
        let values = Array3::from_shape_vec((shape[0], shape[1], shape[2]), raw)?;

        let grid = PrecipGrid::new(lat, lon, months, values, &sentinels)?;
        log::info!(
            "Loaded {} timesteps on a {}x{} lat/lon grid",
            grid.n_time(),
            grid.n_lat(),
            grid.n_lon()
        );
        Ok(grid)
    }

    fn variable<'f>(
        file: &'f netcdf::File,
        name: &str,
    ) -> Result<netcdf::Variable<'f>, LoaderError> {
        file.variable(name)
            .ok_or_else(|| LoaderError::MissingVariable(name.to_string()))
    }

    /// Name of the single dimension a coordinate variable spans.
    fn axis_dimension(coord: &netcdf::Variable) -> Option<String> {
        match coord.dimensions() {
            [dim] => Some(dim.name()),
            _ => None,
        }
    }

    fn string_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
        match var.attribute(name)?.value().ok()? {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    }

    fn numeric_attribute(var: &netcdf::Variable, name: &str) -> Option<f64> {
        let value = match var.attribute(name)?.value().ok()? {
            AttributeValue::Double(v) => v,
            AttributeValue::Float(v) => v as f64,
            AttributeValue::Int(v) => v as f64,
            AttributeValue::Short(v) => v as f64,
            AttributeValue::Doubles(v) => *v.first()?,
            AttributeValue::Floats(v) => *v.first()? as f64,
            _ => return None,
        };
        Some(value)
    }
}
