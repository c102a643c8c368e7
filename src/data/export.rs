//! Result Export Module
//! Writes the ITCZ curves as CSV (Polars) and the scalar results as JSON.

use crate::stats::{ItczMap, ItczReport, LatBand};
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("DJF and JJA maps are on different longitude grids")]
    LongitudeMismatch,
}

#[derive(Debug, Serialize)]
struct SeasonSummary {
    itcz_lat: f64,
    timesteps: usize,
}

#[derive(Debug, Serialize)]
struct ItczSummary {
    band: LatBand,
    smoothing_sigma: f64,
    djf: SeasonSummary,
    jja: SeasonSummary,
}

pub struct ItczExporter;

impl ItczExporter {
    /// Build the `lon, djf_itcz_lat, jja_itcz_lat` table.
    pub fn curve_frame(djf: &ItczMap, jja: &ItczMap) -> Result<DataFrame, ExportError> {
        if djf.lon != jja.lon {
            return Err(ExportError::LongitudeMismatch);
        }
        let df = DataFrame::new(vec![
            Column::new("lon".into(), djf.lon.clone()),
            Column::new("djf_itcz_lat".into(), djf.itcz_lat.clone()),
            Column::new("jja_itcz_lat".into(), jja.itcz_lat.clone()),
        ])?;
        Ok(df)
    }

    pub fn write_curve_csv(djf: &ItczMap, jja: &ItczMap, path: &Path) -> Result<(), ExportError> {
        let mut df = Self::curve_frame(djf, jja)?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;
        log::info!("Wrote {} ITCZ curve rows to {}", df.height(), path.display());
        Ok(())
    }

    pub fn write_summary_json(report: &ItczReport, path: &Path) -> Result<(), ExportError> {
        let summary = ItczSummary {
            band: report.band,
            smoothing_sigma: report.sigma,
            djf: SeasonSummary {
                itcz_lat: report.djf_profile.itcz_lat,
                timesteps: report.djf_profile.n_steps,
            },
            jja: SeasonSummary {
                itcz_lat: report.jja_profile.itcz_lat,
                timesteps: report.jja_profile.n_steps,
            },
        };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &summary)?;
        log::info!("Wrote summary to {}", path.display());
        Ok(())
    }
}
