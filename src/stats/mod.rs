//! Stats module - Seasonal reduction, smoothing and ITCZ detection

pub mod detector;
pub mod itcz;
pub mod reducer;
pub mod smoother;

use smoother::SmoothError;
use thiserror::Error;

pub use detector::LatBand;
pub use itcz::{AnalysisSettings, ItczAnalysis, ItczMap, ItczReport, ZonalProfile};
pub use smoother::GaussianSmoother;

#[derive(Error, Debug)]
pub enum ItczError {
    #[error("Season has no timesteps")]
    EmptySeason,
    #[error("Timestep {0} is out of range")]
    TimestepOutOfRange(usize),
    #[error("Every selected value of the season is missing")]
    SeasonAllMissing,
    #[error("No latitude lies within the band [{south}, {north}]")]
    EmptyBand { south: f64, north: f64 },
    #[error("Zonal-mean profile is entirely missing within the latitude band")]
    AllMissingBand,
    #[error("Column at longitude {lon} is entirely missing within the latitude band")]
    AllMissingColumn { lon: f64 },
    #[error("Smoothing failed: {0}")]
    Smooth(#[from] SmoothError),
}
