//! Data module - netCDF loading, seasons and longitude handling

pub mod calendar;
mod export;
mod grid;
mod loader;
pub mod longitude;
mod season;

pub use export::ItczExporter;
pub use grid::{PrecipGrid, MISSING_SENTINEL};
pub use loader::{DataLoader, LoadOptions};
pub use season::{Season, SeasonPartition};
