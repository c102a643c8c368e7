//! Seasonal ITCZ Analysis Module
//! One routine for both the zonal profile and the longitude-resolved map:
//! select season, reduce, smooth (map only), detect.

use crate::data::longitude;
use crate::data::{PrecipGrid, Season, SeasonPartition};
use crate::stats::detector::{self, LatBand};
use crate::stats::reducer;
use crate::stats::smoother::GaussianSmoother;
use crate::stats::ItczError;
use ndarray::{Array1, Array2};

/// Parameters shared by every season and reduction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSettings {
    pub band: LatBand,
    pub smoother: GaussianSmoother,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            band: LatBand::default(),
            smoother: GaussianSmoother::default(),
        }
    }
}

/// Zonal-mean seasonal profile and its ITCZ latitude.
#[derive(Debug, Clone)]
pub struct ZonalProfile {
    pub season: Season,
    pub lat: Vec<f64>,
    pub mean: Array1<f64>,
    pub itcz_lat: f64,
    pub n_steps: usize,
}

/// Smoothed seasonal field with the ITCZ curve, longitude in (-180, 180].
#[derive(Debug, Clone)]
pub struct ItczMap {
    pub season: Season,
    pub lat: Vec<f64>,
    /// Ascending, reprojected longitude.
    pub lon: Vec<f64>,
    /// Shaped (lat, lon), columns aligned with `lon`.
    pub field: Array2<f64>,
    /// ITCZ latitude for each entry of `lon`.
    pub itcz_lat: Vec<f64>,
    pub n_steps: usize,
}

/// How the longitude axis is reduced before detection.
pub trait Reduction {
    type Output;

    fn reduce_and_detect(
        grid: &PrecipGrid,
        season: Season,
        steps: &[usize],
        settings: &AnalysisSettings,
    ) -> Result<Self::Output, ItczError>;
}

/// Average over longitude too; one ITCZ latitude.
pub struct Zonal;

/// Keep longitude; one ITCZ latitude per column.
pub struct PerLongitude;

impl Reduction for Zonal {
    type Output = ZonalProfile;

    fn reduce_and_detect(
        grid: &PrecipGrid,
        season: Season,
        steps: &[usize],
        settings: &AnalysisSettings,
    ) -> Result<ZonalProfile, ItczError> {
        let mean = reducer::zonal_seasonal_mean(grid, steps)?;
        let itcz_lat = detector::detect_profile(mean.view(), &grid.lat, &settings.band)?;
        Ok(ZonalProfile {
            season,
            lat: grid.lat.clone(),
            mean,
            itcz_lat,
            n_steps: steps.len(),
        })
    }
}

impl Reduction for PerLongitude {
    type Output = ItczMap;

    fn reduce_and_detect(
        grid: &PrecipGrid,
        season: Season,
        steps: &[usize],
        settings: &AnalysisSettings,
    ) -> Result<ItczMap, ItczError> {
        let mean = reducer::seasonal_mean_field(grid, steps)?;
        let smoothed = settings.smoother.smooth(&mean)?;
        let itcz =
            detector::detect_columns(smoothed.view(), &grid.lat, &grid.lon, &settings.band)?;

        let (lon, perm) = longitude::reproject(&grid.lon);
        Ok(ItczMap {
            season,
            lat: grid.lat.clone(),
            lon,
            field: longitude::permute_columns(&smoothed, &perm),
            itcz_lat: longitude::permute(&itcz, &perm),
            n_steps: steps.len(),
        })
    }
}

/// Season mean and ITCZ detection for one season, reduced by `R`.
pub fn season_mean_and_detect<R: Reduction>(
    grid: &PrecipGrid,
    season: Season,
    settings: &AnalysisSettings,
) -> Result<R::Output, ItczError> {
    let steps = season.select(&grid.months);
    log::debug!("{}: {} timesteps selected", season, steps.len());
    R::reduce_and_detect(grid, season, &steps, settings)
}

/// Profiles and maps for both seasons.
#[derive(Debug, Clone)]
pub struct ItczReport {
    pub band: LatBand,
    pub sigma: f64,
    pub djf_profile: ZonalProfile,
    pub jja_profile: ZonalProfile,
    pub djf_map: ItczMap,
    pub jja_map: ItczMap,
}

impl ItczReport {
    pub fn profile(&self, season: Season) -> &ZonalProfile {
        match season {
            Season::Djf => &self.djf_profile,
            Season::Jja => &self.jja_profile,
        }
    }

    pub fn map(&self, season: Season) -> &ItczMap {
        match season {
            Season::Djf => &self.djf_map,
            Season::Jja => &self.jja_map,
        }
    }
}

/// Runs the full seasonal analysis on a loaded grid.
pub struct ItczAnalysis;

impl ItczAnalysis {
    pub fn profile(
        grid: &PrecipGrid,
        season: Season,
        settings: &AnalysisSettings,
    ) -> Result<ZonalProfile, ItczError> {
        season_mean_and_detect::<Zonal>(grid, season, settings)
    }

    pub fn map(
        grid: &PrecipGrid,
        season: Season,
        settings: &AnalysisSettings,
    ) -> Result<ItczMap, ItczError> {
        season_mean_and_detect::<PerLongitude>(grid, season, settings)
    }

    pub fn run(grid: &PrecipGrid, settings: &AnalysisSettings) -> Result<ItczReport, ItczError> {
        let partition = SeasonPartition::from_months(&grid.months);
        log::info!(
            "Season partition: {} DJF and {} JJA timesteps",
            partition.get(Season::Djf).len(),
            partition.get(Season::Jja).len()
        );

        Ok(ItczReport {
            band: settings.band,
            sigma: settings.smoother.sigma,
            djf_profile: Self::profile(grid, Season::Djf, settings)?,
            jja_profile: Self::profile(grid, Season::Jja, settings)?,
            djf_map: Self::map(grid, Season::Djf, settings)?,
            jja_map: Self::map(grid, Season::Jja, settings)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MISSING_SENTINEL;
    use ndarray::Array3;

    /// 12 months on a 5° grid, zero rain except one DJF cell at (5°N, 0°E).
    fn single_cell_grid() -> PrecipGrid {
        let lat: Vec<f64> = (0..9).map(|j| -20.0 + 5.0 * j as f64).collect();
        let lon: Vec<f64> = (0..8).map(|i| 45.0 * i as f64).collect();
        let months: Vec<u32> = (1..=12).collect();
        let mut values = Array3::<f64>::zeros((12, lat.len(), lon.len()));
        let j = lat.iter().position(|&l| l == 5.0).unwrap();
        for t in [0, 1, 11] {
            values[[t, j, 0]] = 100.0;
        }
        PrecipGrid::new(lat, lon, months, values, &[MISSING_SENTINEL]).unwrap()
    }

    #[test]
    fn single_cell_djf_profile_peaks_at_five_north() {
        let grid = single_cell_grid();
        let profile = ItczAnalysis::profile(&grid, Season::Djf, &AnalysisSettings::default())
            .unwrap();
        assert_eq!(profile.itcz_lat, 5.0);
        assert_eq!(profile.n_steps, 3);
    }

    #[test]
    fn single_cell_djf_map_peaks_at_five_north_over_greenwich() {
        let grid = single_cell_grid();
        let map = ItczAnalysis::map(&grid, Season::Djf, &AnalysisSettings::default()).unwrap();
        let k = map.lon.iter().position(|&l| l == 0.0).unwrap();
        assert_eq!(map.itcz_lat[k], 5.0);
        assert!(map.lon.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(map.field.dim(), (9, 8));
    }

    #[test]
    fn fully_missing_season_is_an_error() {
        let mut grid = single_cell_grid();
        for t in [5, 6, 7] {
            grid.values
                .index_axis_mut(ndarray::Axis(0), t)
                .fill(f64::NAN);
        }
        let settings = AnalysisSettings::default();
        assert!(matches!(
            ItczAnalysis::profile(&grid, Season::Jja, &settings),
            Err(ItczError::SeasonAllMissing)
        ));
        assert!(ItczAnalysis::run(&grid, &settings).is_err());
    }

    #[test]
    fn missing_season_months_fail_loudly() {
        let lat = vec![0.0, 5.0];
        let lon = vec![0.0];
        let grid = PrecipGrid::new(
            lat,
            lon,
            vec![3, 4, 5],
            Array3::zeros((3, 2, 1)),
            &[MISSING_SENTINEL],
        )
        .unwrap();
        assert!(matches!(
            ItczAnalysis::map(&grid, Season::Djf, &AnalysisSettings::default()),
            Err(ItczError::EmptySeason)
        ));
    }

    #[test]
    fn reduction_selects_the_output_type() {
        let grid = single_cell_grid();
        let settings = AnalysisSettings::default();
        let profile: ZonalProfile =
            season_mean_and_detect::<Zonal>(&grid, Season::Djf, &settings).unwrap();
        let map: ItczMap =
            season_mean_and_detect::<PerLongitude>(&grid, Season::Djf, &settings).unwrap();
        assert_eq!(profile.mean.len(), 9);
        assert_eq!(map.itcz_lat.len(), map.lon.len());
        assert_eq!(profile.n_steps, map.n_steps);
    }

    #[test]
    fn report_holds_both_seasons() {
        let grid = single_cell_grid();
        let report = ItczAnalysis::run(&grid, &AnalysisSettings::default()).unwrap();
        assert_eq!(report.profile(Season::Djf).itcz_lat, 5.0);
        // JJA is uniformly zero: first latitude in the band wins.
        assert_eq!(report.profile(Season::Jja).itcz_lat, -20.0);
        assert_eq!(report.map(Season::Jja).itcz_lat.len(), 8);
    }
}
