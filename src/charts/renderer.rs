//! Static Chart Renderer
//! Draws the ITCZ charts with plotters into in-memory RGB images.
//!
//! Layout:
//! 1. Profile: seasonal zonal-mean precipitation against latitude, with a
//!    dashed marker and label at the ITCZ latitude.
//! 2. Map: filled rainfall bands on a lon/lat grid, colour bar on the right,
//!    ITCZ curve in red and the equator dashed in black.

use crate::charts::palette::ContourLevels;
use crate::stats::{ItczMap, ZonalProfile};
use image::RgbImage;
use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

// Colors
const LINE_BLUE: RGBColor = RGBColor(31, 119, 180);
const MARKER_RED: RGBColor = RGBColor(214, 39, 40);
const GRID_GRAY: RGBColor = RGBColor(200, 200, 200);

const FONT: &str = "sans-serif";
const COLORBAR_WIDTH: i32 = 110;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Nothing to draw: {0}")]
    NoData(&'static str),
    #[error("Pixel buffer does not match image size {0}x{1}")]
    Buffer(u32, u32),
    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),
    #[error("Failed to open viewer: {0}")]
    Open(#[from] std::io::Error),
}

type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// Linear axis in degrees with grid lines at multiples of `step`.
#[derive(Debug, Clone)]
struct DegreeAxis {
    lo: f64,
    hi: f64,
    step: f64,
}

impl Ranged for DegreeAxis {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        let span = self.hi - self.lo;
        if span <= 0.0 {
            return (limit.0 + limit.1) / 2;
        }
        let t = (value - self.lo) / span;
        limit.0 + ((limit.1 - limit.0) as f64 * t).round() as i32
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        if hint.max_num_points() == 0 {
            return Vec::new();
        }
        StaticChartRenderer::ticks(self.lo, self.hi, self.step)
    }

    fn range(&self) -> Range<f64> {
        self.lo..self.hi
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Line plot of mean precipitation vs latitude with the ITCZ marker.
    pub fn render_profile(
        profile: &ZonalProfile,
        size: (u32, u32),
    ) -> Result<RgbImage, RenderError> {
        let points: Vec<(f64, f64)> = profile
            .lat
            .iter()
            .zip(profile.mean.iter())
            .filter(|(_, v)| !v.is_nan())
            .map(|(&l, &v)| (l, v))
            .collect();
        if points.is_empty() {
            return Err(RenderError::NoData("profile is entirely missing"));
        }

        let mut buffer = Self::pixel_buffer(size);
        {
            let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
            Self::draw_profile(&root, profile, &points).map_err(Self::draw_error)?;
            root.present().map_err(Self::draw_error)?;
        }
        Self::into_image(size, buffer)
    }

    /// Filled-contour rainfall map with the ITCZ curve.
    pub fn render_map(
        map: &ItczMap,
        size: (u32, u32),
        levels: usize,
    ) -> Result<RgbImage, RenderError> {
        let levels = ContourLevels::from_values(map.field.iter(), levels)
            .ok_or(RenderError::NoData("map field is entirely missing"))?;

        let mut buffer = Self::pixel_buffer(size);
        {
            let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
            Self::draw_map(&root, map, &levels).map_err(Self::draw_error)?;
            root.present().map_err(Self::draw_error)?;
        }
        Self::into_image(size, buffer)
    }

    pub fn save_png(img: &RgbImage, path: &Path) -> Result<(), RenderError> {
        img.save(path)?;
        log::info!("Saved chart {}", path.display());
        Ok(())
    }

    /// Hand the file to the system image viewer.
    pub fn show(path: &Path) -> Result<(), RenderError> {
        open::that(path)?;
        Ok(())
    }

    fn pixel_buffer((w, h): (u32, u32)) -> Vec<u8> {
        vec![0u8; (w as usize) * (h as usize) * 3]
    }

    fn into_image((w, h): (u32, u32), buffer: Vec<u8>) -> Result<RgbImage, RenderError> {
        RgbImage::from_raw(w, h, buffer).ok_or(RenderError::Buffer(w, h))
    }

    fn draw_error<E: std::fmt::Display>(e: E) -> RenderError {
        RenderError::Draw(e.to_string())
    }

    fn draw_profile<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        profile: &ZonalProfile,
        points: &[(f64, f64)],
    ) -> DrawResult<DB> {
        root.fill(&WHITE)?;

        let (lat_lo, lat_hi) = Self::extent(profile.lat.iter().copied());
        let (v_lo, v_hi) = Self::extent(points.iter().map(|p| p.1));
        let pad = if v_hi > v_lo { (v_hi - v_lo) * 0.05 } else { 1.0 };
        let (y_lo, y_hi) = (v_lo - pad, v_hi + pad);

        let season = profile.season.label();
        let itcz = profile.itcz_lat;

        let mut chart = ChartBuilder::on(root)
            .caption(format!("{} ITCZ Position", season), (FONT, 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(lat_lo..lat_hi, y_lo..y_hi)?;

        chart
            .configure_mesh()
            .light_line_style(&GRID_GRAY.mix(0.4))
            .x_desc("Latitude")
            .y_desc("Precipitation (mm)")
            .draw()?;

        let line = LINE_BLUE.stroke_width(2);
        chart
            .draw_series(LineSeries::new(points.iter().copied(), line))?
            .label(format!("{} Mean Precipitation", season))
            .legend(move |(x, y)| Self::legend_swatch(x, y, line));

        let marker = MARKER_RED.stroke_width(2);
        chart
            .draw_series(Self::dashed((itcz, y_lo), (itcz, y_hi), 24, marker))?
            .label(format!("{} ITCZ Latitude", season))
            .legend(move |(x, y)| Self::legend_swatch(x, y, marker));

        // Boxed value label next to the marker, on the zero line when it is visible
        let label = format!("{:.2}°", itcz);
        let style = (FONT, 14).into_font().color(&MARKER_RED);
        let (tw, th) = root.estimate_text_size(&label, &style)?;
        let (bw, bh) = (tw as i32 + 8, th as i32 + 6);
        let label_y = if y_lo <= 0.0 && y_hi >= 0.0 { 0.0 } else { y_lo };
        let label_x = itcz + (lat_hi - lat_lo) * 0.005;
        chart.draw_series(std::iter::once(
            EmptyElement::at((label_x, label_y))
                + Rectangle::new([(0, -bh), (bw, 0)], WHITE.mix(0.7).filled())
                + Rectangle::new([(0, -bh), (bw, 0)], MARKER_RED.stroke_width(1))
                + Text::new(label, (4, 3 - bh), style),
        ))?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        Ok(())
    }

    fn draw_map<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        map: &ItczMap,
        levels: &ContourLevels,
    ) -> DrawResult<DB> {
        root.fill(&WHITE)?;

        let (w, _) = root.dim_in_pixel();
        let (main, bar) = root.split_horizontally((w as i32 - COLORBAR_WIDTH).max(1));

        let lon_edges = Self::cell_edges(&map.lon);
        let lat_edges = Self::cell_edges(&map.lat);
        let (x_lo, x_hi) = Self::extent(lon_edges.iter().copied());
        let (y_lo, y_hi) = Self::extent(lat_edges.iter().copied());

        let mut chart = ChartBuilder::on(&main)
            .caption(
                format!("{} ITCZ Position and Rainfall", map.season.long_label()),
                (FONT, 22),
            )
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(
                DegreeAxis {
                    lo: x_lo,
                    hi: x_hi,
                    step: 30.0,
                },
                DegreeAxis {
                    lo: y_lo,
                    hi: y_hi,
                    step: 10.0,
                },
            )?;

        // Rainfall cells
        let mut cells = Vec::with_capacity(map.field.len());
        for ((j, i), &v) in map.field.indexed_iter() {
            if let Some(color) = levels.color(v) {
                cells.push(Rectangle::new(
                    [
                        (lon_edges[i], lat_edges[j]),
                        (lon_edges[i + 1], lat_edges[j + 1]),
                    ],
                    color.filled(),
                ));
            }
        }
        chart.draw_series(cells)?;

        chart
            .configure_mesh()
            .light_line_style(&TRANSPARENT)
            .bold_line_style(&GRID_GRAY.mix(0.6))
            .x_desc("Longitude")
            .y_desc("Latitude")
            .x_label_formatter(&|v| format!("{:.0}°", v))
            .y_label_formatter(&|v| format!("{:.0}°", v))
            .draw()?;

        let curve = MARKER_RED.stroke_width(2);
        chart
            .draw_series(LineSeries::new(
                map.lon.iter().copied().zip(map.itcz_lat.iter().copied()),
                curve,
            ))?
            .label("ITCZ")
            .legend(move |(x, y)| Self::legend_swatch(x, y, curve));

        if y_lo <= 0.0 && y_hi >= 0.0 {
            let equator = BLACK.stroke_width(1);
            chart
                .draw_series(Self::dashed((x_lo, 0.0), (x_hi, 0.0), 48, equator))?
                .label("Equator")
                .legend(move |(x, y)| Self::legend_swatch(x, y, equator));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        Self::draw_colorbar(&bar, levels)
    }

    fn draw_colorbar<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        levels: &ContourLevels,
    ) -> DrawResult<DB> {
        let (lo, hi) = (levels.min(), levels.max());
        let hi = if hi > lo { hi } else { lo + 1.0 };

        let mut bar = ChartBuilder::on(area)
            .margin_top(50)
            .margin_bottom(55)
            .margin_right(10)
            .set_label_area_size(LabelAreaPosition::Right, 60)
            .build_cartesian_2d(0.0..1.0, lo..hi)?;

        bar.draw_series((0..levels.n_bands()).map(|b| {
            let top = if levels.n_bands() == 1 { hi } else { levels.levels[b + 1] };
            Rectangle::new([(0.0, levels.levels[b]), (1.0, top)], levels.band_color(b).filled())
        }))?;

        bar.configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .y_labels(8)
            .y_desc("Precipitation (mm)")
            .draw()?;

        Ok(())
    }

    fn legend_swatch(x: i32, y: i32, style: ShapeStyle) -> PathElement<(i32, i32)> {
        PathElement::new(vec![(x, y), (x + 20, y)], style)
    }

    /// Short segments between `from` and `to`, every other one drawn.
    fn dashed(
        from: (f64, f64),
        to: (f64, f64),
        pieces: usize,
        style: ShapeStyle,
    ) -> Vec<PathElement<(f64, f64)>> {
        let at = |t: f64| (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t);
        (0..pieces)
            .step_by(2)
            .map(|k| {
                let a = k as f64 / pieces as f64;
                let b = (k + 1) as f64 / pieces as f64;
                PathElement::new(vec![at(a), at(b)], style)
            })
            .collect()
    }

    /// Cell boundaries halfway between neighbouring coordinates.
    fn cell_edges(coords: &[f64]) -> Vec<f64> {
        match coords.len() {
            0 => Vec::new(),
            1 => vec![coords[0] - 0.5, coords[0] + 0.5],
            n => {
                let mut edges = Vec::with_capacity(n + 1);
                edges.push(coords[0] - (coords[1] - coords[0]) / 2.0);
                for k in 0..n - 1 {
                    edges.push((coords[k] + coords[k + 1]) / 2.0);
                }
                edges.push(coords[n - 1] + (coords[n - 1] - coords[n - 2]) / 2.0);
                edges
            }
        }
    }

    /// Multiples of `step` within `[lo, hi]`.
    fn ticks(lo: f64, hi: f64, step: f64) -> Vec<f64> {
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        (first..=last).map(|k| k as f64 * step).collect()
    }

    fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
        let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if lo < hi {
            (lo, hi)
        } else {
            (lo - 1.0, lo + 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Season;
    use ndarray::{Array1, Array2};

    fn profile(mean: Vec<f64>) -> ZonalProfile {
        let lat: Vec<f64> = (0..mean.len()).map(|j| -20.0 + 5.0 * j as f64).collect();
        ZonalProfile {
            season: Season::Djf,
            lat,
            mean: Array1::from(mean),
            itcz_lat: 5.0,
            n_steps: 3,
        }
    }

    fn map(fill: f64) -> ItczMap {
        let lat: Vec<f64> = (0..9).map(|j| -20.0 + 5.0 * j as f64).collect();
        let lon: Vec<f64> = (0..8).map(|i| -180.0 + 45.0 * i as f64).collect();
        let mut field = Array2::from_elem((lat.len(), lon.len()), fill);
        if !fill.is_nan() {
            field[[5, 4]] = fill + 10.0;
        }
        ItczMap {
            season: Season::Jja,
            itcz_lat: vec![5.0; lon.len()],
            lat,
            lon,
            field,
            n_steps: 3,
        }
    }

    #[test]
    fn profile_image_has_requested_size() {
        let img = StaticChartRenderer::render_profile(
            &profile(vec![0.0, 1.0, 2.0, 4.0, 3.0, 8.0, 2.0, f64::NAN, 0.5]),
            (400, 240),
        )
        .unwrap();
        assert_eq!(img.dimensions(), (400, 240));
    }

    #[test]
    fn map_image_has_requested_size() {
        let img = StaticChartRenderer::render_map(&map(1.0), (640, 320), 30).unwrap();
        assert_eq!(img.dimensions(), (640, 320));
        // Something other than the white background was drawn
        assert!(img.pixels().any(|p| p.0 != [255, 255, 255]));
    }

    #[test]
    fn all_missing_inputs_have_nothing_to_draw() {
        let empty = profile(vec![f64::NAN; 9]);
        assert!(matches!(
            StaticChartRenderer::render_profile(&empty, (400, 240)),
            Err(RenderError::NoData(_))
        ));
        assert!(matches!(
            StaticChartRenderer::render_map(&map(f64::NAN), (640, 320), 30),
            Err(RenderError::NoData(_))
        ));
    }

    #[test]
    fn degree_axis_puts_grid_lines_on_multiples() {
        let axis = DegreeAxis {
            lo: -200.0,
            hi: 200.0,
            step: 30.0,
        };
        let points = axis.key_points(10usize);
        assert_eq!(points.first(), Some(&-180.0));
        assert_eq!(points.last(), Some(&180.0));
        assert!(axis.key_points(0usize).is_empty());
        assert_eq!(axis.map(&0.0, (0, 400)), 200);
        assert_eq!(axis.map(&-200.0, (0, 400)), 0);
    }

    #[test]
    fn cell_edges_bracket_coordinates() {
        let edges = StaticChartRenderer::cell_edges(&[-10.0, 0.0, 10.0]);
        assert_eq!(edges, vec![-15.0, -5.0, 5.0, 15.0]);

        let descending = StaticChartRenderer::cell_edges(&[10.0, 0.0]);
        assert_eq!(descending, vec![15.0, 5.0, -5.0]);
    }

    #[test]
    fn ticks_every_thirty_degrees() {
        let ticks = StaticChartRenderer::ticks(-181.0, 181.0, 30.0);
        assert_eq!(ticks.first(), Some(&-180.0));
        assert_eq!(ticks.last(), Some(&180.0));
        assert_eq!(ticks.len(), 13);
    }

    #[test]
    fn dashed_line_draws_every_other_piece() {
        let style = BLACK.stroke_width(1);
        let dashes = StaticChartRenderer::dashed((0.0, 0.0), (10.0, 0.0), 10, style);
        assert_eq!(dashes.len(), 5);
    }

    #[test]
    fn degenerate_extent_is_widened() {
        assert_eq!(StaticChartRenderer::extent([2.0, 2.0].into_iter()), (1.0, 3.0));
        assert_eq!(StaticChartRenderer::extent([3.0, -1.0].into_iter()), (-1.0, 3.0));
    }
}
