//! Contour levels and the sequential blue palette for rainfall maps.

use plotters::style::RGBColor;

// matplotlib "Blues", light to dark
const BLUES: [(u8, u8, u8); 9] = [
    (247, 251, 255),
    (222, 235, 247),
    (198, 219, 239),
    (158, 202, 225),
    (107, 174, 214),
    (66, 146, 198),
    (33, 113, 181),
    (8, 81, 156),
    (8, 48, 107),
];

/// Interpolated Blues colour at `t` in [0, 1].
pub fn blues(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let pos = t * (BLUES.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(BLUES.len() - 1);
    let frac = pos - lo as f64;
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (a, b) = (BLUES[lo], BLUES[hi]);
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Equally spaced filled-contour levels between the field minimum and maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourLevels {
    pub levels: Vec<f64>,
}

impl ContourLevels {
    /// `count` levels spanning `[min, max]`; at least two.
    pub fn linspace(min: f64, max: f64, count: usize) -> Self {
        let count = count.max(2);
        let step = (max - min) / (count - 1) as f64;
        let levels = (0..count).map(|i| min + step * i as f64).collect();
        Self { levels }
    }

    /// Levels covering the non-missing values of `values`, or `None` if all are missing.
    pub fn from_values<'a>(values: impl Iterator<Item = &'a f64>, count: usize) -> Option<Self> {
        let (min, max) = values
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;
        Some(Self::linspace(min, max, count))
    }

    pub fn n_bands(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn min(&self) -> f64 {
        self.levels[0]
    }

    pub fn max(&self) -> f64 {
        self.levels[self.levels.len() - 1]
    }

    /// Band index of `value`; values beyond the ends fall in the outer bands.
    pub fn band(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let span = self.max() - self.min();
        if span <= 0.0 {
            return Some(0);
        }
        let pos = ((value - self.min()) / span * self.n_bands() as f64).floor();
        Some((pos.max(0.0) as usize).min(self.n_bands() - 1))
    }

    pub fn band_color(&self, band: usize) -> RGBColor {
        if self.n_bands() <= 1 {
            return blues(0.5);
        }
        blues(band as f64 / (self.n_bands() - 1) as f64)
    }

    pub fn color(&self, value: f64) -> Option<RGBColor> {
        self.band(value).map(|b| self.band_color(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_endpoints() {
        assert_eq!(blues(0.0), RGBColor(247, 251, 255));
        assert_eq!(blues(1.0), RGBColor(8, 48, 107));
        assert_eq!(blues(2.0), RGBColor(8, 48, 107));
    }

    #[test]
    fn thirty_levels_make_twenty_nine_bands() {
        let levels = ContourLevels::linspace(0.0, 29.0, 30);
        assert_eq!(levels.n_bands(), 29);
        assert_eq!(levels.band(0.0), Some(0));
        assert_eq!(levels.band(1.5), Some(1));
        assert_eq!(levels.band(29.0), Some(28));
        assert_eq!(levels.band(-5.0), Some(0));
        assert_eq!(levels.band(f64::NAN), None);
    }

    #[test]
    fn levels_ignore_missing_values() {
        let values = [f64::NAN, 2.0, 8.0, f64::NAN];
        let levels = ContourLevels::from_values(values.iter(), 4).unwrap();
        assert_eq!(levels.levels, vec![2.0, 4.0, 6.0, 8.0]);
        assert!(ContourLevels::from_values([f64::NAN].iter(), 4).is_none());
    }

    #[test]
    fn flat_field_has_a_single_colour() {
        let levels = ContourLevels::linspace(3.0, 3.0, 30);
        assert_eq!(levels.band(3.0), Some(0));
    }
}
