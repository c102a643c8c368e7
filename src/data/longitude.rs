//! Longitude reprojection from [0, 360) to (-180, 180].

use ndarray::{Array2, Axis};

pub fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else {
        lon
    }
}

/// Wrapped longitudes in ascending order and the permutation that sorts them.
///
/// `sorted[k] == wrap_longitude(lon[perm[k]])`. The sort is stable.
pub fn reproject(lon: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let wrapped: Vec<f64> = lon.iter().map(|&l| wrap_longitude(l)).collect();
    let mut perm: Vec<usize> = (0..wrapped.len()).collect();
    perm.sort_by(|&a, &b| wrapped[a].total_cmp(&wrapped[b]));
    let sorted = perm.iter().map(|&i| wrapped[i]).collect();
    (sorted, perm)
}

pub fn permute(values: &[f64], perm: &[usize]) -> Vec<f64> {
    perm.iter().map(|&i| values[i]).collect()
}

/// Reorder the longitude (second) axis of a (lat, lon) field.
pub fn permute_columns(field: &Array2<f64>, perm: &[usize]) -> Array2<f64> {
    field.select(Axis(1), perm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn reprojects_and_sorts() {
        let (sorted, perm) = reproject(&[190.0, 0.0, 350.0]);
        assert_eq!(sorted, vec![-170.0, -10.0, 0.0]);
        assert_eq!(perm, vec![0, 2, 1]);

        let field = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let moved = permute_columns(&field, &perm);
        assert_eq!(moved, array![[1.0, 3.0, 2.0], [4.0, 6.0, 5.0]]);
    }

    #[test]
    fn dateline_stays_positive() {
        assert_eq!(wrap_longitude(180.0), 180.0);
        assert_eq!(wrap_longitude(180.5), -179.5);
    }

    proptest! {
        #[test]
        fn permutation_preserves_pairs(lon in prop::collection::vec(0.0f64..360.0, 1..50)) {
            let values: Vec<f64> = (0..lon.len()).map(|i| i as f64 * 1.5).collect();
            let (sorted, perm) = reproject(&lon);
            let moved = permute(&values, &perm);

            prop_assert!(sorted.windows(2).all(|w| w[0] <= w[1]));
            for k in 0..sorted.len() {
                // The k-th value still belongs to the longitude it was paired with.
                let tag = moved[k] / 1.5;
                let i = tag.round() as usize;
                prop_assert_eq!(wrap_longitude(lon[i]), sorted[k]);
            }
        }
    }
}
