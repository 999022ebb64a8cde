//! Fills masked entries of a resampled (position, depth) section from
//! nearby valid entries.
//!
//! Values are first carried down the water column, then sideways along
//! the transect. Shifts do not wrap around the ends of an axis.

use crate::field::MaskedField;
use log::debug;
use ndarray::{Axis, Ix2};

/// Copies valid values found `shift` steps away along `axis` into masked
/// entries. The source of each copy is read from a snapshot taken before
/// the pass.
fn fill_from_shift(field: &mut MaskedField<Ix2>, axis: Axis, shift: isize) {
    let snapshot = field.clone();
    let (npos, ndepth) = field.values().dim();
    for i in 0..npos {
        for d in 0..ndepth {
            if field.valid()[[i, d]] {
                continue;
            }
            let (si, sd) = match axis {
                Axis(0) => (i as isize - shift, d as isize),
                _ => (i as isize, d as isize - shift),
            };
            if si < 0 || sd < 0 || si >= npos as isize || sd >= ndepth as isize {
                continue;
            }
            if let Some(v) = snapshot.get([si as usize, sd as usize]) {
                field.set([i, d], Some(v));
            }
        }
    }
}

/// Replaces masked values in place using the nearest valid value above
/// in depth, then the nearest valid value along the transect.
///
/// The horizontal scan reaches `floor(positions / 2)` steps either side.
/// Entries with no valid neighbour in range stay masked.
pub fn fill_invalid_shift(field: &mut MaskedField<Ix2>) {
    let (npos, ndepth) = field.values().dim();
    let before = field.count_invalid();
    if before == 0 {
        return;
    }

    for shift in 1..ndepth {
        if field.is_fully_valid() {
            break;
        }
        fill_from_shift(field, Axis(1), shift as isize);
    }

    for shift in 1..=(npos / 2) {
        if field.is_fully_valid() {
            break;
        }
        for d in [-(shift as isize), shift as isize] {
            fill_from_shift(field, Axis(0), d);
        }
    }

    debug!(
        "Gap filling reduced masked entries from {} to {}",
        before,
        field.count_invalid()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_interior_hole_is_filled_horizontally() {
        let mut values = Array2::from_elem((5, 1), 3.0);
        values[[2, 0]] = f64::NAN;
        let mut field = MaskedField::from_values(values);
        fill_invalid_shift(&mut field);
        assert!(field.is_fully_valid());
        assert_eq!(field.get([2, 0]), Some(3.0));
    }

    #[test]
    fn test_values_extend_down_the_column() {
        let values = Array2::from_shape_vec(
            (2, 4),
            vec![
                1.0, 2.0, f64::NAN, f64::NAN, //
                5.0, f64::NAN, f64::NAN, f64::NAN,
            ],
        )
        .unwrap();
        let mut field = MaskedField::from_values(values);
        fill_invalid_shift(&mut field);
        assert!(field.is_fully_valid());
        assert_eq!(field.get([0, 2]), Some(2.0));
        assert_eq!(field.get([0, 3]), Some(2.0));
        assert_eq!(field.get([1, 3]), Some(5.0));
    }

    #[test]
    fn test_empty_column_borrows_from_neighbour_position() {
        let values = Array2::from_shape_vec(
            (3, 2),
            vec![
                f64::NAN, f64::NAN, //
                4.0, 6.0, //
                f64::NAN, f64::NAN,
            ],
        )
        .unwrap();
        let mut field = MaskedField::from_values(values);
        fill_invalid_shift(&mut field);
        assert!(field.is_fully_valid());
        assert_eq!(field.get([0, 1]), Some(6.0));
        assert_eq!(field.get([2, 0]), Some(4.0));
    }

    #[test]
    fn test_fully_masked_field_terminates_masked() {
        let mut field = MaskedField::from_values(Array2::from_elem((6, 3), f64::NAN));
        fill_invalid_shift(&mut field);
        assert_eq!(field.count_invalid(), 18);
    }

    #[test]
    fn test_horizontal_reach_is_half_the_positions() {
        // Only position 0 is valid; with 5 positions the scan stops at shift 2.
        let values = Array2::from_shape_vec(
            (5, 1),
            vec![1.0, f64::NAN, f64::NAN, f64::NAN, f64::NAN],
        )
        .unwrap();
        let mut field = MaskedField::from_values(values);
        fill_invalid_shift(&mut field);
        assert_eq!(field.get([2, 0]), Some(1.0));
        assert_eq!(field.get([3, 0]), Some(1.0));
        assert_eq!(field.get([4, 0]), None);
    }
}
