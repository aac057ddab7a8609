//! Property-based tests for quarry-core helpers.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use crate::shape::{c_index_to_fortran_index, num_elements, orient, unravel};
    use crate::time::{day2sec, parse_time, sec2day, time_to_string};

    // =========================================================================
    // Strategies
    // =========================================================================

    /// Small array shapes with up to four dimensions.
    fn arb_dims() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(1usize..6, 1..5)
    }

    // =========================================================================
    // Ordering transform
    // =========================================================================

    proptest! {
        #[test]
        fn prop_c_to_fortran_is_permutation(dims in arb_dims()) {
            let count = num_elements(&dims);
            let mapped: HashSet<usize> =
                (0..count).map(|i| c_index_to_fortran_index(&dims, i)).collect();
            prop_assert_eq!(mapped.len(), count);
            prop_assert!(mapped.iter().all(|&i| i < count));
        }

        #[test]
        fn prop_c_to_fortran_matches_reversed_dims(dims in arb_dims()) {
            // element (i0..in) lands where the reversed subscript tuple sits in
            // row-major order over the reversed extents
            let reversed: Vec<usize> = dims.iter().rev().copied().collect();
            for i in 0..num_elements(&dims) {
                let subs: Vec<usize> = unravel(&dims, i).into_iter().rev().collect();
                let mut expected = 0;
                for (&sub, &extent) in subs.iter().zip(&reversed) {
                    expected = expected * extent + sub;
                }
                prop_assert_eq!(c_index_to_fortran_index(&dims, i), expected);
            }
        }

        #[test]
        fn prop_orient_is_involution(dims in arb_dims(), swap in any::<bool>()) {
            prop_assert_eq!(orient(&orient(&dims, swap), swap), dims);
        }

        // =====================================================================
        // Time helpers
        // =====================================================================

        #[test]
        fn prop_day_second_round_trip(micros in -10_000_000_000_000i64..10_000_000_000_000i64) {
            let seconds = micros as f64 / 1e6;
            let back = day2sec(sec2day(seconds));
            prop_assert!((back - seconds).abs() <= 1e-6, "{} != {}", back, seconds);
        }

        #[test]
        fn prop_time_string_round_trip(seconds in -3_000_000_000i64..3_000_000_000i64, micros in 0i64..1_000_000) {
            let value = seconds as f64 + micros as f64 / 1e6;
            let text = time_to_string(value).unwrap();
            let parsed = parse_time(&text).unwrap();
            prop_assert!((parsed - value).abs() < 1e-5, "{} -> {} -> {}", value, text, parsed);
        }
    }
}
