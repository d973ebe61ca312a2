//! Batch distance calculations with optional parallelism.
//!
//! Ranking a report list by distance needs one distance per report; this
//! module computes them in one pass so comparators never recompute haversine.

use crate::{distance_between, Coordinate};

/// Lists above this size are worth fanning out across threads.
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 2048;

/// Calculate the distance in kilometers from `reference` to every coordinate.
///
/// The output has the same length and order as `targets`. A missing
/// reference, a missing target, or a non-finite component yields
/// `f64::INFINITY` for that slot.
///
/// # Example
/// ```
/// use pawfinder_geo::{distances_from, Coordinate};
///
/// let bangkok = Coordinate::new(13.7563, 100.5018);
/// let targets = vec![Some(bangkok), None];
///
/// let distances = distances_from(Some(&bangkok), &targets);
/// assert_eq!(distances, vec![0.0, f64::INFINITY]);
/// ```
pub fn distances_from(reference: Option<&Coordinate>, targets: &[Option<Coordinate>]) -> Vec<f64> {
    let Some(reference) = reference else {
        return vec![f64::INFINITY; targets.len()];
    };

    #[cfg(feature = "parallel")]
    {
        if targets.len() >= PARALLEL_THRESHOLD {
            use rayon::prelude::*;
            return targets
                .par_iter()
                .map(|target| distance_between(Some(reference), target.as_ref()))
                .collect();
        }
    }

    targets
        .iter()
        .map(|target| distance_between(Some(reference), target.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets() -> Vec<Option<Coordinate>> {
        vec![
            // Chiang Mai
            Some(Coordinate::new(18.7883, 98.9853)),
            // Bangkok
            Some(Coordinate::new(13.7563, 100.5018)),
            // No pin dropped
            None,
            // Corrupt row
            Some(Coordinate::new(f64::NAN, 100.0)),
        ]
    }

    #[test]
    fn test_distances_preserve_order() {
        let reference = Coordinate::new(13.7563, 100.5018);
        let distances = distances_from(Some(&reference), &targets());

        assert_eq!(distances.len(), 4);
        assert!(distances[0] > 500.0 && distances[0] < 700.0);
        assert_eq!(distances[1], 0.0);
        assert!(distances[2].is_infinite());
        assert!(distances[3].is_infinite());
    }

    #[test]
    fn test_no_reference_is_all_unknown() {
        let distances = distances_from(None, &targets());
        assert!(distances.iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn test_large_batch_matches_sequential() {
        let reference = Coordinate::new(13.7563, 100.5018);
        let many: Vec<Option<Coordinate>> = (0..5000)
            .map(|i| Some(Coordinate::new(5.0 + (i as f64 * 0.003) % 15.0, 97.0 + (i as f64 * 0.002) % 8.0)))
            .collect();

        let batch = distances_from(Some(&reference), &many);
        for (target, distance) in many.iter().zip(&batch) {
            assert_eq!(*distance, distance_between(Some(&reference), target.as_ref()));
        }
    }
}
