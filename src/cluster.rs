//! Iterative refinement passes that spread sampled colors evenly through the
//! gamut under a perceptual distance metric.

use rand::Rng;

use crate::color::{Lab, Rgb};
use crate::distance::{CachedDistances, DistanceMetric};

/// Algorithm used to redistribute the sampled colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clustering {
    /// Force-vector repulsion (fast).
    ForceVector,
    /// K-means relaxation against a gamut sample grid (slow).
    KMeans,
}

const REPULSION: f64 = 100.0;
const SPEED: f64 = 100.0;

/// Repulsion refinement: `quality * 20` steps of pairwise inverse-square
/// repulsion, displacement capped per step, candidates kept only while they
/// stay inside the gamut filter.
pub(crate) fn force_vector<R, F>(
    rng: &mut R,
    distances: &mut CachedDistances,
    metric: DistanceMetric,
    filter: &F,
    quality: u32,
    colors: &mut [Lab],
) where
    R: Rng + ?Sized,
    F: Fn(&Rgb, &Lab) -> bool,
{
    let n = colors.len();
    let mut vectors = vec![[0.0f64; 3]; n];
    let mut steps = quality * 20;

    while steps > 0 {
        steps -= 1;

        for v in vectors.iter_mut() {
            *v = [0.0; 3];
        }

        for i in 0..n {
            let a = colors[i];

            for j in 0..i {
                let b = colors[j];
                let d = distances.evaluate(metric, &a, &b);

                if d > 0.0 {
                    let dl = a.l - b.l;
                    let da = a.a - b.a;
                    let db = a.b - b.b;
                    let scale = REPULSION / (d * d) / d;

                    vectors[i][0] += dl * scale;
                    vectors[i][1] += da * scale;
                    vectors[i][2] += db * scale;
                    vectors[j][0] -= dl * scale;
                    vectors[j][1] -= da * scale;
                    vectors[j][2] -= db * scale;
                } else {
                    // Coincident colors cannot repel; jitter one loose
                    vectors[j][0] += 2.0 - 4.0 * rng.gen::<f64>();
                    vectors[j][1] += 2.0 - 4.0 * rng.gen::<f64>();
                    vectors[j][2] += 2.0 - 4.0 * rng.gen::<f64>();
                }
            }
        }

        for i in 0..n {
            let color = colors[i];
            let v = vectors[i];
            let length = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            let displacement = SPEED * length;

            if displacement > 0.0 {
                let ratio = SPEED * 0.1f64.min(displacement) / displacement;
                let candidate = Lab::new(
                    color.l + v[0] * ratio,
                    color.a + v[1] * ratio,
                    color.b + v[2] * ratio,
                );
                let rgb = candidate.to_rgb();

                if filter(&rgb, &candidate) {
                    colors[i] = candidate;
                }
            }
        }
    }
}

/// K-means relaxation: assign a dense grid of gamut-valid LAB samples to
/// their nearest palette color, then move each color to its cluster
/// centroid. A centroid that leaves the gamut is replaced by the nearest
/// grid sample not yet consumed this iteration, or the nearest overall once
/// the free list is empty.
pub(crate) fn k_means<F>(
    distances: &mut CachedDistances,
    metric: DistanceMetric,
    filter: &F,
    ultra_precision: bool,
    quality: u32,
    colors: &mut [Lab],
) where
    F: Fn(&Rgb, &Lab) -> bool,
{
    let l_inc = if ultra_precision { 1 } else { 5 };
    let a_inc = if ultra_precision { 5 } else { 10 };
    let b_inc = if ultra_precision { 5 } else { 10 };

    let mut samples = Vec::new();
    for l in (0..=100).step_by(l_inc) {
        for a in (-100..=100i32).step_by(a_inc) {
            for b in (-100..=100i32).step_by(b_inc) {
                let lab = Lab::new(f64::from(l), f64::from(a), f64::from(b));
                let rgb = lab.to_rgb();

                if filter(&rgb, &lab) {
                    samples.push(lab);
                }
            }
        }
    }

    let mut sample_closest = vec![usize::MAX; samples.len()];
    let mut steps = quality;

    while steps > 0 {
        steps -= 1;

        for (i, sample) in samples.iter().enumerate() {
            let mut min_distance = f64::INFINITY;

            for (j, color) in colors.iter().enumerate() {
                let d = distances.evaluate(metric, color, sample);

                if d < min_distance {
                    min_distance = d;
                    sample_closest[i] = j;
                }
            }
        }

        let mut free_samples: Vec<Lab> = samples.clone();

        for j in 0..colors.len() {
            let mut count = 0usize;
            let mut candidate = Lab::new(0.0, 0.0, 0.0);

            for (i, sample) in samples.iter().enumerate() {
                if sample_closest[i] == j {
                    count += 1;
                    candidate = Lab::new(
                        candidate.l + sample.l,
                        candidate.a + sample.a,
                        candidate.b + sample.b,
                    );
                }
            }

            if count == 0 {
                continue;
            }

            candidate = Lab::new(
                candidate.l / count as f64,
                candidate.a / count as f64,
                candidate.b / count as f64,
            );
            let rgb = candidate.to_rgb();

            if filter(&rgb, &candidate) {
                colors[j] = candidate;
            } else {
                // Centroid drifted out of the gamut; fall back to a sample
                let pool = if free_samples.is_empty() {
                    &samples
                } else {
                    &free_samples
                };

                let mut min_distance = f64::INFINITY;
                let mut closest = 0;
                for (i, sample) in pool.iter().enumerate() {
                    let d = distances.evaluate(metric, sample, &candidate);

                    if d < min_distance {
                        min_distance = d;
                        closest = i;
                    }
                }

                let chosen = pool[closest];
                colors[j] = chosen;
                free_samples.retain(|s| s.l != chosen.l || s.a != chosen.a || s.b != chosen.b);
            }
        }
    }
}

/// Order colors with the pairwise distance-sign comparator.
///
/// The comparator is not a total order (distance is symmetric), so this is a
/// local insertion sort rather than `slice::sort_by`, which may reject such
/// comparators. Callers must not rely on a particular resulting order beyond
/// determinism for identical inputs.
pub(crate) fn sort_by_distance_sign(
    colors: &mut [Lab],
    distances: &mut CachedDistances,
    metric: DistanceMetric,
    negate: bool,
) {
    for i in 1..colors.len() {
        let mut j = i;
        while j > 0 {
            let d = distances.evaluate(metric, &colors[j], &colors[j - 1]);
            let sign = if negate { -d } else { d };
            if sign < 0.0 {
                colors.swap(j, j - 1);
                j -= 1;
            } else {
                break;
            }
        }
    }
}
