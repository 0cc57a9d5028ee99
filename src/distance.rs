//! Perceptual distance metrics for palette refinement.
//!
//! All metrics are total functions `(Lab, Lab) -> f64`; none of them error.
//! Out-of-gamut inputs can drive the dichromacy simulation to NaN, and the
//! compromise metric drops NaN terms from its weighted sum rather than
//! surfacing them.

use std::collections::HashMap;

use crate::color::{Lab, Rgb};

/// Which perceptual distance to use between candidate palette colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Straight LAB Euclidean distance.
    Euclidean,
    /// CMC(2:1) perceptual distance.
    Cmc,
    /// Weighted blend of CMC and the three dichromacy metrics.
    Compromise,
    /// CMC between protanopia-simulated colors.
    Protanope,
    /// CMC between deuteranopia-simulated colors.
    Deuteranope,
    /// CMC between tritanopia-simulated colors.
    Tritanope,
}

/// Confusion points and confusion-line coefficients in xyY chromaticity,
/// one per dichromacy type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ConfusionLine {
    Protanope,
    Deuteranope,
    Tritanope,
}

impl ConfusionLine {
    /// (x, y, m, yint)
    fn coefficients(self) -> (f64, f64, f64, f64) {
        match self {
            Self::Protanope => (0.7465, 0.2535, 1.273_463, -0.073_894),
            Self::Deuteranope => (1.4, -0.4, 0.968_437, 0.003_331),
            Self::Tritanope => (0.1748, 0.0, 0.062_921, 0.292_119),
        }
    }
}

/// Memo key for one simulation call: LAB quantized to 1/100, plus the
/// dichromacy type and severity. Equal keys must return the identical
/// cached LAB value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SimulationKey {
    l: i32,
    a: i32,
    b: i32,
    line: ConfusionLine,
    amount: i32,
}

const COMPROMISE_WEIGHT: f64 = 1000.0 + 100.0 + 500.0 + 1.0;

/// Distance evaluator owning the dichromacy-simulation cache.
///
/// The cache grows unbounded for the lifetime of the evaluator; create one
/// per palette-generation call.
#[derive(Debug, Default)]
pub struct CachedDistances {
    cache: HashMap<SimulationKey, Lab>,
}

impl CachedDistances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `metric` between two LAB colors.
    pub fn evaluate(&mut self, metric: DistanceMetric, lab1: &Lab, lab2: &Lab) -> f64 {
        match metric {
            DistanceMetric::Euclidean => euclidean(lab1, lab2),
            DistanceMetric::Cmc => cmc(lab1, lab2),
            DistanceMetric::Protanope => self.colorblind(ConfusionLine::Protanope, lab1, lab2),
            DistanceMetric::Deuteranope => self.colorblind(ConfusionLine::Deuteranope, lab1, lab2),
            DistanceMetric::Tritanope => self.colorblind(ConfusionLine::Tritanope, lab1, lab2),
            DistanceMetric::Compromise => {
                let mut total = cmc(lab1, lab2) * 1000.0;

                let d = self.colorblind(ConfusionLine::Protanope, lab1, lab2);
                if !d.is_nan() {
                    total += d * 100.0;
                }

                let d = self.colorblind(ConfusionLine::Deuteranope, lab1, lab2);
                if !d.is_nan() {
                    total += d * 500.0;
                }

                let d = self.colorblind(ConfusionLine::Tritanope, lab1, lab2);
                if !d.is_nan() {
                    total += d;
                }

                total / COMPROMISE_WEIGHT
            }
        }
    }

    fn colorblind(&mut self, line: ConfusionLine, lab1: &Lab, lab2: &Lab) -> f64 {
        let s1 = self.simulate(lab1, line, 1.0);
        let s2 = self.simulate(lab2, line, 1.0);
        cmc(&s1, &s2)
    }

    /// Project a color onto the confusion line for the given dichromacy type
    /// and return the result as LAB. Memoized on the quantized input.
    fn simulate(&mut self, lab: &Lab, line: ConfusionLine, amount: f64) -> Lab {
        let key = SimulationKey {
            l: (lab.l * 100.0) as i32,
            a: (lab.a * 100.0) as i32,
            b: (lab.b * 100.0) as i32,
            line,
            amount: (amount * 100.0) as i32,
        };
        if let Some(&cached) = self.cache.get(&key) {
            return cached;
        }

        let (confuse_x, confuse_y, confuse_m, confuse_yint) = line.coefficients();

        let color = lab.to_rgb();
        let sr = color.r * 255.0;
        let sg = color.g * 255.0;
        let sb = color.b * 255.0;

        // Source color to XYZ (sRGB:D65), 2.2 gamma
        let pow_r = sr.powf(2.2);
        let pow_g = sg.powf(2.2);
        let pow_b = sb.powf(2.2);
        let mut x = pow_r * 0.412_424 + pow_g * 0.357_579 + pow_b * 0.180_464;
        let y = pow_r * 0.212_656 + pow_g * 0.715_158 + pow_b * 0.072_185_6;
        let mut z = pow_r * 0.019_332_4 + pow_g * 0.119_193 + pow_b * 0.950_444;

        // xyY chromaticity coordinates; an all-zero source divides to NaN here
        let chroma_x = x / (x + y + z);
        let chroma_y = y / (x + y + z);

        // Confusion line between the source color and the confusion point
        let m = (chroma_y - confuse_y) / (chroma_x - confuse_x);
        let yint = chroma_y - chroma_x * m;

        // Intersection with the simulation axis
        let deviate_x = (confuse_yint - yint) / (m - confuse_m);
        let deviate_y = m * deviate_x + yint;

        // Simulated color's XYZ coordinates
        x = (deviate_x * y) / deviate_y;
        z = ((1.0 - (deviate_x + deviate_y)) * y) / deviate_y;

        // Neutral grey of the same luminance (D65)
        let neutral_x = (0.312_713 * y) / 0.329_016;
        let neutral_z = (0.358_271 * y) / 0.329_016;
        let diff_x = neutral_x - x;
        let diff_z = neutral_z - z;
        let diff_r = diff_x * 3.240_71 + diff_z * -0.498_571;
        let diff_g = diff_x * -0.969_258 + diff_z * 0.041_555_7;
        let diff_b = diff_x * 0.055_635_2 + diff_z * 1.057_07;

        // XYZ back to RGB (sRGB:D65)
        let mut dr = x * 3.240_71 + y * -1.537_26 + z * -0.498_571;
        let mut dg = x * -0.969_258 + y * 1.875_99 + z * 0.041_555_7;
        let mut db = x * 0.055_635_2 + y * -0.203_996 + z * 1.057_07;

        // Shift the simulated color towards a neutral fit, proportional to
        // the channel needing the greatest shift
        let fit_r = ((if dr < 0.0 { 0.0 } else { 1.0 }) - dr) / diff_r;
        let fit_g = ((if dg < 0.0 { 0.0 } else { 1.0 }) - dg) / diff_g;
        let fit_b = ((if db < 0.0 { 0.0 } else { 1.0 }) - db) / diff_b;
        let adjust = (if fit_r > 1.0 || fit_r < 0.0 { 0.0 } else { fit_r })
            .max(if fit_g > 1.0 || fit_g < 0.0 { 0.0 } else { fit_g })
            .max(if fit_b > 1.0 || fit_b < 0.0 { 0.0 } else { fit_b });
        dr += adjust * diff_r;
        dg += adjust * diff_g;
        db += adjust * diff_b;

        // Gamma correction; negative channels go NaN here and stay NaN
        dr = dr.powf(1.0 / 2.2);
        dg = dg.powf(1.0 / 2.2);
        db = db.powf(1.0 / 2.2);

        // Anomylize against the source by severity
        dr = sr * (1.0 - amount) + dr * amount;
        dg = sg * (1.0 - amount) + dg * amount;
        db = sb * (1.0 - amount) + db * amount;

        let result = Rgb::rgb(dr / 255.0, dg / 255.0, db / 255.0).to_lab();
        self.cache.insert(key, result);
        result
    }
}

/// LAB Euclidean distance.
pub fn euclidean(lab1: &Lab, lab2: &Lab) -> f64 {
    ((lab1.l - lab2.l) * (lab1.l - lab2.l)
        + (lab1.a - lab2.a) * (lab1.a - lab2.a)
        + (lab1.b - lab2.b) * (lab1.b - lab2.b))
        .sqrt()
}

/// CMC(2:1) color difference.
pub fn cmc(lab1: &Lab, lab2: &Lab) -> f64 {
    cmc_weighted(lab1, lab2, 2.0, 1.0)
}

fn cmc_weighted(lab1: &Lab, lab2: &Lab, l: f64, c: f64) -> f64 {
    let l1 = lab1.l;
    let l2 = lab2.l;
    let a1 = lab1.a;
    let a2 = lab2.a;
    let b1 = lab1.b;
    let b2 = lab2.b;
    let c1 = (a1 * a1 + b1 * b1).sqrt();
    let c2 = (a2 * a2 + b2 * b2).sqrt();
    let delta_c = c1 - c2;
    let delta_l = l1 - l2;
    let delta_a = a1 - a2;
    let delta_b = b1 - b2;
    let delta_h = (delta_a * delta_a + delta_b * delta_b + delta_c * delta_c).sqrt();
    let mut h1 = b1.atan2(a1).to_degrees();
    while h1 < 0.0 {
        h1 += 360.0;
    }
    let f = (c1.powi(4) / (c1.powi(4) + 1900.0)).sqrt();
    // The T weighting feeds the hue angle in degrees straight into cos
    let t = if (164.0..=345.0).contains(&h1) {
        0.56 + (0.2 * (h1 + 168.0).cos()).abs()
    } else {
        0.36 + (0.4 * (h1 + 35.0).cos()).abs()
    };
    let sl = if l1 < 16.0 {
        0.511
    } else {
        (0.040_975 * l1) / (1.0 + 0.017_65 * l1)
    };
    let sc = (0.0638 * c1) / (1.0 + 0.0131 * c1) + 0.638;
    let sh = sc * (f * t + 1.0 - f);
    ((delta_l / (l * sl)).powi(2) + (delta_c / (c * sc)).powi(2) + (delta_h / sh).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Lab = Lab::new(53.0, 80.0, 67.0);
    const TEAL: Lab = Lab::new(60.0, -35.0, -5.0);

    #[test]
    fn euclidean_symmetric_and_zero_on_identity() {
        assert_eq!(euclidean(&RED, &RED), 0.0);
        assert_eq!(euclidean(&RED, &TEAL), euclidean(&TEAL, &RED));
        assert!(euclidean(&RED, &TEAL) > 0.0);
    }

    #[test]
    fn cmc_non_negative_and_zero_on_identity() {
        // CMC weights by the first color's chroma/hue, so full symmetry does
        // not hold; both directions must still be non-negative and finite.
        let ab = cmc(&RED, &TEAL);
        let ba = cmc(&TEAL, &RED);
        assert!(ab > 0.0 && ab.is_finite());
        assert!(ba > 0.0 && ba.is_finite());
        assert_eq!(cmc(&TEAL, &TEAL), 0.0);
    }

    #[test]
    fn achromatic_special_case_stays_finite() {
        let near_black = Lab::new(4.0, 0.0, 0.0);
        let d = cmc(&near_black, &RED);
        assert!(d.is_finite(), "low-lightness CMC produced {d}");
    }

    #[test]
    fn simulation_is_deterministic_per_key() {
        let mut distances = CachedDistances::new();
        let first = distances.evaluate(DistanceMetric::Protanope, &RED, &TEAL);
        let second = distances.evaluate(DistanceMetric::Protanope, &RED, &TEAL);
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn simulation_cache_deduplicates() {
        let mut distances = CachedDistances::new();
        distances.evaluate(DistanceMetric::Deuteranope, &RED, &TEAL);
        let populated = distances.cache.len();
        distances.evaluate(DistanceMetric::Deuteranope, &RED, &TEAL);
        assert_eq!(distances.cache.len(), populated);
        assert_eq!(populated, 2);
    }

    #[test]
    fn compromise_filters_nan_terms() {
        // Pure black simulates to NaN (zero XYZ sum), so only the CMC term
        // may contribute; the result must still be finite.
        let black = Lab::new(0.0, 0.0, 0.0);
        let mut distances = CachedDistances::new();
        assert!(distances
            .evaluate(DistanceMetric::Protanope, &black, &RED)
            .is_nan());
        let d = distances.evaluate(DistanceMetric::Compromise, &black, &RED);
        assert!(d.is_finite(), "compromise leaked NaN: {d}");
    }

    #[test]
    fn metrics_disagree() {
        let mut distances = CachedDistances::new();
        let e = distances.evaluate(DistanceMetric::Euclidean, &RED, &TEAL);
        let c = distances.evaluate(DistanceMetric::Cmc, &RED, &TEAL);
        assert!((e - c).abs() > 1e-9, "expected distinct metrics: {e} vs {c}");
    }
}
