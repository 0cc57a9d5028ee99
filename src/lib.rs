#![forbid(unsafe_code)]

//! Perceptually even color palettes and animated GIF encoding.
//!
//! The palette generator samples colors in CIELAB, constrains them to an
//! LCH gamut region, and spreads them apart with an iterative refinement
//! pass (force-vector repulsion or k-means relaxation) under a pluggable
//! perceptual distance metric — including metrics that first run the colors
//! through a colorblindness simulation, so palettes stay distinguishable
//! for dichromat viewers.
//!
//! The GIF side quantizes RGB frames with NeuQuant, compresses the indexed
//! pixels with GIF-variant LZW, and writes complete GIF89a streams.
//!
//! ```no_run
//! use huequant::{generate_palette, PaletteConfig, ColorSpace, DistanceMetric};
//! use rand::SeedableRng;
//!
//! let config = PaletteConfig::new()
//!     .space(ColorSpace::PASTEL)
//!     .distance(DistanceMetric::Compromise);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let colors = generate_palette(6, &config, &mut rng).unwrap();
//! assert_eq!(colors.len(), 6);
//! ```

pub mod cluster;
pub mod color;
pub mod distance;
pub mod error;
pub mod gif;
pub mod lzw;
pub mod neuquant;
pub mod palette;
pub mod space;

pub use cluster::Clustering;
pub use color::{Hsv, Lab, Lch, Rgb};
pub use distance::{CachedDistances, DistanceMetric};
pub use error::{GifError, PaletteError};
pub use gif::{Dispose, GifEncoder, GifWriter};
pub use palette::Palette;
pub use space::ColorSpace;

use rand::Rng;

/// Configuration for palette generation.
#[derive(Debug, Clone)]
pub struct PaletteConfig {
    /// Gamut preset constraining generated colors (preset entry point only).
    pub space: ColorSpace,
    /// Refinement algorithm.
    pub clustering: Clustering,
    /// Distance metric driving refinement and final ordering.
    pub distance: DistanceMetric,
    /// Refinement effort: step factor for force-vector, iteration count for
    /// k-means. Must be greater than 0.
    pub quality: u32,
    /// Densify the k-means sampling grid (slower, higher fidelity).
    pub ultra_precision: bool,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            space: ColorSpace::DEFAULT,
            clustering: Clustering::KMeans,
            distance: DistanceMetric::Compromise,
            quality: 50,
            ultra_precision: false,
        }
    }
}

impl PaletteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn space(mut self, space: ColorSpace) -> Self {
        self.space = space;
        self
    }

    pub fn clustering(mut self, clustering: Clustering) -> Self {
        self.clustering = clustering;
        self
    }

    pub fn distance(mut self, distance: DistanceMetric) -> Self {
        self.distance = distance;
        self
    }

    pub fn quality(mut self, quality: u32) -> Self {
        self.quality = quality;
        self
    }

    pub fn ultra_precision(mut self, ultra_precision: bool) -> Self {
        self.ultra_precision = ultra_precision;
        self
    }
}

/// Generate `count` colors inside the configured gamut preset.
///
/// Colors are sampled uniformly in the preset's LCH box, refined by the
/// configured clustering pass, ordered, and converted to RGB.
pub fn generate_palette<R>(
    count: usize,
    config: &PaletteConfig,
    rng: &mut R,
) -> Result<Vec<Rgb>, PaletteError>
where
    R: Rng + ?Sized,
{
    validate_inputs(count, config.quality)?;

    let mut distances = CachedDistances::new();
    let space = config.space;
    let filter = space.filter();
    let mut colors = sample_lch_colors(rng, count, &space);

    refine(rng, &mut distances, config, &filter, &mut colors);

    cluster::sort_by_distance_sign(&mut colors, &mut distances, config.distance, true);
    Ok(colors.into_iter().map(Lab::to_rgb).collect())
}

/// Generate `count` colors passing an arbitrary filter predicate.
///
/// Colors are rejection-sampled uniformly over the LAB box
/// `l in [0, 100], a and b in [-100, 100]` until the filter accepts them.
/// There is no iteration cap: a filter that rejects everything makes this
/// loop forever, so the predicate must accept a non-empty gamut region.
pub fn generate_palette_with<R, F>(
    count: usize,
    filter: F,
    config: &PaletteConfig,
    rng: &mut R,
) -> Result<Vec<Rgb>, PaletteError>
where
    R: Rng + ?Sized,
    F: Fn(&Rgb, &Lab) -> bool,
{
    validate_inputs(count, config.quality)?;

    let mut distances = CachedDistances::new();
    let mut colors = sample_lab_colors(rng, count, &filter);

    refine(rng, &mut distances, config, &filter, &mut colors);

    cluster::sort_by_distance_sign(&mut colors, &mut distances, config.distance, false);
    Ok(colors.into_iter().map(Lab::to_rgb).collect())
}

fn refine<R, F>(
    rng: &mut R,
    distances: &mut CachedDistances,
    config: &PaletteConfig,
    filter: &F,
    colors: &mut [Lab],
) where
    R: Rng + ?Sized,
    F: Fn(&Rgb, &Lab) -> bool,
{
    match config.clustering {
        Clustering::ForceVector => cluster::force_vector(
            rng,
            distances,
            config.distance,
            filter,
            config.quality,
            colors,
        ),
        Clustering::KMeans => cluster::k_means(
            distances,
            config.distance,
            filter,
            config.ultra_precision,
            config.quality,
            colors,
        ),
    }
}

/// Uniform rejection sampling over the LAB box.
fn sample_lab_colors<R, F>(rng: &mut R, count: usize, filter: &F) -> Vec<Lab>
where
    R: Rng + ?Sized,
    F: Fn(&Rgb, &Lab) -> bool,
{
    let mut colors = Vec::with_capacity(count);
    for _ in 0..count {
        let lab = loop {
            let lab = Lab::new(
                100.0 * rng.gen::<f64>(),
                100.0 * (2.0 * rng.gen::<f64>() - 1.0),
                100.0 * (2.0 * rng.gen::<f64>() - 1.0),
            );
            let rgb = lab.to_rgb();
            if filter(&rgb, &lab) {
                break lab;
            }
        };
        colors.push(lab);
    }
    colors
}

/// Direct sampling inside an LCH preset box; no rejection needed.
fn sample_lch_colors<R>(rng: &mut R, count: usize, space: &ColorSpace) -> Vec<Lab>
where
    R: Rng + ?Sized,
{
    (0..count)
        .map(|_| {
            let l = map_unit(space.lmin, space.lmax, rng.gen::<f64>());
            let c = map_unit(space.cmin, space.cmax, rng.gen::<f64>());
            let h = if space.hmin <= space.hmax {
                map_unit(space.hmin, space.hmax, rng.gen::<f64>())
            } else {
                map_unit(space.hmin, 360.0 + space.hmax, rng.gen::<f64>()) % 360.0
            };
            Lch::new(l, c, h).to_lab()
        })
        .collect()
}

fn map_unit(min: f64, max: f64, t: f64) -> f64 {
    min + (max - min) * t
}

fn validate_inputs(count: usize, quality: u32) -> Result<(), PaletteError> {
    if count <= 1 {
        return Err(PaletteError::InvalidColorCount(count));
    }
    if quality == 0 {
        return Err(PaletteError::InvalidQuality(quality));
    }
    Ok(())
}
