//! Fixed palettes built by spreading hues around a random base color.
//!
//! This is the quick-and-cheap counterpart to the full generator in
//! [`crate::generate_palette`]: no perceptual optimization, just evenly
//! spaced hues at a shared saturation, useful for sketching.

use rand::Rng;

use crate::color::{Hsv, Rgb};

/// Hue spacing between neighboring palette entries, in degrees.
const HUE_STEP: f64 = 15.0;

/// An immutable list of related colors with random access.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Build a palette of `count` colors fanned out around a random base
    /// hue, at a random shared saturation in [0.6, 1) and full value.
    pub fn spread<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let base_hue = 360.0 * rng.gen::<f64>();
        let saturation = 0.6 + 0.4 * rng.gen::<f64>();

        let colors = (0..count)
            .map(|i| {
                let mut hue = (i as f64 - count as f64 * 0.5) * HUE_STEP + base_hue;
                if hue < 0.0 {
                    hue += 360.0;
                }
                if hue > 360.0 {
                    hue -= 360.0;
                }
                Hsv::new(hue, saturation, 1.0, 1.0).to_rgb()
            })
            .collect();

        Self { colors }
    }

    /// A palette over explicit colors.
    pub fn from_colors(colors: Vec<Rgb>) -> Self {
        Self { colors }
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// A uniformly random palette entry.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Rgb {
        self.colors[rng.gen_range(0..self.colors.len())]
    }

    /// A uniformly random palette entry with its alpha replaced.
    pub fn random_with_alpha<R: Rng + ?Sized>(&self, rng: &mut R, alpha: f64) -> Rgb {
        self.random(rng).opacify(alpha)
    }
}
