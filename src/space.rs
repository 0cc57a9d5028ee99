//! LCH gamut regions used to constrain generated palettes.

use crate::color::{Lab, Rgb};

/// A bounding region in LCH space.
///
/// `hmin`/`hmax` are hue degrees in [0, 360]; `hmin > hmax` denotes a hue
/// range that wraps through 0°. Chroma and lightness bounds are in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSpace {
    pub hmin: f64,
    pub hmax: f64,
    pub cmin: f64,
    pub cmax: f64,
    pub lmin: f64,
    pub lmax: f64,
}

impl ColorSpace {
    pub const fn new(hmin: f64, hmax: f64, cmin: f64, cmax: f64, lmin: f64, lmax: f64) -> Self {
        Self {
            hmin,
            hmax,
            cmin,
            cmax,
            lmin,
            lmax,
        }
    }

    pub const ALL: Self = Self::new(0.0, 360.0, 0.0, 100.0, 0.0, 100.0);
    pub const DEFAULT: Self = Self::new(0.0, 360.0, 30.0, 80.0, 35.0, 80.0);
    pub const COLORBLIND: Self = Self::new(0.0, 360.0, 40.0, 70.0, 15.0, 85.0);
    pub const FANCY_LIGHT: Self = Self::new(0.0, 360.0, 15.0, 40.0, 70.0, 100.0);
    pub const FANCY_DARK: Self = Self::new(0.0, 360.0, 8.0, 40.0, 7.0, 40.0);
    pub const SHADES: Self = Self::new(0.0, 240.0, 0.0, 15.0, 0.0, 100.0);
    pub const TARNISH: Self = Self::new(0.0, 360.0, 0.0, 15.0, 30.0, 70.0);
    pub const PASTEL: Self = Self::new(0.0, 360.0, 0.0, 30.0, 70.0, 100.0);
    pub const PIMP: Self = Self::new(0.0, 360.0, 30.0, 100.0, 25.0, 70.0);
    pub const INTENSE: Self = Self::new(0.0, 360.0, 20.0, 100.0, 15.0, 80.0);
    pub const FLUO: Self = Self::new(0.0, 300.0, 35.0, 100.0, 75.0, 100.0);
    pub const RED_ROSES: Self = Self::new(330.0, 20.0, 10.0, 100.0, 35.0, 100.0);
    pub const OCHRE_SAND: Self = Self::new(20.0, 60.0, 20.0, 50.0, 35.0, 100.0);
    pub const YELLOW_LIME: Self = Self::new(60.0, 90.0, 10.0, 100.0, 35.0, 100.0);
    pub const GREEN_MINT: Self = Self::new(90.0, 150.0, 10.0, 100.0, 35.0, 100.0);
    pub const ICE_CUBE: Self = Self::new(150.0, 200.0, 0.0, 100.0, 35.0, 100.0);
    pub const BLUE_OCEAN: Self = Self::new(220.0, 260.0, 8.0, 80.0, 0.0, 50.0);
    pub const INDIGO_NIGHT: Self = Self::new(260.0, 290.0, 40.0, 100.0, 35.0, 100.0);
    pub const PURPLE_WINE: Self = Self::new(290.0, 330.0, 0.0, 100.0, 0.0, 40.0);

    /// All built-in presets, for enumeration in UIs and tests.
    pub const PRESETS: [Self; 19] = [
        Self::ALL,
        Self::DEFAULT,
        Self::COLORBLIND,
        Self::FANCY_LIGHT,
        Self::FANCY_DARK,
        Self::SHADES,
        Self::TARNISH,
        Self::PASTEL,
        Self::PIMP,
        Self::INTENSE,
        Self::FLUO,
        Self::RED_ROSES,
        Self::OCHRE_SAND,
        Self::YELLOW_LIME,
        Self::GREEN_MINT,
        Self::ICE_CUBE,
        Self::BLUE_OCEAN,
        Self::INDIGO_NIGHT,
        Self::PURPLE_WINE,
    ];

    /// Whether a LAB color falls inside this region. Total; never errors.
    pub fn contains(&self, lab: &Lab) -> bool {
        let lch = lab.to_lch();
        let hue_ok = if self.hmin < self.hmax {
            lch.h >= self.hmin && lch.h <= self.hmax
        } else {
            lch.h >= self.hmin || lch.h <= self.hmax
        };
        hue_ok
            && lch.c >= self.cmin
            && lch.c <= self.cmax
            && lch.l >= self.lmin
            && lch.l <= self.lmax
    }

    /// The region as a color filter predicate.
    ///
    /// The RGB argument is unused by preset filters but part of the filter
    /// signature so custom filters can also reject on displayability.
    pub fn filter(&self) -> impl Fn(&Rgb, &Lab) -> bool + '_ {
        move |_rgb, lab| self.contains(lab)
    }
}

impl Default for ColorSpace {
    fn default() -> Self {
        Self::DEFAULT
    }
}
