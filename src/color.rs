//! Color value types and conversions.
//!
//! CIELAB (D65) is the working space for palette generation; LCH is its polar
//! form and is only consulted for gamut filtering. RGB carries components in
//! [0, 1] and is the boundary representation handed back to callers.
//!
//! Conversions are deliberately unclamped: a LAB color outside the sRGB gamut
//! converts to RGB components outside [0, 1]. Downstream consumers (gamut
//! filters, the dichromacy simulation) depend on seeing those raw values.

/// CIELAB color. `l` in [0, 100], `a` and `b` nominally in [-100, 100].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// Polar form of [`Lab`]: lightness, chroma, hue angle in degrees [0, 360).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lch {
    pub l: f64,
    pub c: f64,
    pub h: f64,
}

/// sRGB color with components in [0, 1] plus alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

/// HSV color. `h` in degrees [0, 360), `s` and `v` in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
    pub a: f64,
}

// D65 reference white
const XN: f64 = 0.95047;
const YN: f64 = 1.0;
const ZN: f64 = 1.08883;

// CIE f(t) threshold: (6/29)^3
const EPSILON: f64 = 0.008856;
const KAPPA: f64 = 7.787;

fn lab_f(t: f64) -> f64 {
    if t > EPSILON {
        t.cbrt()
    } else {
        KAPPA * t + 16.0 / 116.0
    }
}

fn lab_f_inv(t: f64) -> f64 {
    let t3 = t * t * t;
    if t3 > EPSILON {
        t3
    } else {
        (t - 16.0 / 116.0) / KAPPA
    }
}

/// sRGB gamma expansion. Negative inputs stay on the linear segment so that
/// out-of-gamut components pass through without producing NaN.
fn srgb_to_linear(c: f64) -> f64 {
    if c > 0.04045 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

/// sRGB gamma compression, same negative passthrough as [`srgb_to_linear`].
fn linear_to_srgb(c: f64) -> f64 {
    if c > 0.003_130_8 {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    } else {
        12.92 * c
    }
}

impl Lab {
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// Convert to sRGB via XYZ (D65). Unclamped.
    pub fn to_rgb(self) -> Rgb {
        let fy = (self.l + 16.0) / 116.0;
        let fx = self.a / 500.0 + fy;
        let fz = fy - self.b / 200.0;

        let x = lab_f_inv(fx) * XN;
        let y = lab_f_inv(fy) * YN;
        let z = lab_f_inv(fz) * ZN;

        let r = x * 3.240_969_941_9 + y * -1.537_383_177_6 + z * -0.498_610_760_3;
        let g = x * -0.969_243_636_3 + y * 1.875_967_501_5 + z * 0.041_555_057_4;
        let b = x * 0.055_630_079_7 + y * -0.203_976_958_9 + z * 1.056_971_514_2;

        Rgb {
            r: linear_to_srgb(r),
            g: linear_to_srgb(g),
            b: linear_to_srgb(b),
            a: 1.0,
        }
    }

    /// Polar form. Hue is normalized to [0, 360).
    pub fn to_lch(self) -> Lch {
        let c = (self.a * self.a + self.b * self.b).sqrt();
        let mut h = self.b.atan2(self.a).to_degrees();
        if h < 0.0 {
            h += 360.0;
        }
        Lch { l: self.l, c, h }
    }
}

impl Lch {
    pub const fn new(l: f64, c: f64, h: f64) -> Self {
        Self { l, c, h }
    }

    pub fn to_lab(self) -> Lab {
        Lab {
            l: self.l,
            a: self.c * self.h.to_radians().cos(),
            b: self.c * self.h.to_radians().sin(),
        }
    }
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Convert to CIELAB via XYZ (D65).
    pub fn to_lab(self) -> Lab {
        let r = srgb_to_linear(self.r);
        let g = srgb_to_linear(self.g);
        let b = srgb_to_linear(self.b);

        let x = r * 0.412_390_799_3 + g * 0.357_584_339_4 + b * 0.180_480_788_4;
        let y = r * 0.212_639_005_9 + g * 0.715_168_678_8 + b * 0.072_192_315_4;
        let z = r * 0.019_330_818_7 + g * 0.119_194_779_8 + b * 0.950_532_152_2;

        let fx = lab_f(x / XN);
        let fy = lab_f(y / YN);
        let fz = lab_f(z / ZN);

        Lab {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    /// Pack into 0xAARRGGBB.
    pub fn to_hex(self) -> u32 {
        let a = (self.a * 255.0) as u32;
        let r = (self.r * 255.0) as u32;
        let g = (self.g * 255.0) as u32;
        let b = (self.b * 255.0) as u32;
        (a << 24) | (r << 16) | (g << 8) | b
    }

    pub fn opacify(self, alpha: f64) -> Self {
        Self { a: alpha, ..self }
    }
}

impl Hsv {
    pub const fn new(h: f64, s: f64, v: f64, a: f64) -> Self {
        Self { h, s, v, a }
    }

    pub fn to_rgb(self) -> Rgb {
        let h = self.h.rem_euclid(360.0) / 60.0;
        let c = self.v * self.s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let m = self.v - c;

        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        Rgb {
            r: r + m,
            g: g + m,
            b: b + m,
            a: self.a,
        }
    }
}
