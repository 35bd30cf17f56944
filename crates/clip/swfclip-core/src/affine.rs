//! 2D affine matrices and their decomposition into clip channels.
//!
//! Coefficient layout follows the source document:
//!
//! ```text
//! | a c e |
//! | b d f |  <=> [a, b, c, d, e, f]
//! | 0 0 1 |
//! ```
//!
//! Decomposition is deliberately simple: scale is the length of each basis
//! column and rotation is read from the first column measured from the "up"
//! axis. Shear and reflection are not detected.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Six-coefficient 2x3 affine matrix (homogeneous row implied).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 6]", into = "[f64; 6]")]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f64; 6]> for Affine {
    fn from(m: [f64; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }
}

impl From<Affine> for [f64; 6] {
    fn from(m: Affine) -> Self {
        m.to_array()
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Pure translation.
    pub const fn translate(e: f64, f: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, e, f)
    }

    /// Identity with the translation moved to the geometric center of `bounds`.
    pub fn center_offset(bounds: &Bounds) -> Self {
        let (cx, cy) = bounds.center();
        Self::translate(cx, cy)
    }

    /// Rebuild a matrix from decomposed parts. Inverse of
    /// [`scale`](Self::scale)/[`rotation_degrees`](Self::rotation_degrees) for
    /// matrices without shear or reflection; translation is in source units.
    pub fn from_parts(translation: (f64, f64), scale: (f64, f64), rotation_degrees: f64) -> Self {
        let theta = -rotation_degrees * PI / 180.0;
        let (sin, cos) = theta.sin_cos();
        Self::new(
            scale.0 * cos,
            scale.0 * sin,
            -scale.1 * sin,
            scale.1 * cos,
            translation.0,
            translation.1,
        )
    }

    #[inline]
    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// `self ∘ other`: `other` is applied first, then `self`.
    pub fn compose(&self, other: &Affine) -> Affine {
        Affine {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Translation converted to engine units.
    #[inline]
    pub fn translation(&self, unit_divisor: f64) -> (f64, f64) {
        (self.e * unit_divisor, self.f * unit_divisor)
    }

    /// Length of each basis column. Always non-negative.
    #[inline]
    pub fn scale(&self) -> (f64, f64) {
        (
            (self.a * self.a + self.b * self.b).sqrt(),
            (self.c * self.c + self.d * self.d).sqrt(),
        )
    }

    /// Rotation in degrees, measured from the up axis.
    #[inline]
    pub fn rotation_degrees(&self) -> f64 {
        self.a.atan2(self.b) * 180.0 / PI - 90.0
    }
}

/// Axis-aligned bounds of a shape in source units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Bounds {
    pub fn center(&self) -> (f64, f64) {
        (
            self.xmin + (self.xmax - self.xmin) / 2.0,
            self.ymin + (self.ymax - self.ymin) / 2.0,
        )
    }
}
