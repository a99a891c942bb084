// Copyright 2026 the Scenic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scenic Matrix: 2D affine matrix math for the scenic diagram engine.
//!
//! A [`Matrix`] is the immutable-shaped `(a, b, c, d, tx, ty)` affine used
//! throughout the engine to express an item's local (item-to-parent)
//! transform and the composed item-to-canvas transform. The convention
//! matches common 2D graphics pipelines:
//!
//! ```text
//! [x']   [a c tx]   [x]
//! [y'] = [b d ty] * [y]
//! [1 ]   [0 0  1]   [1]
//! ```
//!
//! `multiply(self, other)` post-multiplies `self` onto `other`, i.e. it
//! composes a child's local matrix onto its parent's so that
//! `child.matrix.multiply(parent_i2c)` yields the child's item-to-canvas
//! matrix. `invert` fails with [`SingularMatrixError`] rather than
//! panicking, since this is a reusable library crate and a singular
//! transform is a legitimate (if unusual) piece of scene data.
//!
//! This crate is `no_std` by default and uses no allocation; the `std` and
//! `libm` features select the trigonometry backend for [`Matrix::rotate`].

#![cfg_attr(not(feature = "std"), no_std)]

use core::fmt;

/// Determinant magnitude below which a matrix is considered singular.
pub const SINGULAR_THRESHOLD: f64 = 1e-12;

/// A 2D affine transform `(a, b, c, d, tx, ty)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix {
    /// Horizontal scale / x-basis x-component.
    pub a: f64,
    /// Horizontal shear / x-basis y-component.
    pub b: f64,
    /// Vertical shear / y-basis x-component.
    pub c: f64,
    /// Vertical scale / y-basis y-component.
    pub d: f64,
    /// Horizontal translation.
    pub tx: f64,
    /// Vertical translation.
    pub ty: f64,
}

/// Failure returned from [`Matrix::invert`] when the matrix is singular
/// (determinant magnitude below [`SINGULAR_THRESHOLD`]).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SingularMatrixError {
    /// The determinant that was too close to zero to invert.
    pub determinant: f64,
}

impl fmt::Display for SingularMatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "matrix is singular (determinant {} is within {SINGULAR_THRESHOLD} of zero)",
            self.determinant
        )
    }
}

impl core::error::Error for SingularMatrixError {}

impl Matrix {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Construct a matrix from its six components.
    #[must_use]
    pub const fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    /// A translation-only matrix.
    #[must_use]
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// A scale-only matrix about the origin.
    #[must_use]
    pub const fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// A rotation-only matrix about the origin, `theta` in radians.
    #[must_use]
    pub fn rotation(theta: f64) -> Self {
        let (s, c) = sin_cos(theta);
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    /// The determinant of the linear part `(a, b, c, d)`.
    #[must_use]
    pub const fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Compose `self` onto `other`: applies `self` first, then `other`.
    ///
    /// This is the convention used to compute item-to-canvas matrices:
    /// `child_local.multiply(parent_i2c)` is the child's item-to-canvas
    /// matrix.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            tx: self.tx * other.a + self.ty * other.c + other.tx,
            ty: self.tx * other.b + self.ty * other.d + other.ty,
        }
    }

    /// Invert this matrix, failing if it is numerically singular.
    pub fn invert(&self) -> Result<Self, SingularMatrixError> {
        let det = self.determinant();
        if det.abs() < SINGULAR_THRESHOLD {
            return Err(SingularMatrixError { determinant: det });
        }
        let inv_det = 1.0 / det;
        let a = self.d * inv_det;
        let b = -self.b * inv_det;
        let c = -self.c * inv_det;
        let d = self.a * inv_det;
        let tx = -(self.tx * a + self.ty * c);
        let ty = -(self.tx * b + self.ty * d);
        Ok(Self { a, b, c, d, tx, ty })
    }

    /// Apply this matrix to a point, returning `(x', y')`.
    #[must_use]
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.tx,
            self.b * x + self.d * y + self.ty,
        )
    }

    /// Apply only the linear part (no translation) to a vector.
    #[must_use]
    pub fn transform_vector(&self, x: f64, y: f64) -> (f64, f64) {
        (self.a * x + self.c * y, self.b * x + self.d * y)
    }

    /// Return a new matrix translated by `(dx, dy)` in the matrix's own
    /// (pre-transform) space: equivalent to `self.multiply(&Matrix::translation(dx, dy))`
    /// composed the other way — `Matrix::translation(dx, dy).multiply(self)`.
    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::translation(dx, dy).multiply(self)
    }

    /// Return a new matrix scaled by `(sx, sy)`, applied before `self`.
    #[must_use]
    pub fn scale(&self, sx: f64, sy: f64) -> Self {
        Self::scaling(sx, sy).multiply(self)
    }

    /// Return a new matrix rotated by `theta` radians, applied before `self`.
    #[must_use]
    pub fn rotate(&self, theta: f64) -> Self {
        Self::rotation(theta).multiply(self)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(feature = "std")]
fn sin_cos(theta: f64) -> (f64, f64) {
    (theta.sin(), theta.cos())
}

#[cfg(all(not(feature = "std"), feature = "libm"))]
fn sin_cos(theta: f64) -> (f64, f64) {
    (libm::sin(theta), libm::cos(theta))
}

#[cfg(all(not(feature = "std"), not(feature = "libm")))]
fn sin_cos(_theta: f64) -> (f64, f64) {
    compile_error!("scenic_matrix requires either the `std` or `libm` feature for rotation");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_round_trips() {
        let m = Matrix::IDENTITY;
        let (x, y) = m.transform_point(3.0, 4.0);
        assert_eq!((x, y), (3.0, 4.0));
    }

    #[test]
    fn translation_composes() {
        let a = Matrix::translation(5.0, 0.0);
        let b = Matrix::translation(0.0, 8.0);
        // child `b` composed onto parent `a`.
        let i2c = b.multiply(&a);
        assert_eq!(i2c, Matrix::new(1.0, 0.0, 0.0, 1.0, 5.0, 8.0));
    }

    #[test]
    fn invert_round_trips_within_tolerance() {
        let m = Matrix::translation(5.0, -3.0)
            .scale(2.0, 0.5)
            .rotate(0.3);
        let inv = m.invert().expect("non-singular");
        let (x, y) = (12.5, -7.25);
        let (px, py) = m.transform_point(x, y);
        let (rx, ry) = inv.transform_point(px, py);
        assert!((rx - x).abs() < 1e-9, "x round-trip: {rx} vs {x}");
        assert!((ry - y).abs() < 1e-9, "y round-trip: {ry} vs {y}");
    }

    #[test]
    fn invert_fails_on_singular_matrix() {
        let m = Matrix::new(1.0, 2.0, 2.0, 4.0, 0.0, 0.0);
        assert!(m.invert().is_err());
    }

    #[test]
    fn determinant_matches_definition() {
        let m = Matrix::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        assert_eq!(m.determinant(), 1.0 * 4.0 - 2.0 * 3.0);
    }
}
