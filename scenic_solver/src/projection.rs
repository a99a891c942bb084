// Copyright 2026 the Scenic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Matrix-backed projection: express a point in another coordinate frame
//! without duplicating state.

use alloc::rc::Rc;
use core::cell::RefCell;

use scenic_matrix::{Matrix, SingularMatrixError};

use crate::variable::Variable;

/// Projects a point expressed in one frame (`orig`) through a `Matrix` into
/// another frame, exposing the projected coordinates as ordinary
/// [`Variable`]s so they can be read and subscribed to exactly like any
/// other variable.
///
/// Writing through [`MatrixProjection::set_x`]/[`set_y`](MatrixProjection::set_y)
/// updates the projected variable *and* walks the write back through the
/// inverse matrix into `orig`, so "the same point in another frame" never
/// duplicates state: `orig` is the single source of truth, and the
/// projection is kept in sync in both directions.
pub struct MatrixProjection {
    orig: (Variable, Variable),
    matrix: Rc<RefCell<Matrix>>,
    x: Variable,
    y: Variable,
}

impl MatrixProjection {
    /// Create a projection of `orig` through `matrix`, computing the initial
    /// projected position immediately.
    #[must_use]
    pub fn new(orig: (Variable, Variable), matrix: Rc<RefCell<Matrix>>) -> Self {
        let (px, py) = matrix
            .borrow()
            .transform_point(orig.0.value(), orig.1.value());
        let x = Variable::new(px, orig.0.strength());
        let y = Variable::new(py, orig.1.strength());
        Self {
            orig,
            matrix,
            x,
            y,
        }
    }

    /// The projected x variable (read/subscribe like any other [`Variable`]).
    #[must_use]
    pub fn x(&self) -> Variable {
        self.x.clone()
    }

    /// The projected y variable (read/subscribe like any other [`Variable`]).
    #[must_use]
    pub fn y(&self) -> Variable {
        self.y.clone()
    }

    /// Write a new projected x, propagating the change back into `orig`
    /// through the inverse matrix.
    pub fn set_x(&self, x: f64) -> Result<(), SingularMatrixError> {
        self.x.set_value(x);
        self.update_orig()
    }

    /// Write a new projected y, propagating the change back into `orig`
    /// through the inverse matrix.
    pub fn set_y(&self, y: f64) -> Result<(), SingularMatrixError> {
        self.y.set_value(y);
        self.update_orig()
    }

    /// Recompute the projected position from `orig` and the current matrix.
    /// Call this after the matrix (or `orig`) changed externally.
    pub fn refresh(&self) {
        let (px, py) = self
            .matrix
            .borrow()
            .transform_point(self.orig.0.value(), self.orig.1.value());
        self.x.set_value(px);
        self.y.set_value(py);
    }

    fn update_orig(&self) -> Result<(), SingularMatrixError> {
        let inv = self.matrix.borrow().invert()?;
        let (ox, oy) = inv.transform_point(self.x.value(), self.y.value());
        self.orig.0.set_value(ox);
        self.orig.1.set_value(oy);
        Ok(())
    }
}
