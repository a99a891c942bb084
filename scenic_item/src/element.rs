// Copyright 2026 the Scenic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangular items: four corner handles held square by equality and
//! minimum-size constraints.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use scenic_matrix::Matrix;
use scenic_solver::{Constraint, EqualsConstraint, NORMAL, REQUIRED, Variable};

use crate::port::LinePort;
use crate::{Handle, Item, Port, UpdateContext};

/// Index of a corner handle within [`Element::handles`], in the fixed
/// clockwise order the element's edge constraints assume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    /// `(0, 0)` at construction.
    TopLeft,
    /// `(width, 0)` at construction.
    TopRight,
    /// `(width, height)` at construction.
    BottomRight,
    /// `(0, height)` at construction.
    BottomLeft,
}

/// Holds `right - left >= min`, nudging whichever side is weaker when the
/// span collapses below `min`. Shaped like
/// [`LessThanConstraint`](scenic_solver::LessThanConstraint), but over a
/// span of two variables rather than a direct comparison of them.
#[derive(Debug, Clone)]
struct MinSpanConstraint {
    low: Variable,
    high: Variable,
    min: Variable,
}

impl Constraint for MinSpanConstraint {
    fn variables(&self) -> Vec<Variable> {
        vec![self.low.clone(), self.high.clone(), self.min.clone()]
    }

    fn weakest(&self) -> Variable {
        if self.low.strength() <= self.high.strength() {
            self.low.clone()
        } else {
            self.high.clone()
        }
    }

    fn solve(&self) {
        let span = self.high.value() - self.low.value();
        if span >= self.min.value() {
            return;
        }
        if self.low.strength() <= self.high.strength() {
            self.low.set_value(self.high.value() - self.min.value());
        } else {
            self.high.set_value(self.low.value() + self.min.value());
        }
    }
}

/// A rectangular item: four corner handles kept square by two equality
/// constraints per axis and a minimum-size constraint per dimension.
#[derive(Debug)]
pub struct Element {
    matrix: Matrix,
    handles: [Handle; 4],
    min_width: Variable,
    min_height: Variable,
    constraints: Vec<Box<dyn Constraint>>,
}

impl Element {
    /// Build an element of the given size at the origin, with a default
    /// minimum width and height of `1.0`.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        let top_left = Handle::new(0.0, 0.0, REQUIRED);
        let top_right = Handle::new(width, 0.0, REQUIRED);
        let bottom_right = Handle::new(width, height, REQUIRED);
        let bottom_left = Handle::new(0.0, height, REQUIRED);
        let min_width = Variable::new(1.0, NORMAL);
        let min_height = Variable::new(1.0, NORMAL);

        let constraints: Vec<Box<dyn Constraint>> = vec![
            Box::new(EqualsConstraint::new(top_left.y(), top_right.y())),
            Box::new(EqualsConstraint::new(bottom_left.y(), bottom_right.y())),
            Box::new(EqualsConstraint::new(top_left.x(), bottom_left.x())),
            Box::new(EqualsConstraint::new(top_right.x(), bottom_right.x())),
            Box::new(MinSpanConstraint {
                low: top_left.x(),
                high: top_right.x(),
                min: min_width.clone(),
            }),
            Box::new(MinSpanConstraint {
                low: top_left.y(),
                high: bottom_left.y(),
                min: min_height.clone(),
            }),
        ];

        Self {
            matrix: Matrix::IDENTITY,
            handles: [top_left, top_right, bottom_right, bottom_left],
            min_width,
            min_height,
            constraints,
        }
    }

    /// Read one corner handle.
    #[must_use]
    pub fn corner(&self, corner: Corner) -> &Handle {
        &self.handles[corner as usize]
    }

    /// Current width, read from the top edge.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.handles[1].x().value() - self.handles[0].x().value()
    }

    /// Current height, read from the left edge.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.handles[3].y().value() - self.handles[0].y().value()
    }

    /// The minimum-width variable, shared with this element's
    /// [`MinSpanConstraint`].
    #[must_use]
    pub fn min_width(&self) -> Variable {
        self.min_width.clone()
    }

    /// The minimum-height variable, shared with this element's
    /// [`MinSpanConstraint`].
    #[must_use]
    pub fn min_height(&self) -> Variable {
        self.min_height.clone()
    }
}

impl Item for Element {
    fn matrix(&self) -> Matrix {
        self.matrix
    }

    fn set_matrix(&mut self, matrix: Matrix) {
        self.matrix = matrix;
    }

    fn handles(&self) -> &[Handle] {
        &self.handles
    }

    fn handles_mut(&mut self) -> &mut [Handle] {
        &mut self.handles
    }

    fn ports(&self) -> Vec<Box<dyn Port>> {
        let corners: Vec<_> = self.handles.iter().map(Handle::pos).collect();
        vec![
            Box::new(LinePort::new(corners[0].clone(), corners[1].clone())),
            Box::new(LinePort::new(corners[1].clone(), corners[2].clone())),
            Box::new(LinePort::new(corners[2].clone(), corners[3].clone())),
            Box::new(LinePort::new(corners[3].clone(), corners[0].clone())),
        ]
    }

    fn constraints(&mut self) -> Vec<Box<dyn Constraint>> {
        core::mem::take(&mut self.constraints)
    }

    fn pre_update(&mut self, _ctx: &mut dyn UpdateContext) {
        let (ox, oy) = (self.handles[0].x().value(), self.handles[0].y().value());
        if ox == 0.0 && oy == 0.0 {
            return;
        }
        self.matrix = self.matrix.translate(ox, oy);
        for handle in &mut self.handles {
            handle.x().set_value(handle.x().value() - ox);
            handle.y().set_value(handle.y().value() - oy);
        }
    }

    fn post_update(&mut self, _ctx: &mut dyn UpdateContext) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullUpdateContext;

    #[test]
    fn corners_start_square() {
        let e = Element::new(100.0, 50.0);
        assert_eq!(e.width(), 100.0);
        assert_eq!(e.height(), 50.0);
    }

    fn solve_constraints(e: &mut Element) {
        let solver = scenic_solver::Solver::new();
        for c in e.constraints() {
            solver.add_constraint(c);
        }
        solver.solve().unwrap();
    }

    #[test]
    fn edges_stay_equal_after_moving_a_handle() {
        let mut e = Element::new(100.0, 50.0);
        e.corner(Corner::TopLeft).y().set_value(10.0);
        solve_constraints(&mut e);
        assert_eq!(e.corner(Corner::TopRight).y().value(), 10.0);
    }

    #[test]
    fn pre_update_normalizes_top_left_to_the_origin() {
        let mut e = Element::new(100.0, 50.0);
        e.corner(Corner::TopLeft).x().set_value(5.0);
        e.corner(Corner::TopLeft).y().set_value(3.0);
        let mut ctx = NullUpdateContext;
        e.pre_update(&mut ctx);
        assert_eq!(e.corner(Corner::TopLeft).x().value(), 0.0);
        assert_eq!(e.corner(Corner::TopLeft).y().value(), 0.0);
        assert_eq!(e.matrix().transform_point(0.0, 0.0), (5.0, 3.0));
    }
}
