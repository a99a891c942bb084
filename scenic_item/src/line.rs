// Copyright 2026 the Scenic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Polyline items: an ordered chain of handles with optional orthogonal
//! routing.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use scenic_matrix::Matrix;
use scenic_solver::{Constraint, LineAlignConstraint, NORMAL};

use crate::port::LinePort;
use crate::{Handle, Item, Port, UpdateContext};

/// A polyline item: a head handle, a tail handle, and zero or more interior
/// handles between them.
///
/// When [`orthogonal`](Line::orthogonal) is set, consecutive handles are
/// kept aligned on alternating axes (a "staircase" of horizontal and
/// vertical segments) via [`LineAlignConstraint`]s, starting with a
/// horizontal segment iff [`horizontal`](Line::horizontal) is set.
#[derive(Debug)]
pub struct Line {
    matrix: Matrix,
    handles: Vec<Handle>,
    orthogonal: bool,
    horizontal: bool,
    constraints: Vec<Box<dyn Constraint>>,
}

impl Line {
    /// Build a two-handle line from `(x1, y1)` to `(x2, y2)`.
    #[must_use]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let mut head = Handle::new(x1, y1, NORMAL);
        let mut tail = Handle::new(x2, y2, NORMAL);
        head.set_connectable(true);
        tail.set_connectable(true);
        let mut line = Self {
            matrix: Matrix::IDENTITY,
            handles: vec![head, tail],
            orthogonal: false,
            horizontal: false,
            constraints: Vec::new(),
        };
        line.rebuild_constraints();
        line
    }

    /// The line's handles, head first and tail last.
    #[must_use]
    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    /// The head (first) handle.
    #[must_use]
    pub fn head(&self) -> &Handle {
        &self.handles[0]
    }

    /// The tail (last) handle.
    #[must_use]
    pub fn tail(&self) -> &Handle {
        self.handles.last().expect("a line always has >= 2 handles")
    }

    /// Whether consecutive handles are held axis-aligned.
    #[must_use]
    pub fn orthogonal(&self) -> bool {
        self.orthogonal
    }

    /// Enable or disable orthogonal routing, regenerating the alignment
    /// constraints. Callers must re-drain [`Item::constraints`] and
    /// register the result with the solver for this to take effect.
    pub fn set_orthogonal(&mut self, orthogonal: bool) {
        self.orthogonal = orthogonal;
        self.rebuild_constraints();
    }

    /// Whether the first orthogonal segment runs horizontally rather than
    /// vertically.
    #[must_use]
    pub fn horizontal(&self) -> bool {
        self.horizontal
    }

    /// Set the orthogonal starting-axis bias, regenerating the alignment
    /// constraints.
    pub fn set_horizontal(&mut self, horizontal: bool) {
        self.horizontal = horizontal;
        self.rebuild_constraints();
    }

    /// Split the segment ending at handle `index` by inserting a new
    /// interior handle at the segment's midpoint, then regenerate the
    /// orthogonal alignment constraints.
    pub fn insert_handle(&mut self, index: usize, handle: Handle) {
        assert!(
            index > 0 && index < self.handles.len(),
            "insert_handle index must land strictly between the head and tail"
        );
        self.handles.insert(index, handle);
        self.rebuild_constraints();
    }

    /// Remove interior handle `index + 1`, merging the two segments on
    /// either side of it into one, then regenerate the orthogonal alignment
    /// constraints.
    pub fn merge_segment(&mut self, index: usize) {
        let removed = index + 1;
        assert!(
            removed > 0 && removed < self.handles.len() - 1,
            "merge_segment must target an interior handle"
        );
        self.handles.remove(removed);
        self.rebuild_constraints();
    }

    fn rebuild_constraints(&mut self) {
        self.constraints.clear();
        if !self.orthogonal {
            return;
        }
        for (i, pair) in self.handles.windows(2).enumerate() {
            let horizontal = (i % 2 == 0) == self.horizontal;
            self.constraints.push(Box::new(LineAlignConstraint::new(
                pair[0].pos(),
                pair[1].pos(),
                horizontal,
            )));
        }
    }
}

impl Item for Line {
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
        self.handles
            .windows(2)
            .map(|pair| Box::new(LinePort::new(pair[0].pos(), pair[1].pos())) as Box<dyn Port>)
            .collect()
    }

    fn constraints(&mut self) -> Vec<Box<dyn Constraint>> {
        core::mem::take(&mut self.constraints)
    }

    fn pre_update(&mut self, _ctx: &mut dyn UpdateContext) {}

    fn post_update(&mut self, _ctx: &mut dyn UpdateContext) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_line_has_head_and_tail() {
        let line = Line::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(line.head().pos().0.value(), 0.0);
        assert_eq!(line.tail().pos().0.value(), 10.0);
        assert_eq!(line.handles().len(), 2);
    }

    #[test]
    fn insert_handle_adds_an_interior_point() {
        let mut line = Line::new(0.0, 0.0, 10.0, 0.0);
        line.insert_handle(1, Handle::new(5.0, 0.0, NORMAL));
        assert_eq!(line.handles().len(), 3);
        assert_eq!(line.handles()[1].x().value(), 5.0);
    }

    #[test]
    fn merge_segment_removes_the_interior_point() {
        let mut line = Line::new(0.0, 0.0, 10.0, 0.0);
        line.insert_handle(1, Handle::new(5.0, 0.0, NORMAL));
        line.merge_segment(0);
        assert_eq!(line.handles().len(), 2);
    }

    #[test]
    fn orthogonal_generates_alternating_alignment_constraints() {
        let mut line = Line::new(0.0, 0.0, 10.0, 10.0);
        line.insert_handle(1, Handle::new(10.0, 0.0, NORMAL));
        line.set_orthogonal(true);
        assert_eq!(line.constraints().len(), 2);
    }
}
