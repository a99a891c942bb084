// Copyright 2026 the Scenic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Connectable regions exposed by an item.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use scenic_solver::{Constraint, LineConstraint, Point, Variable};

use crate::{Handle, Item};

/// An abstract connectable site on an item, derived from its handles.
///
/// A port is recreated on every [`Item::ports`] call, so it always reflects
/// the item's current geometry: it holds live [`Variable`] clones rather
/// than snapshotted coordinates.
pub trait Port: fmt::Debug {
    /// Whether anything may glue to this port.
    fn connectable(&self) -> bool;

    /// Project `pos` onto this port, returning the projected position (if
    /// within glue range) and the distance from `pos` to that projection.
    fn glue(&self, pos: (f64, f64)) -> (Option<(f64, f64)>, f64);

    /// Build the constraint that keeps `handle` (owned by `item`) glued to
    /// this port. `connected` is accepted for parity with the connector
    /// contract but is not consulted: a port already captured the variables
    /// of its own owning item at construction time.
    fn constraint(&self, item: &dyn Item, handle: &Handle, connected: &dyn Item)
    -> Box<dyn Constraint>;
}

pub(crate) fn closest_point_on_segment(
    px: f64,
    py: f64,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
) -> ((f64, f64), f64) {
    let dx = x2 - x1;
    let dy = y2 - y1;
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        ((px - x1) * dx + (py - y1) * dy) / len2
    } else {
        0.0
    }
    .clamp(0.0, 1.0);
    let qx = x1 + t * dx;
    let qy = y1 + t * dy;
    let (ddx, ddy) = (px - qx, py - qy);
    ((qx, qy), (ddx * ddx + ddy * ddy).sqrt())
}

/// A straight connectable segment between two handles (an element's edge,
/// or a line's own segment).
#[derive(Debug, Clone)]
pub struct LinePort {
    start: Point,
    end: Point,
}

impl LinePort {
    /// Build a port spanning `start` to `end`.
    #[must_use]
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

impl Port for LinePort {
    fn connectable(&self) -> bool {
        true
    }

    fn glue(&self, pos: (f64, f64)) -> (Option<(f64, f64)>, f64) {
        let (q, dist) = closest_point_on_segment(
            pos.0,
            pos.1,
            self.start.0.value(),
            self.start.1.value(),
            self.end.0.value(),
            self.end.1.value(),
        );
        (Some(q), dist)
    }

    fn constraint(
        &self,
        _item: &dyn Item,
        handle: &Handle,
        _connected: &dyn Item,
    ) -> Box<dyn Constraint> {
        Box::new(LineConstraint::new(
            vec![self.start.clone(), self.end.clone()],
            handle.pos(),
        ))
    }
}

/// A single connectable point (typically a handle's own position).
#[derive(Debug, Clone)]
pub struct PointPort {
    target: Point,
}

impl PointPort {
    /// Build a port at the current position of `target`.
    #[must_use]
    pub fn new(target: Point) -> Self {
        Self { target }
    }
}

impl Port for PointPort {
    fn connectable(&self) -> bool {
        true
    }

    fn glue(&self, pos: (f64, f64)) -> (Option<(f64, f64)>, f64) {
        let (tx, ty) = (self.target.0.value(), self.target.1.value());
        let (dx, dy) = (pos.0 - tx, pos.1 - ty);
        (Some((tx, ty)), (dx * dx + dy * dy).sqrt())
    }

    fn constraint(
        &self,
        _item: &dyn Item,
        handle: &Handle,
        _connected: &dyn Item,
    ) -> Box<dyn Constraint> {
        Box::new(PointEqualsConstraint {
            a: handle.pos(),
            b: self.target.clone(),
        })
    }
}

/// Keeps two points equal on both axes, moving whichever axis-pair is
/// weaker. Used to glue a handle directly onto another handle's position
/// (a [`PointPort`]), which needs both coordinates moved together rather
/// than the single representative variable [`Constraint::weakest`]
/// normally returns.
#[derive(Debug, Clone)]
struct PointEqualsConstraint {
    a: Point,
    b: Point,
}

impl Constraint for PointEqualsConstraint {
    fn variables(&self) -> Vec<Variable> {
        vec![
            self.a.0.clone(),
            self.a.1.clone(),
            self.b.0.clone(),
            self.b.1.clone(),
        ]
    }

    fn weakest(&self) -> Variable {
        if self.a.0.strength() <= self.b.0.strength() {
            self.a.0.clone()
        } else {
            self.b.0.clone()
        }
    }

    fn solve(&self) {
        if self.a.0.strength() <= self.b.0.strength() {
            self.a.0.set_value(self.b.0.value());
        } else {
            self.b.0.set_value(self.a.0.value());
        }
        if self.a.1.strength() <= self.b.1.strength() {
            self.a.1.set_value(self.b.1.value());
        } else {
            self.b.1.set_value(self.a.1.value());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenic_solver::NORMAL;

    #[test]
    fn line_port_projects_onto_the_segment() {
        let start = (Variable::new(0.0, NORMAL), Variable::new(0.0, NORMAL));
        let end = (Variable::new(10.0, NORMAL), Variable::new(0.0, NORMAL));
        let port = LinePort::new(start, end);
        let (pos, dist) = port.glue((5.0, 3.0));
        assert_eq!(pos, Some((5.0, 0.0)));
        assert_eq!(dist, 3.0);
    }

    #[test]
    fn point_port_always_projects_to_its_target() {
        let target = (Variable::new(4.0, NORMAL), Variable::new(4.0, NORMAL));
        let port = PointPort::new(target);
        let (pos, dist) = port.glue((4.0, 0.0));
        assert_eq!(pos, Some((4.0, 4.0)));
        assert_eq!(dist, 4.0);
    }
}
