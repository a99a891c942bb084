// Copyright 2026 the Scenic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Constraint kinds: relations among [`Variable`]s enforced by the [`Solver`](crate::Solver).

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::variable::Variable;

/// A point expressed as two independently-subscribable variables.
pub type Point = (Variable, Variable);

/// A relation among one or more [`Variable`]s.
///
/// `solve()` mutates some subset of [`variables()`](Constraint::variables)
/// so that the relation holds, and must never adjust a variable stronger
/// than the one returned by [`weakest()`](Constraint::weakest).
pub trait Constraint: fmt::Debug {
    /// The variables this constraint reads or writes, in a stable order.
    fn variables(&self) -> Vec<Variable>;

    /// Mutate this constraint's weakest variable(s) so the relation holds.
    fn solve(&self);

    /// The variable this constraint is permitted to adjust. When several
    /// variables share the minimum strength, implementations pick the first
    /// one in `variables()` order, matching [`Solver`](crate::Solver)'s tie-break rule.
    fn weakest(&self) -> Variable;
}

impl Constraint for alloc::boxed::Box<dyn Constraint> {
    fn variables(&self) -> Vec<Variable> {
        (**self).variables()
    }

    fn solve(&self) {
        (**self).solve();
    }

    fn weakest(&self) -> Variable {
        (**self).weakest()
    }
}

fn weakest_of(vars: &[Variable]) -> Variable {
    vars.iter()
        .min_by_key(|v| v.strength())
        .cloned()
        .expect("a constraint always has at least one variable")
}

fn closest_point_on_segment(
    px: f64,
    py: f64,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
) -> (f64, f64, f64) {
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
    (qx, qy, ddx * ddx + ddy * ddy)
}

/// `a == b`. The weaker variable is pulled to the stronger one's value.
#[derive(Debug, Clone)]
pub struct EqualsConstraint {
    a: Variable,
    b: Variable,
}

impl EqualsConstraint {
    /// Build a constraint holding `a == b`.
    #[must_use]
    pub fn new(a: Variable, b: Variable) -> Self {
        Self { a, b }
    }
}

impl Constraint for EqualsConstraint {
    fn variables(&self) -> Vec<Variable> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn weakest(&self) -> Variable {
        if self.a.strength() <= self.b.strength() {
            self.a.clone()
        } else {
            self.b.clone()
        }
    }

    fn solve(&self) {
        if self.a.strength() <= self.b.strength() {
            self.a.set_value(self.b.value());
        } else {
            self.b.set_value(self.a.value());
        }
    }
}

/// `smaller <= bigger`. Only acts when the relation is violated.
#[derive(Debug, Clone)]
pub struct LessThanConstraint {
    smaller: Variable,
    bigger: Variable,
}

impl LessThanConstraint {
    /// Build a constraint holding `smaller <= bigger`.
    #[must_use]
    pub fn new(smaller: Variable, bigger: Variable) -> Self {
        Self { smaller, bigger }
    }
}

impl Constraint for LessThanConstraint {
    fn variables(&self) -> Vec<Variable> {
        vec![self.smaller.clone(), self.bigger.clone()]
    }

    fn weakest(&self) -> Variable {
        if self.smaller.strength() <= self.bigger.strength() {
            self.smaller.clone()
        } else {
            self.bigger.clone()
        }
    }

    fn solve(&self) {
        if self.smaller.value() > self.bigger.value() {
            if self.smaller.strength() <= self.bigger.strength() {
                self.smaller.set_value(self.bigger.value());
            } else {
                self.bigger.set_value(self.smaller.value());
            }
        }
    }
}

/// `center == (min + max) / 2`.
#[derive(Debug, Clone)]
pub struct CenterConstraint {
    min: Variable,
    center: Variable,
    max: Variable,
}

impl CenterConstraint {
    /// Build a constraint holding `center == (min + max) / 2`.
    #[must_use]
    pub fn new(min: Variable, center: Variable, max: Variable) -> Self {
        Self { min, center, max }
    }
}

impl Constraint for CenterConstraint {
    fn variables(&self) -> Vec<Variable> {
        vec![self.min.clone(), self.center.clone(), self.max.clone()]
    }

    fn weakest(&self) -> Variable {
        weakest_of(&[self.min.clone(), self.center.clone(), self.max.clone()])
    }

    fn solve(&self) {
        let weak = self.weakest();
        if weak.id() == self.center.id() {
            self.center
                .set_value((self.min.value() + self.max.value()) / 2.0);
        } else if weak.id() == self.min.id() {
            self.min
                .set_value(2.0 * self.center.value() - self.max.value());
        } else {
            self.max
                .set_value(2.0 * self.center.value() - self.min.value());
        }
    }
}

/// A user-supplied equation over any number of variables: `solve_fn` is
/// given a snapshot of every variable's value (in `variables()` order) and
/// returns the new value for the weakest one.
#[derive(Clone)]
pub struct EquationConstraint {
    vars: Vec<Variable>,
    solve_fn: Rc<dyn Fn(&[f64]) -> f64>,
}

impl EquationConstraint {
    /// Build an equation constraint over `vars`, solved by `solve_fn`.
    pub fn new(vars: Vec<Variable>, solve_fn: impl Fn(&[f64]) -> f64 + 'static) -> Self {
        Self {
            vars,
            solve_fn: Rc::new(solve_fn),
        }
    }
}

impl fmt::Debug for EquationConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EquationConstraint")
            .field("vars", &self.vars)
            .finish_non_exhaustive()
    }
}

impl Constraint for EquationConstraint {
    fn variables(&self) -> Vec<Variable> {
        self.vars.clone()
    }

    fn weakest(&self) -> Variable {
        weakest_of(&self.vars)
    }

    fn solve(&self) {
        let weak = self.weakest();
        let values: Vec<f64> = self.vars.iter().map(Variable::value).collect();
        weak.set_value((self.solve_fn)(&values));
    }
}

/// Keeps `point` glued to the closest position on `line`'s polyline.
#[derive(Debug, Clone)]
pub struct LineConstraint {
    line: Vec<Point>,
    point: Point,
}

impl LineConstraint {
    /// Build a constraint holding `point` on the polyline `line`.
    #[must_use]
    pub fn new(line: Vec<Point>, point: Point) -> Self {
        Self { line, point }
    }
}

impl Constraint for LineConstraint {
    fn variables(&self) -> Vec<Variable> {
        let mut vars: Vec<Variable> = self
            .line
            .iter()
            .flat_map(|p| [p.0.clone(), p.1.clone()])
            .collect();
        vars.push(self.point.0.clone());
        vars.push(self.point.1.clone());
        vars
    }

    fn weakest(&self) -> Variable {
        self.point.0.clone()
    }

    fn solve(&self) {
        let (px, py) = (self.point.0.value(), self.point.1.value());
        let mut best: Option<(f64, f64, f64)> = None;
        for w in self.line.windows(2) {
            let (x1, y1) = (w[0].0.value(), w[0].1.value());
            let (x2, y2) = (w[1].0.value(), w[1].1.value());
            let candidate = closest_point_on_segment(px, py, x1, y1, x2, y2);
            if best.is_none_or(|(_, _, best_dist2)| candidate.2 < best_dist2) {
                best = Some(candidate);
            }
        }
        if let Some((qx, qy, _)) = best {
            self.point.0.set_value(qx);
            self.point.1.set_value(qy);
        }
    }
}

/// Aligns `point` with `line`'s first endpoint along one axis: used for the
/// orthogonal routing bias on [`Line`](https://docs.rs/scenic_item) items.
#[derive(Debug, Clone)]
pub struct LineAlignConstraint {
    line: Point,
    point: Point,
    horizontal: bool,
}

impl LineAlignConstraint {
    /// Build an alignment constraint: when `horizontal`, `point.y` tracks
    /// `line.y`; otherwise `point.x` tracks `line.x`.
    #[must_use]
    pub fn new(line: Point, point: Point, horizontal: bool) -> Self {
        Self {
            line,
            point,
            horizontal,
        }
    }
}

impl Constraint for LineAlignConstraint {
    fn variables(&self) -> Vec<Variable> {
        vec![
            self.line.0.clone(),
            self.line.1.clone(),
            self.point.0.clone(),
            self.point.1.clone(),
        ]
    }

    fn weakest(&self) -> Variable {
        if self.horizontal {
            self.point.1.clone()
        } else {
            self.point.0.clone()
        }
    }

    fn solve(&self) {
        if self.horizontal {
            self.point.1.set_value(self.line.1.value());
        } else {
            self.point.0.set_value(self.line.0.value());
        }
    }
}

/// Keeps `point` at a fixed offset (captured at construction time) from
/// `origin`.
#[derive(Debug, Clone)]
pub struct PositionConstraint {
    origin: Point,
    point: Point,
    offset: (f64, f64),
}

impl PositionConstraint {
    /// Build a constraint holding `point == origin + offset`, where `offset`
    /// is the difference observed between `origin` and `point` right now.
    #[must_use]
    pub fn new(origin: Point, point: Point) -> Self {
        let offset = (
            point.0.value() - origin.0.value(),
            point.1.value() - origin.1.value(),
        );
        Self {
            origin,
            point,
            offset,
        }
    }
}

impl Constraint for PositionConstraint {
    fn variables(&self) -> Vec<Variable> {
        vec![
            self.origin.0.clone(),
            self.origin.1.clone(),
            self.point.0.clone(),
            self.point.1.clone(),
        ]
    }

    fn weakest(&self) -> Variable {
        if self.origin.0.strength() <= self.point.0.strength() {
            self.origin.0.clone()
        } else {
            self.point.0.clone()
        }
    }

    fn solve(&self) {
        if self.origin.0.strength() <= self.point.0.strength() {
            self.origin.0.set_value(self.point.0.value() - self.offset.0);
            self.origin.1.set_value(self.point.1.value() - self.offset.1);
        } else {
            self.point.0.set_value(self.origin.0.value() + self.offset.0);
            self.point.1.set_value(self.origin.1.value() + self.offset.1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::{NORMAL, STRONG, WEAK};

    #[test]
    fn equals_moves_the_weaker_variable() {
        let a = Variable::new(3.0, NORMAL);
        let b = Variable::new(0.0, NORMAL);
        let c = EqualsConstraint::new(a.clone(), b.clone());
        c.solve();
        assert_eq!(a.value(), b.value());
    }

    #[test]
    fn equals_respects_strength() {
        let a = Variable::new(3.0, STRONG);
        let b = Variable::new(0.0, WEAK);
        let c = EqualsConstraint::new(a.clone(), b.clone());
        c.solve();
        assert_eq!(a.value(), 3.0);
        assert_eq!(b.value(), 3.0);
    }

    #[test]
    fn less_than_pushes_bigger_up_when_violated() {
        let smaller = Variable::new(50.0, crate::variable::REQUIRED);
        let bigger = Variable::new(10.0, NORMAL);
        let c = LessThanConstraint::new(smaller.clone(), bigger.clone());
        c.solve();
        assert_eq!(bigger.value(), 50.0);
    }

    #[test]
    fn center_constraint_holds_average() {
        let min = Variable::new(0.0, NORMAL);
        let center = Variable::new(0.0, WEAK);
        let max = Variable::new(10.0, NORMAL);
        let c = CenterConstraint::new(min, center.clone(), max);
        c.solve();
        assert_eq!(center.value(), 5.0);
    }

    #[test]
    fn line_constraint_glues_point_to_segment() {
        let line = vec![
            (Variable::new(0.0, NORMAL), Variable::new(0.0, NORMAL)),
            (Variable::new(10.0, NORMAL), Variable::new(0.0, NORMAL)),
        ];
        let point = (Variable::new(5.0, WEAK), Variable::new(5.0, WEAK));
        let c = LineConstraint::new(line, point.clone());
        c.solve();
        assert_eq!(point.0.value(), 5.0);
        assert!(point.1.value().abs() < 1e-9);
    }

    #[test]
    fn position_constraint_keeps_offset() {
        let origin = (Variable::new(0.0, NORMAL), Variable::new(0.0, NORMAL));
        let point = (Variable::new(10.0, WEAK), Variable::new(4.0, WEAK));
        let c = PositionConstraint::new(origin.clone(), point.clone());
        origin.0.set_value(100.0);
        c.solve();
        assert_eq!(point.0.value(), 110.0);
        assert_eq!(point.1.value(), 4.0);
    }
}
