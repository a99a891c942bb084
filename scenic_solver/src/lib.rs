// Copyright 2026 the Scenic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scenic Solver: a weighted-variable constraint solver.
//!
//! The solver resolves a set of [`Constraint`]s over shared [`Variable`]s by
//! repeatedly calling each dirty constraint's `solve()` until a fixpoint is
//! reached or the [juggle limit](Solver::JUGGLE_LIMIT) is hit. Variables
//! carry a [strength](crate::variable) so that a constraint never overwrites
//! a more important variable to satisfy a less important relation.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod constraint;
mod projection;
mod solver;
mod variable;

pub use constraint::{
    CenterConstraint, Constraint, EqualsConstraint, EquationConstraint, LessThanConstraint,
    LineAlignConstraint, LineConstraint, Point, PositionConstraint,
};
pub use projection::MatrixProjection;
pub use solver::{ConstraintId, JuggleError, Solver};
pub use variable::{
    NORMAL, REQUIRED, STRONG, VERY_STRONG, VERY_WEAK, Variable, WEAK, strength_name,
};
