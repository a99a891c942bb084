// Copyright 2026 the Scenic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Weighted scalar cells with change notification.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::cmp::Ordering;
use core::fmt;

use smallvec::SmallVec;

use crate::solver::{ConstraintId, SolverState};

/// Most variables are read/written by a small, fixed number of constraints
/// (an edge equality, a min-size check, at most one connection); inline
/// storage avoids a heap allocation for the common case.
const INLINE_SUBSCRIBERS: usize = 4;

/// No one should ever overwrite this variable; used for values a constraint
/// may read but must never touch.
pub const VERY_WEAK: i32 = 0;
/// A soft preference, easily overridden.
pub const WEAK: i32 = 10;
/// The default strength for ordinary geometry.
pub const NORMAL: i32 = 20;
/// A preference that wins over `NORMAL`/`WEAK` ties.
pub const STRONG: i32 = 30;
/// Wins over everything but `REQUIRED`.
pub const VERY_STRONG: i32 = 40;
/// Never adjusted by the solver; conflicting `REQUIRED` constraints are a
/// modeling error.
pub const REQUIRED: i32 = 100;

/// Human-readable name for one of the built-in strength constants, or
/// `"CUSTOM"` for any other value.
#[must_use]
pub fn strength_name(strength: i32) -> &'static str {
    match strength {
        VERY_WEAK => "VERY_WEAK",
        WEAK => "WEAK",
        NORMAL => "NORMAL",
        STRONG => "STRONG",
        VERY_STRONG => "VERY_STRONG",
        REQUIRED => "REQUIRED",
        _ => "CUSTOM",
    }
}

/// Opaque identity for a [`Variable`], stable for the lifetime of the
/// underlying cell. Used as the key of the solver's variable-to-constraints
/// reverse index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct VariableId(usize);

/// A link from a variable to one constraint (held by one solver) that reads
/// or writes it. Stored on the variable itself so that writing `.value`
/// outside of any `Solver` call still notifies the right constraints.
#[derive(Clone)]
pub(crate) struct SolverLink {
    pub(crate) solver: Weak<RefCell<SolverState>>,
    pub(crate) constraint: ConstraintId,
}

struct VariableCell {
    value: f64,
    strength: i32,
    subscribers: SmallVec<[SolverLink; INLINE_SUBSCRIBERS]>,
}

/// A weighted scalar cell: `value: f64` plus an immutable `strength`.
///
/// `Variable` is a cheap `Rc`-backed handle; cloning a `Variable` gives you
/// another handle to the *same* cell (identity by cell, not by value), which
/// is what lets a [`Constraint`](crate::Constraint) hold the exact variable
/// a `Handle` exposes.
///
/// Comparisons and arithmetic treat a `Variable` as its current `value`; see
/// the module-level operator impls below.
#[derive(Clone)]
pub struct Variable(Rc<RefCell<VariableCell>>);

impl Variable {
    /// Construct a new, unsubscribed variable.
    #[must_use]
    pub fn new(value: f64, strength: i32) -> Self {
        Self(Rc::new(RefCell::new(VariableCell {
            value,
            strength,
            subscribers: SmallVec::new(),
        })))
    }

    /// The current value.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0.borrow().value
    }

    /// This variable's immutable strength.
    #[must_use]
    pub fn strength(&self) -> i32 {
        self.0.borrow().strength
    }

    /// Write a new value, notifying every subscribed constraint exactly
    /// once. Reassigning the bitwise-identical value is a no-op (no
    /// notification fires), per the short-circuit the spec allows.
    pub fn set_value(&self, value: f64) {
        let links = {
            let mut cell = self.0.borrow_mut();
            if cell.value.to_bits() == value.to_bits() {
                return;
            }
            cell.value = value;
            cell.subscribers.clone()
        };
        for link in links {
            if let Some(solver) = link.solver.upgrade() {
                solver.borrow_mut().mark_dirty(link.constraint);
            }
        }
    }

    /// Opaque, stable identity for this variable's cell.
    pub(crate) fn id(&self) -> VariableId {
        VariableId(Rc::as_ptr(&self.0) as usize)
    }

    pub(crate) fn subscribe(&self, link: SolverLink) {
        self.0.borrow_mut().subscribers.push(link);
    }

    pub(crate) fn unsubscribe(
        &self,
        solver: &Weak<RefCell<SolverState>>,
        constraint: ConstraintId,
    ) {
        let solver_ptr = solver.as_ptr();
        self.0
            .borrow_mut()
            .subscribers
            .retain(|link| !(link.solver.as_ptr() == solver_ptr && link.constraint == constraint));
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = self.0.borrow();
        f.debug_struct("Variable")
            .field("value", &cell.value)
            .field("strength", &strength_name(cell.strength))
            .finish()
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl PartialEq<f64> for Variable {
    fn eq(&self, other: &f64) -> bool {
        self.value() == *other
    }
}

impl PartialEq<Variable> for f64 {
    fn eq(&self, other: &Variable) -> bool {
        *self == other.value()
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value().partial_cmp(&other.value())
    }
}

impl PartialOrd<f64> for Variable {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.value().partial_cmp(other)
    }
}

impl PartialOrd<Variable> for f64 {
    fn partial_cmp(&self, other: &Variable) -> Option<Ordering> {
        self.partial_cmp(&other.value())
    }
}

macro_rules! impl_variable_ops {
    ($($trait:ident :: $method:ident => $op:tt),* $(,)?) => {
        $(
            impl core::ops::$trait<f64> for Variable {
                type Output = f64;
                fn $method(self, rhs: f64) -> f64 {
                    self.value() $op rhs
                }
            }
            impl core::ops::$trait<Variable> for f64 {
                type Output = f64;
                fn $method(self, rhs: Variable) -> f64 {
                    self $op rhs.value()
                }
            }
            impl core::ops::$trait<Variable> for Variable {
                type Output = f64;
                fn $method(self, rhs: Variable) -> f64 {
                    self.value() $op rhs.value()
                }
            }
            impl core::ops::$trait<&Variable> for &Variable {
                type Output = f64;
                fn $method(self, rhs: &Variable) -> f64 {
                    self.value() $op rhs.value()
                }
            }
        )*
    };
}

impl_variable_ops! {
    Add::add => +,
    Sub::sub => -,
    Mul::mul => *,
    Div::div => /,
    Rem::rem => %,
}
