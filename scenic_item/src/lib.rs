// Copyright 2026 the Scenic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scenic Item: the scene primitive capability contract, and the two
//! built-in item kinds, [`Element`] and [`Line`].
//!
//! An [`Item`] is any object exposing a local matrix, an ordered list of
//! [`Handle`]s, an ordered list of [`Port`]s derived from those handles, a
//! set of intra-item [`Constraint`]s, and a pair of update hooks. The core
//! (`scenic_canvas`) only ever talks to items through this trait, via
//! `dyn Item`; [`BuiltinItem`] wraps the two built-in kinds in a sum type so
//! the common case never needs dynamic dispatch to construct, only to store.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod element;
mod handle;
mod line;
mod port;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

pub use element::{Corner, Element};
pub use handle::{Handle, HandleId};
pub use line::Line;
pub use port::{LinePort, Port, PointPort};
pub use scenic_solver::Constraint;

use scenic_matrix::Matrix;

/// Opaque per-update context supplied by the host. The core never
/// interprets its contents; it is threaded through [`Item::pre_update`] and
/// [`Item::post_update`] so items can downcast to whatever renderer or
/// measurement handle they expect.
pub trait UpdateContext: Any {
    /// Downcast to a concrete context type the host knows about.
    fn as_any(&self) -> &dyn Any;
    /// Downcast to a concrete context type the host knows about.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> UpdateContext for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A no-op update context, for tests and headless hosts that don't need
/// per-item state during update hooks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullUpdateContext;

/// The scene primitive capability contract.
///
/// Any object implementing `Item` may be added to a canvas. The built-in
/// kinds are [`Element`] and [`Line`], unified as [`BuiltinItem`]; hosts may
/// implement `Item` directly for their own item kinds.
pub trait Item: fmt::Debug {
    /// The item's local (item-to-parent) affine transform.
    fn matrix(&self) -> Matrix;

    /// Replace the item's local transform.
    fn set_matrix(&mut self, matrix: Matrix);

    /// The item's grab points, in a stable order.
    fn handles(&self) -> &[Handle];

    /// Mutable access to the item's grab points.
    fn handles_mut(&mut self) -> &mut [Handle];

    /// The item's connectable regions, derived fresh from its current
    /// handle positions on every call.
    fn ports(&self) -> Vec<Box<dyn Port>>;

    /// Drain this item's intra-item constraints (shape, min-size,
    /// alignment) so the caller can register them with a solver. Returns an
    /// empty vector once already drained.
    fn constraints(&mut self) -> Vec<Box<dyn Constraint>>;

    /// Called by the update pipeline before the solver resolves, leaves
    /// first.
    fn pre_update(&mut self, ctx: &mut dyn UpdateContext);

    /// Called by the update pipeline after matrices have propagated.
    fn post_update(&mut self, ctx: &mut dyn UpdateContext);
}

/// The two built-in item kinds, dispatched by tag rather than through a
/// trait object, per the core's preference for sum-type dispatch over
/// virtual inheritance for its own primitives.
#[derive(Debug)]
pub enum BuiltinItem {
    /// A rectangular item; see [`Element`].
    Element(Element),
    /// A polyline item; see [`Line`].
    Line(Line),
}

impl Item for BuiltinItem {
    fn matrix(&self) -> Matrix {
        match self {
            Self::Element(e) => e.matrix(),
            Self::Line(l) => l.matrix(),
        }
    }

    fn set_matrix(&mut self, matrix: Matrix) {
        match self {
            Self::Element(e) => e.set_matrix(matrix),
            Self::Line(l) => l.set_matrix(matrix),
        }
    }

    fn handles(&self) -> &[Handle] {
        match self {
            Self::Element(e) => e.handles(),
            Self::Line(l) => l.handles(),
        }
    }

    fn handles_mut(&mut self) -> &mut [Handle] {
        match self {
            Self::Element(e) => e.handles_mut(),
            Self::Line(l) => l.handles_mut(),
        }
    }

    fn ports(&self) -> Vec<Box<dyn Port>> {
        match self {
            Self::Element(e) => e.ports(),
            Self::Line(l) => l.ports(),
        }
    }

    fn constraints(&mut self) -> Vec<Box<dyn Constraint>> {
        match self {
            Self::Element(e) => e.constraints(),
            Self::Line(l) => l.constraints(),
        }
    }

    fn pre_update(&mut self, ctx: &mut dyn UpdateContext) {
        match self {
            Self::Element(e) => e.pre_update(ctx),
            Self::Line(l) => l.pre_update(ctx),
        }
    }

    fn post_update(&mut self, ctx: &mut dyn UpdateContext) {
        match self {
            Self::Element(e) => e.post_update(ctx),
            Self::Line(l) => l.post_update(ctx),
        }
    }
}

impl From<Element> for BuiltinItem {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<Line> for BuiltinItem {
    fn from(line: Line) -> Self {
        Self::Line(line)
    }
}
