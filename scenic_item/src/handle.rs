// Copyright 2026 the Scenic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grab points: the geometry anchors that items expose and constraints move.

use alloc::rc::Rc;
use core::fmt;
use core::hash::{Hash, Hasher};

use scenic_solver::Variable;

/// Stable identity for a [`Handle`], independent of its current position.
///
/// `scenic_connections::Connections` keys its registry by `HandleId` rather
/// than by position or by a host-assigned index, mirroring how
/// [`Variable`] is identified by cell rather than by value. Cloning a
/// `Handle` (e.g. through [`Handle::pos`]'s sibling accessors) never mints a
/// new identity; only [`Handle::new`] does.
#[derive(Clone)]
pub struct HandleId(Rc<()>);

impl fmt::Debug for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandleId({:p})", Rc::as_ptr(&self.0))
    }
}

impl PartialEq for HandleId {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for HandleId {}

impl Hash for HandleId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

/// A positioned grab/anchor point owned by exactly one item for its
/// lifetime. `pos` is a pair of ordinary [`Variable`]s, so a constraint (or
/// a connection) can read and move a handle exactly like any other
/// constrained quantity.
#[derive(Debug, Clone)]
pub struct Handle {
    pos: (Variable, Variable),
    movable: bool,
    visible: bool,
    connectable: bool,
    identity: HandleId,
}

impl Handle {
    /// Create a handle at `(x, y)`, with both coordinate variables carrying
    /// `strength`.
    #[must_use]
    pub fn new(x: f64, y: f64, strength: i32) -> Self {
        Self {
            pos: (Variable::new(x, strength), Variable::new(y, strength)),
            movable: true,
            visible: true,
            connectable: false,
            identity: HandleId(Rc::new(())),
        }
    }

    /// This handle's stable identity, usable as a hash map key.
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.identity.clone()
    }

    /// The handle's position as a `(Variable, Variable)` pair.
    #[must_use]
    pub fn pos(&self) -> (Variable, Variable) {
        (self.pos.0.clone(), self.pos.1.clone())
    }

    /// The x-coordinate variable.
    #[must_use]
    pub fn x(&self) -> Variable {
        self.pos.0.clone()
    }

    /// The y-coordinate variable.
    #[must_use]
    pub fn y(&self) -> Variable {
        self.pos.1.clone()
    }

    /// The strength shared by both coordinate variables.
    #[must_use]
    pub fn strength(&self) -> i32 {
        self.pos.0.strength()
    }

    /// Whether a view should let a user drag this handle.
    #[must_use]
    pub fn movable(&self) -> bool {
        self.movable
    }

    /// Set whether a view should let a user drag this handle.
    pub fn set_movable(&mut self, movable: bool) {
        self.movable = movable;
    }

    /// Whether a view should render this handle.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Set whether a view should render this handle.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether this handle may be glued to a port.
    #[must_use]
    pub fn connectable(&self) -> bool {
        self.connectable
    }

    /// Set whether this handle may be glued to a port.
    pub fn set_connectable(&mut self, connectable: bool) {
        self.connectable = connectable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenic_solver::NORMAL;

    #[test]
    fn new_handle_is_movable_visible_and_not_connectable() {
        let h = Handle::new(1.0, 2.0, NORMAL);
        assert_eq!(h.x().value(), 1.0);
        assert_eq!(h.y().value(), 2.0);
        assert!(h.movable());
        assert!(h.visible());
        assert!(!h.connectable());
    }

    #[test]
    fn flags_are_independently_mutable() {
        let mut h = Handle::new(0.0, 0.0, NORMAL);
        h.set_movable(false);
        h.set_connectable(true);
        assert!(!h.movable());
        assert!(h.connectable());
        assert!(h.visible());
    }

    #[test]
    fn clones_share_identity_but_distinct_handles_do_not() {
        let h = Handle::new(0.0, 0.0, NORMAL);
        let cloned = h.clone();
        let other = Handle::new(0.0, 0.0, NORMAL);
        assert_eq!(h.id(), cloned.id());
        assert_ne!(h.id(), other.id());
    }
}
