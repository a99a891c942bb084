// Copyright 2026 the Scenic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scenic Connections: the registry binding line-endpoint handles to other
//! items' ports via solver constraints.
//!
//! [`Connections`] is keyed by [`HandleId`] exactly as `spec.md` §4.6
//! describes: a handle may be connected to at most one port at a time,
//! and reconnecting it first disconnects (firing the old callback) before
//! the new binding takes effect. The registry owns a cloned
//! [`Solver`](scenic_solver::Solver) handle so that `connect_item` and
//! `disconnect_item` can register/unregister the backing constraint
//! directly, per the "newer gaphas revision" chosen in the core spec's
//! design notes: connections drive solver registration themselves rather
//! than going through a side table the canvas would otherwise have to
//! reconcile.
//!
//! This crate is not `no_std`: the registry is a `HashMap` keyed by
//! [`HandleId`], and `std::collections::HashMap` is the natural fit for a
//! registry this shape, exactly as the example workspace reaches for `std`
//! collections once a crate stops being a leaf numeric/geometric type.

use std::collections::HashMap;
use std::fmt;

pub use scenic_item::{Handle, HandleId, Port};
use scenic_solver::{Constraint, ConstraintId, Solver};

/// Callback invoked exactly once when a connection is disconnected (either
/// explicitly or because it was replaced by a new connection on the same
/// handle). Not invoked by [`Connections::reconnect_item`], which swaps a
/// connection's port/constraint in place without tearing it down.
pub type DisconnectCallback = Box<dyn FnMut()>;

struct Record<I> {
    item: I,
    handle: HandleId,
    connected: I,
    port: Box<dyn Port>,
    constraint: Option<ConstraintId>,
    callback: Option<DisconnectCallback>,
}

/// A read-only view of one connection record, borrowed from the registry.
#[derive(Debug)]
pub struct ConnectionInfo<'a, I> {
    /// The item that owns the connecting handle.
    pub item: I,
    /// The connecting handle's identity.
    pub handle: HandleId,
    /// The item the handle is connected to.
    pub connected: I,
    /// The port on `connected` the handle is glued to.
    pub port: &'a dyn Port,
    /// The solver constraint realizing the connection, if one was supplied.
    pub constraint: Option<ConstraintId>,
}

impl<I: fmt::Debug> fmt::Debug for Record<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("item", &self.item)
            .field("handle", &self.handle)
            .field("connected", &self.connected)
            .field("constraint", &self.constraint)
            .field("has_callback", &self.callback.is_some())
            .finish_non_exhaustive()
    }
}

/// Optional filter for [`Connections::get_connections`]. Every `Some` field
/// must match; `None` fields are wildcards.
#[derive(Clone)]
pub struct ConnectionFilter<I> {
    /// Only connections owned by this item.
    pub item: Option<I>,
    /// Only the connection on this handle.
    pub handle: Option<HandleId>,
    /// Only connections landing on this item.
    pub connected: Option<I>,
}

impl<I> Default for ConnectionFilter<I> {
    fn default() -> Self {
        Self {
            item: None,
            handle: None,
            connected: None,
        }
    }
}

/// The handle-to-port connection registry.
///
/// Generic over the host's opaque item identity `I`, the same way
/// [`scenic_tree::Tree`] is generic over its node identity: the registry
/// never interprets `I`, it only compares it for equality when filtering.
pub struct Connections<I> {
    solver: Solver,
    records: HashMap<HandleId, Record<I>>,
}

impl<I: fmt::Debug> fmt::Debug for Connections<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connections")
            .field("count", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl<I: Copy + Eq> Connections<I> {
    /// Create an empty registry driving constraint registration through
    /// `solver`. The caller typically clones the same `Solver` handle the
    /// owning canvas drives `solve()` on.
    #[must_use]
    pub fn new(solver: Solver) -> Self {
        Self {
            solver,
            records: HashMap::new(),
        }
    }

    /// Bind `handle` (owned by `item`) to `port` on `connected`.
    ///
    /// If `handle` already has a connection, it is removed first (firing
    /// its callback) before the new one is recorded. `constraint`, if
    /// supplied, is registered with the solver immediately.
    pub fn connect_item(
        &mut self,
        item: I,
        handle: HandleId,
        connected: I,
        port: Box<dyn Port>,
        constraint: Option<Box<dyn Constraint>>,
        callback: Option<DisconnectCallback>,
    ) {
        self.remove_record(&handle);
        let constraint_id = constraint.map(|c| self.solver.add_constraint(c));
        self.records.insert(
            handle.clone(),
            Record {
                item,
                handle,
                connected,
                port,
                constraint: constraint_id,
                callback,
            },
        );
    }

    /// Remove the connection for `handle` (or, if `handle` is `None`, every
    /// connection owned by `item`). Each removed record's constraint is
    /// unregistered from the solver and its callback invoked exactly once.
    pub fn disconnect_item(&mut self, item: I, handle: Option<HandleId>) {
        match handle {
            Some(handle) => self.remove_record(&handle),
            None => {
                let handles: Vec<HandleId> = self
                    .records
                    .iter()
                    .filter(|(_, record)| record.item == item)
                    .map(|(handle, _)| handle.clone())
                    .collect();
                for handle in handles {
                    self.remove_record(&handle);
                }
            }
        }
    }

    /// Atomically swap a connection's port and/or constraint without firing
    /// the disconnect callback. A `None` argument leaves that field
    /// unchanged. Returns `false` if `handle` has no connection.
    pub fn reconnect_item(
        &mut self,
        handle: &HandleId,
        port: Option<Box<dyn Port>>,
        constraint: Option<Box<dyn Constraint>>,
    ) -> bool {
        if !self.records.contains_key(handle) {
            return false;
        }
        if let Some(new_port) = port {
            self.records.get_mut(handle).expect("checked above").port = new_port;
        }
        if let Some(new_constraint) = constraint {
            let old_id = self
                .records
                .get_mut(handle)
                .expect("checked above")
                .constraint
                .take();
            if let Some(old_id) = old_id {
                self.solver.remove_constraint(old_id);
            }
            let new_id = self.solver.add_constraint(new_constraint);
            self.records.get_mut(handle).expect("checked above").constraint = Some(new_id);
        }
        true
    }

    /// Look up the connection for `handle`, if any.
    #[must_use]
    pub fn get_connection(&self, handle: &HandleId) -> Option<ConnectionInfo<'_, I>> {
        self.records.get(handle).map(|record| ConnectionInfo {
            item: record.item,
            handle: record.handle.clone(),
            connected: record.connected,
            port: record.port.as_ref(),
            constraint: record.constraint,
        })
    }

    /// Every connection matching `filter`.
    #[must_use]
    pub fn get_connections(&self, filter: &ConnectionFilter<I>) -> Vec<ConnectionInfo<'_, I>> {
        self.records
            .values()
            .filter(|record| {
                filter.item.is_none_or(|item| record.item == item)
                    && filter
                        .handle
                        .as_ref()
                        .is_none_or(|handle| &record.handle == handle)
                    && filter
                        .connected
                        .is_none_or(|connected| record.connected == connected)
            })
            .map(|record| ConnectionInfo {
                item: record.item,
                handle: record.handle.clone(),
                connected: record.connected,
                port: record.port.as_ref(),
                constraint: record.constraint,
            })
            .collect()
    }

    /// Remove every connection whose *other end* is `item` (i.e.
    /// `connected == item`), as opposed to [`disconnect_item`](Self::disconnect_item)
    /// which removes connections *owned by* `item`. Used when `item` is
    /// being removed from the canvas, to clear dangling references from
    /// other items' handles.
    pub fn remove_connections_to_item(&mut self, item: I) {
        let handles: Vec<HandleId> = self
            .records
            .iter()
            .filter(|(_, record)| record.connected == item)
            .map(|(handle, _)| handle.clone())
            .collect();
        for handle in handles {
            self.remove_record(&handle);
        }
    }

    /// Number of connections currently registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry holds no connections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn remove_record(&mut self, handle: &HandleId) {
        let Some(mut record) = self.records.remove(handle) else {
            return;
        };
        if let Some(id) = record.constraint.take() {
            self.solver.remove_constraint(id);
        }
        if let Some(callback) = record.callback.as_mut() {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenic_item::{Handle, LinePort};
    use scenic_solver::{EqualsConstraint, NORMAL};
    use std::cell::Cell;
    use std::rc::Rc;

    fn port() -> Box<dyn Port> {
        Box::new(LinePort::new(
            (
                scenic_solver::Variable::new(0.0, NORMAL),
                scenic_solver::Variable::new(0.0, NORMAL),
            ),
            (
                scenic_solver::Variable::new(10.0, NORMAL),
                scenic_solver::Variable::new(0.0, NORMAL),
            ),
        ))
    }

    #[test]
    fn connect_registers_constraint_with_the_solver() {
        let solver = Solver::new();
        let mut connections = Connections::<u32>::new(solver.clone());
        let handle = Handle::new(0.0, 0.0, NORMAL);
        let a = scenic_solver::Variable::new(1.0, NORMAL);
        let b = scenic_solver::Variable::new(2.0, NORMAL);
        let constraint: Box<dyn Constraint> = Box::new(EqualsConstraint::new(a, b));

        connections.connect_item(1, handle.id(), 2, port(), Some(constraint), None);
        assert_eq!(solver.constraint_count(), 1);
        assert_eq!(connections.len(), 1);
    }

    #[test]
    fn disconnect_fires_callback_exactly_once() {
        let solver = Solver::new();
        let mut connections = Connections::<u32>::new(solver);
        let handle = Handle::new(0.0, 0.0, NORMAL);
        let fired = Rc::new(Cell::new(0));
        let fired_cb = fired.clone();

        connections.connect_item(
            1,
            handle.id(),
            2,
            port(),
            None,
            Some(Box::new(move || fired_cb.set(fired_cb.get() + 1))),
        );
        connections.disconnect_item(1, Some(handle.id()));
        assert_eq!(fired.get(), 1);

        // A second disconnect of the same (now-absent) handle is a no-op.
        connections.disconnect_item(1, Some(handle.id()));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn reconnecting_the_same_handle_replaces_without_firing_callback() {
        let solver = Solver::new();
        let mut connections = Connections::<u32>::new(solver.clone());
        let handle = Handle::new(0.0, 0.0, NORMAL);
        let fired = Rc::new(Cell::new(0));
        let fired_cb = fired.clone();

        connections.connect_item(
            1,
            handle.id(),
            2,
            port(),
            None,
            Some(Box::new(move || fired_cb.set(fired_cb.get() + 1))),
        );
        connections.reconnect_item(&handle.id(), Some(port()), None);
        assert_eq!(fired.get(), 0);
        assert!(connections.get_connection(&handle.id()).is_some());
    }

    #[test]
    fn connecting_an_already_connected_handle_fires_the_old_callback_once() {
        let solver = Solver::new();
        let mut connections = Connections::<u32>::new(solver);
        let handle = Handle::new(0.0, 0.0, NORMAL);
        let fired = Rc::new(Cell::new(0));
        let fired_cb = fired.clone();

        connections.connect_item(
            1,
            handle.id(),
            2,
            port(),
            None,
            Some(Box::new(move || fired_cb.set(fired_cb.get() + 1))),
        );
        connections.connect_item(1, handle.id(), 3, port(), None, None);
        assert_eq!(fired.get(), 1);
        assert_eq!(connections.get_connection(&handle.id()).unwrap().connected, 3);
    }

    #[test]
    fn remove_connections_to_item_only_matches_the_remote_end() {
        let solver = Solver::new();
        let mut connections = Connections::<u32>::new(solver);
        let h1 = Handle::new(0.0, 0.0, NORMAL);
        let h2 = Handle::new(1.0, 1.0, NORMAL);
        connections.connect_item(1, h1.id(), 2, port(), None, None);
        connections.connect_item(2, h2.id(), 1, port(), None, None);

        connections.remove_connections_to_item(2);
        assert!(connections.get_connection(&h1.id()).is_none());
        assert!(connections.get_connection(&h2.id()).is_some());
    }

    #[test]
    fn get_connections_filters_by_item() {
        let solver = Solver::new();
        let mut connections = Connections::<u32>::new(solver);
        let h1 = Handle::new(0.0, 0.0, NORMAL);
        let h2 = Handle::new(1.0, 1.0, NORMAL);
        connections.connect_item(1, h1.id(), 9, port(), None, None);
        connections.connect_item(2, h2.id(), 9, port(), None, None);

        let filter = ConnectionFilter {
            item: Some(1),
            ..Default::default()
        };
        let matches = connections.get_connections(&filter);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].item, 1);
    }
}
