// Copyright 2026 the Scenic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The canvas: a tree of items sharing one solver and one connection
//! registry, with a non-reentrant, dirty-tracking update pipeline.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use scenic_connections::{Connections, DisconnectCallback};
use scenic_item::{HandleId, Item, Port, UpdateContext};
use scenic_matrix::Matrix;
use scenic_solver::{Constraint, ConstraintId, MatrixProjection, Solver};
use scenic_tree::Tree;

use crate::error::{CanvasError, ItemUpdateError, UpdatePhase};
use crate::hooks::{
    CreateUpdateContext, EventSink, ImmediateScheduler, NullContextFactory, NullEventSink,
    ObservedEvent, Scheduler, View, ViewToken,
};
use crate::item_id::Arena;
use crate::ItemId;

struct CanvasState {
    arena: Arena,
    tree: Tree<ItemId>,
    solver: Solver,
    connections: Connections<ItemId>,
    item_constraints: HashMap<ItemId, Vec<ConstraintId>>,
    dirty_update: HashSet<ItemId>,
    dirty_matrix: HashSet<ItemId>,
    removed_items: Vec<ItemId>,
    matrix_cells: HashMap<ItemId, Rc<RefCell<Matrix>>>,
    projections: HashMap<ItemId, Vec<Rc<MatrixProjection>>>,
    views: Vec<(ViewToken, Box<dyn View>)>,
    next_view_token: u64,
    scheduler: Box<dyn Scheduler>,
    context_factory: Box<dyn CreateUpdateContext>,
    event_sink: Box<dyn EventSink>,
    scheduled: bool,
}

impl CanvasState {
    fn add(
        &mut self,
        item: Box<dyn Item>,
        parent: Option<ItemId>,
        index: Option<usize>,
    ) -> Result<ItemId, CanvasError> {
        if let Some(parent) = parent {
            if !self.arena.contains(parent) {
                return Err(CanvasError::NotPresent(parent));
            }
        }
        let id = self.arena.insert(item);
        self.tree.add(id, parent, index);
        self.register_item_constraints(id);
        self.dirty_update.insert(id);
        self.dirty_matrix.insert(id);
        let index = self.sibling_index(id);
        self.event_sink.observe(ObservedEvent::Add {
            item: id,
            parent,
            index,
        });
        Ok(id)
    }

    fn register_item_constraints(&mut self, id: ItemId) {
        let Some(item) = self.arena.get_mut(id) else {
            return;
        };
        let constraints = item.constraints();
        if constraints.is_empty() {
            return;
        }
        let ids = constraints
            .into_iter()
            .map(|c| self.solver.add_constraint(c))
            .collect();
        self.item_constraints.insert(id, ids);
    }

    fn remove(&mut self, id: ItemId) -> Result<(), CanvasError> {
        if !self.arena.contains(id) {
            return Err(CanvasError::NotPresent(id));
        }
        let mut order = vec![id];
        order.extend(self.tree.get_all_children(Some(id)));
        for &node in order.iter().rev() {
            self.teardown_item(node);
        }
        self.tree.remove(id);
        Ok(())
    }

    fn teardown_item(&mut self, id: ItemId) {
        let parent = self.tree.get_parent(id);
        let index = self.sibling_index(id);
        self.connections.disconnect_item(id, None);
        self.connections.remove_connections_to_item(id);
        if let Some(ids) = self.item_constraints.remove(&id) {
            for constraint_id in ids {
                self.solver.remove_constraint(constraint_id);
            }
        }
        self.arena.remove(id);
        self.dirty_update.remove(&id);
        self.dirty_matrix.remove(&id);
        self.matrix_cells.remove(&id);
        self.projections.remove(&id);
        self.removed_items.push(id);
        self.event_sink
            .observe(ObservedEvent::Remove { item: id, parent, index });
    }

    fn reparent(
        &mut self,
        item: ItemId,
        parent: Option<ItemId>,
        index: Option<usize>,
    ) -> Result<(), CanvasError> {
        if !self.arena.contains(item) {
            return Err(CanvasError::NotPresent(item));
        }
        if let Some(parent) = parent {
            if !self.arena.contains(parent) {
                return Err(CanvasError::NotPresent(parent));
            }
        }
        let old_parent = self.tree.get_parent(item);
        let old_index = self.sibling_index(item);
        self.tree
            .move_node(item, parent, index)
            .map_err(|_| CanvasError::Cycle(item))?;
        self.dirty_update.insert(item);
        self.dirty_matrix.insert(item);
        self.event_sink.observe(ObservedEvent::Reparent {
            item,
            old_parent,
            old_index,
            new_parent: parent,
            new_index: index,
        });
        Ok(())
    }

    fn sibling_index(&self, node: ItemId) -> usize {
        let parent = self.tree.get_parent(node);
        self.tree
            .get_children(parent)
            .iter()
            .position(|&n| n == node)
            .unwrap_or(0)
    }

    fn request_update(&mut self, item: ItemId, update: bool, matrix: bool) {
        if update {
            self.dirty_update.insert(item);
        }
        if matrix {
            self.dirty_matrix.insert(item);
        }
        self.event_sink
            .observe(ObservedEvent::RequestUpdate { item, update, matrix });
    }

    fn connect_item(
        &mut self,
        item: ItemId,
        handle: HandleId,
        connected: ItemId,
        port: Box<dyn Port>,
        constraint: Option<Box<dyn Constraint>>,
        callback: Option<DisconnectCallback>,
    ) -> Result<(), CanvasError> {
        if !self.arena.contains(item) {
            return Err(CanvasError::NotPresent(item));
        }
        if !self.arena.contains(connected) {
            return Err(CanvasError::NotPresent(connected));
        }
        self.connections
            .connect_item(item, handle, connected, port, constraint, callback);
        self.event_sink
            .observe(ObservedEvent::Connect { item, connected });
        Ok(())
    }

    fn disconnect_item(&mut self, item: ItemId, handle: Option<HandleId>) {
        self.connections.disconnect_item(item, handle);
        self.event_sink.observe(ObservedEvent::Disconnect { item });
    }

    fn get_matrix_i2c(&self, id: ItemId) -> Matrix {
        let mut chain: Vec<ItemId> = self.tree.get_ancestors(id).collect();
        chain.reverse();
        let mut matrix = Matrix::IDENTITY;
        for ancestor in chain {
            if let Some(item) = self.arena.get(ancestor) {
                matrix = item.matrix().multiply(&matrix);
            }
        }
        if let Some(item) = self.arena.get(id) {
            matrix = item.matrix().multiply(&matrix);
        }
        matrix
    }

    fn matrix_cell(&mut self, item: ItemId) -> Rc<RefCell<Matrix>> {
        if let Some(cell) = self.matrix_cells.get(&item) {
            return cell.clone();
        }
        let i2c = self.get_matrix_i2c(item);
        let cell = Rc::new(RefCell::new(i2c));
        self.matrix_cells.insert(item, cell.clone());
        cell
    }

    fn register_view(&mut self, view: Box<dyn View>) -> ViewToken {
        let token = ViewToken(self.next_view_token);
        self.next_view_token += 1;
        self.views.push((token, view));
        token
    }

    fn unregister_view(&mut self, token: ViewToken) {
        self.views.retain(|(t, _)| *t != token);
    }

    /// Add every ancestor of a dirty-for-update item to the dirty set too,
    /// so a leaf's geometry change always re-runs its ancestors' hooks.
    fn expand_dirty_with_ancestors(&mut self) {
        let seeds: Vec<ItemId> = self.dirty_update.iter().copied().collect();
        for id in seeds {
            for ancestor in self.tree.get_ancestors(id) {
                self.dirty_update.insert(ancestor);
            }
        }
    }

    /// The expanded dirty-update set, leaves first (the reverse of
    /// depth-first pre-order), so a child's `pre_update` always runs before
    /// the parent whose size it might affect.
    fn leaves_first(&self) -> Vec<ItemId> {
        let mut ordered = self.tree.order(self.dirty_update.iter().copied());
        ordered.reverse();
        ordered
    }

    fn refresh_pending_items(&mut self) -> Vec<ItemId> {
        self.expand_dirty_with_ancestors();
        self.leaves_first()
    }

    /// The update pipeline. Runs to completion even if the solver fails to
    /// converge; a [`JuggleError`](scenic_solver::JuggleError) is logged and
    /// reported only after every other step (matrix export, second solve,
    /// `post_update`, view notification) has run.
    fn run_cycle(&mut self) -> Result<(), CanvasError> {
        let mut items = self.refresh_pending_items();

        let mut contexts: HashMap<ItemId, Box<dyn UpdateContext>> = HashMap::new();
        for &id in &items {
            let mut ctx = self.context_factory.create_update_context(id);
            if let Some(item) = self.arena.get_mut(id) {
                run_hook(item, ctx.as_mut(), id, UpdatePhase::Pre);
            }
            contexts.insert(id, ctx);
        }

        let mut matrix_targets: HashSet<ItemId> = self.dirty_matrix.drain().collect();
        matrix_targets.extend(items.iter().copied());

        let first_solve = self.solver.solve();
        debug_assert!(
            self.dirty_matrix.is_empty(),
            "solving must not mark new matrix-dirty items"
        );

        items = self.refresh_pending_items();

        let matrix_targets = self.tree.order(matrix_targets);
        for &id in &matrix_targets {
            let i2c = self.get_matrix_i2c(id);
            if let Some(cell) = self.matrix_cells.get(&id) {
                *cell.borrow_mut() = i2c;
            }
            if let Some(projections) = self.projections.get(&id) {
                for projection in projections {
                    projection.refresh();
                }
            }
        }

        let second_solve = self.solver.solve();
        items = self.refresh_pending_items();
        self.dirty_update.clear();

        for &id in &items {
            if let Some(mut ctx) = contexts.remove(&id) {
                if let Some(item) = self.arena.get_mut(id) {
                    run_hook(item, ctx.as_mut(), id, UpdatePhase::Post);
                }
            }
        }

        debug_assert!(self.dirty_update.is_empty());
        debug_assert!(self.dirty_matrix.is_empty());

        let removed = std::mem::take(&mut self.removed_items);
        for (_, view) in &mut self.views {
            view.request_update(&items, &matrix_targets, &removed);
        }

        match first_solve.and(second_solve) {
            Ok(()) => Ok(()),
            Err(err) => {
                log::error!("{err}");
                Err(CanvasError::from(err))
            }
        }
    }
}

fn run_hook(item: &mut dyn Item, ctx: &mut dyn UpdateContext, id: ItemId, phase: UpdatePhase) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| match phase {
        UpdatePhase::Pre => item.pre_update(ctx),
        UpdatePhase::Post => item.post_update(ctx),
    }));
    if let Err(payload) = result {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        log::error!("{}", ItemUpdateError { item: id, phase, message });
    }
}

/// A tree of items sharing one solver and one connection registry, with a
/// non-reentrant, dirty-tracking update pipeline.
///
/// `Canvas` is a cheap `Rc`-backed clone handle over its actual state,
/// exactly like [`Solver`](scenic_solver::Solver): cloning it shares the
/// same tree, arena, and pending-update flag, which is what lets
/// [`update`](Canvas::update) hand a scheduler a callback that calls back
/// into `update_now` without borrowing anything non-`'static`.
#[derive(Clone)]
pub struct Canvas {
    inner: Rc<RefCell<CanvasState>>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create a canvas with the default collaborators: an
    /// [`ImmediateScheduler`] and a [`NullContextFactory`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_hooks(Box::new(ImmediateScheduler), Box::new(NullContextFactory))
    }

    /// Create a canvas with explicitly injected collaborators.
    #[must_use]
    pub fn with_hooks(
        scheduler: Box<dyn Scheduler>,
        context_factory: Box<dyn CreateUpdateContext>,
    ) -> Self {
        let solver = Solver::new();
        Self {
            inner: Rc::new(RefCell::new(CanvasState {
                arena: Arena::new(),
                tree: Tree::new(),
                connections: Connections::new(solver.clone()),
                solver,
                item_constraints: HashMap::new(),
                dirty_update: HashSet::new(),
                dirty_matrix: HashSet::new(),
                removed_items: Vec::new(),
                matrix_cells: HashMap::new(),
                projections: HashMap::new(),
                views: Vec::new(),
                next_view_token: 0,
                scheduler,
                context_factory,
                event_sink: Box::new(NullEventSink),
                scheduled: false,
            })),
        }
    }

    /// Replace the observed-mutation sink (default: [`NullEventSink`]).
    pub fn set_event_sink(&self, sink: Box<dyn EventSink>) {
        self.inner.borrow_mut().event_sink = sink;
    }

    /// Whether `item` currently names a live item in this canvas.
    #[must_use]
    pub fn contains(&self, item: ItemId) -> bool {
        self.inner.borrow().arena.contains(item)
    }

    /// The solver this canvas's items and connections are registered with.
    #[must_use]
    pub fn solver(&self) -> Solver {
        self.inner.borrow().solver.clone()
    }

    /// Insert `item` under `parent` (or as a root, if `parent` is `None`)
    /// at `index` (or at the end, if `index` is `None`). Registers the
    /// item's intra-item constraints and marks it dirty for the next
    /// update pass.
    pub fn add(
        &self,
        item: Box<dyn Item>,
        parent: Option<ItemId>,
        index: Option<usize>,
    ) -> Result<ItemId, CanvasError> {
        let id = self.inner.borrow_mut().add(item, parent, index)?;
        self.update();
        Ok(id)
    }

    /// Remove `item` and all of its descendants, deepest first, tearing
    /// down their constraints and connections as they go.
    pub fn remove(&self, item: ItemId) -> Result<(), CanvasError> {
        self.inner.borrow_mut().remove(item)?;
        self.update();
        Ok(())
    }

    /// Move `item` (with its subtree intact) under `parent` at `index`.
    pub fn reparent(
        &self,
        item: ItemId,
        parent: Option<ItemId>,
        index: Option<usize>,
    ) -> Result<(), CanvasError> {
        self.inner.borrow_mut().reparent(item, parent, index)?;
        self.update();
        Ok(())
    }

    /// Mark `item` dirty for its update hooks and/or its canvas matrix,
    /// and ask the scheduler to run `update_now` soon.
    pub fn request_update(&self, item: ItemId, update: bool, matrix: bool) {
        self.inner.borrow_mut().request_update(item, update, matrix);
        self.update();
    }

    /// Shorthand for [`request_update`](Self::request_update) with only
    /// the matrix flag set.
    pub fn request_matrix_update(&self, item: ItemId) {
        self.request_update(item, false, true);
    }

    /// Glue `handle` (owned by `item`) to `port` on `connected`. See
    /// [`Connections::connect_item`](scenic_connections::Connections::connect_item).
    pub fn connect_item(
        &self,
        item: ItemId,
        handle: HandleId,
        connected: ItemId,
        port: Box<dyn Port>,
        constraint: Option<Box<dyn Constraint>>,
        callback: Option<DisconnectCallback>,
    ) -> Result<(), CanvasError> {
        self.inner
            .borrow_mut()
            .connect_item(item, handle, connected, port, constraint, callback)?;
        self.update();
        Ok(())
    }

    /// Disconnect `handle` (or every connection owned by `item`, if
    /// `handle` is `None`).
    pub fn disconnect_item(&self, item: ItemId, handle: Option<HandleId>) {
        self.inner.borrow_mut().disconnect_item(item, handle);
        self.update();
    }

    /// The item-to-canvas matrix for `item`, composed fresh from its local
    /// matrix and every ancestor's.
    #[must_use]
    pub fn get_matrix_i2c(&self, item: ItemId) -> Matrix {
        self.inner.borrow().get_matrix_i2c(item)
    }

    /// Sort `items` by depth-first pre-order position in the tree.
    #[must_use]
    pub fn sort(&self, items: impl IntoIterator<Item = ItemId>) -> Vec<ItemId> {
        self.inner.borrow().tree.order(items)
    }

    /// A live cell tracking `item`'s canvas matrix, refreshed on every
    /// update pass that touches `item`. Lazily created and cached on first
    /// request.
    #[must_use]
    pub fn matrix_cell(&self, item: ItemId) -> Rc<RefCell<Matrix>> {
        self.inner.borrow_mut().matrix_cell(item)
    }

    /// Register `projection` to be refreshed whenever `item`'s canvas
    /// matrix is recomposed during an update pass.
    pub fn register_projection(&self, item: ItemId, projection: Rc<MatrixProjection>) {
        self.inner
            .borrow_mut()
            .projections
            .entry(item)
            .or_default()
            .push(projection);
    }

    /// Register a view to be notified once per completed update pass.
    pub fn register_view(&self, view: Box<dyn View>) -> ViewToken {
        self.inner.borrow_mut().register_view(view)
    }

    /// Unregister a previously registered view.
    pub fn unregister_view(&self, token: ViewToken) {
        self.inner.borrow_mut().unregister_view(token);
    }

    /// Ask the scheduler to run [`update_now`](Self::update_now) soon.
    /// Idempotent: calls made before the scheduler fires collapse into a
    /// single pass.
    pub fn update(&self) {
        let should_schedule = {
            let mut state = self.inner.borrow_mut();
            if state.scheduled {
                false
            } else {
                state.scheduled = true;
                true
            }
        };
        if !should_schedule {
            return;
        }
        // Take the scheduler out of the `RefCell` before invoking it: a
        // synchronous scheduler's thunk calls straight back into
        // `update_now`, which needs the borrow free, and even a deferred
        // scheduler might synchronously inspect canvas state while
        // arranging its callback.
        let mut scheduler = std::mem::replace(
            &mut self.inner.borrow_mut().scheduler,
            Box::new(ImmediateScheduler),
        );
        let handle = self.clone();
        scheduler.schedule(Box::new(move || {
            let _ = handle.update_now();
        }));
        self.inner.borrow_mut().scheduler = scheduler;
    }

    /// Run the update pipeline now, synchronously.
    ///
    /// Non-reentrant: a call made while a pass is already running (e.g.
    /// because an item's update hook, or a scheduler implementation, calls
    /// back into `update_now`) is a no-op that returns `Ok(())`.
    pub fn update_now(&self) -> Result<(), CanvasError> {
        let Ok(mut state) = self.inner.try_borrow_mut() else {
            return Ok(());
        };
        state.scheduled = false;
        state.run_cycle()
    }
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("Canvas")
            .field("items", &state.tree.len())
            .field("views", &state.views.len())
            .finish_non_exhaustive()
    }
}
