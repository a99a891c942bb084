// Copyright 2026 the Scenic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Injected collaborators: the scheduler, the per-update context factory,
//! view notification, and the observed-mutation event sink.
//!
//! None of these carry a default implementation that does anything but the
//! simplest possible thing; a host that wants a real idle loop, a real
//! renderer-backed update context, or a real undo recorder supplies its own.

use std::fmt;

use scenic_item::{NullUpdateContext, UpdateContext};

use crate::ItemId;

/// Arranges for a deferred callback to run "soon", coalescing repeated
/// requests into a single pending callback.
///
/// [`Canvas::update`](crate::Canvas::update) calls `schedule` at most once
/// per pending batch of dirty items; further calls before the scheduled
/// callback has fired are no-ops on the canvas side; a given `Scheduler`
/// implementation is free to additionally coalesce at its own layer (e.g.
/// replacing a still-pending GLib idle source) if its underlying mechanism
/// doesn't already guarantee at-most-once delivery.
pub trait Scheduler {
    /// Arrange for `thunk` to run, synchronously or deferred.
    fn schedule(&mut self, thunk: Box<dyn FnOnce() + 'static>);
}

/// The default scheduler: runs the thunk synchronously, inline.
///
/// Matches the spec's "default is immediate invocation"; suitable for
/// headless hosts and tests, and for any host that doesn't have (or
/// doesn't want) a real idle queue.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn schedule(&mut self, thunk: Box<dyn FnOnce() + 'static>) {
        thunk();
    }
}

/// Builds a fresh [`UpdateContext`] for each item touched by an update
/// pass. The core never interprets the context's contents; it exists so a
/// host can thread renderer or measurement state through
/// [`Item::pre_update`](scenic_item::Item::pre_update) and
/// [`Item::post_update`](scenic_item::Item::post_update).
pub trait CreateUpdateContext {
    /// Build the context for `item`.
    fn create_update_context(&mut self, item: ItemId) -> Box<dyn UpdateContext>;
}

/// The default context factory: hands out [`NullUpdateContext`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NullContextFactory;

impl CreateUpdateContext for NullContextFactory {
    fn create_update_context(&mut self, _item: ItemId) -> Box<dyn UpdateContext> {
        Box::new(NullUpdateContext)
    }
}

/// Registered with [`Canvas::register_view`](crate::Canvas::register_view)
/// to be told, once per completed update pass, which items changed.
pub trait View {
    /// Called once at the end of [`Canvas::update_now`](crate::Canvas::update_now)
    /// with the items whose update hooks ran, the items whose canvas
    /// matrix changed, and the items removed during the pass.
    fn request_update(&mut self, dirty_items: &[ItemId], dirty_matrix_items: &[ItemId], removed_items: &[ItemId]);
}

/// Handle returned by [`Canvas::register_view`](crate::Canvas::register_view),
/// used to [`unregister_view`](crate::Canvas::unregister_view) later.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewToken(pub(crate) u64);

/// One observed canvas mutation, carrying enough state to reconstruct its
/// logical inverse.
///
/// Ported from `gaphas.canvas.Canvas`'s `@observed` + `reversible_method`
/// pairing: the original binds each mutator to the call that undoes it
/// (`add`'s inverse is `_remove`; `reparent`'s inverse is `reparent` back to
/// the old parent and index). An external undo recorder building on
/// [`EventSink`] has everything it needs to construct that inverse call
/// from the fields carried here, without re-deriving it from a generic
/// "diff the tree" pass.
#[derive(Clone, Debug)]
pub enum ObservedEvent {
    /// `item` was inserted under `parent` at `index`.
    Add {
        /// The added item.
        item: ItemId,
        /// Its parent at insertion time.
        parent: Option<ItemId>,
        /// Its position among its new siblings.
        index: usize,
    },
    /// `item` was removed from under `parent`, where it sat at `index`.
    Remove {
        /// The removed item.
        item: ItemId,
        /// Its parent immediately before removal.
        parent: Option<ItemId>,
        /// Its position among its former siblings.
        index: usize,
    },
    /// `item` moved from `old_parent`/`old_index` to `new_parent`/`new_index`.
    Reparent {
        /// The moved item.
        item: ItemId,
        /// Its parent before the move.
        old_parent: Option<ItemId>,
        /// Its position among its old siblings.
        old_index: usize,
        /// Its parent after the move.
        new_parent: Option<ItemId>,
        /// Its requested position among its new siblings, if any.
        new_index: Option<usize>,
    },
    /// `item` was marked dirty for the next update pass.
    RequestUpdate {
        /// The affected item.
        item: ItemId,
        /// Whether `item`'s update hooks were requested to re-run.
        update: bool,
        /// Whether `item`'s canvas matrix was requested to be recomputed.
        matrix: bool,
    },
    /// `handle` (owned by `item`) was connected to `connected`.
    Connect {
        /// The item owning the connecting handle.
        item: ItemId,
        /// The item the handle now points to.
        connected: ItemId,
    },
    /// A connection owned by `item` was torn down.
    Disconnect {
        /// The item that owned the connection.
        item: ItemId,
    },
}

/// Receives [`ObservedEvent`]s as canvas mutations happen.
///
/// The recorder itself (undo/redo stacks, persistence, ...) stays entirely
/// outside this crate; only the emission contract lives here.
pub trait EventSink {
    /// Record one observed mutation.
    fn observe(&mut self, event: ObservedEvent);
}

/// The default sink: discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn observe(&mut self, _event: ObservedEvent) {}
}

impl fmt::Debug for ViewToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewToken({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_scheduler_runs_the_thunk_before_returning() {
        let mut ran = false;
        let mut scheduler = ImmediateScheduler;
        scheduler.schedule(Box::new(|| ran = true));
        assert!(ran);
    }

    #[test]
    fn null_event_sink_accepts_every_variant_without_panicking() {
        use crate::item_id::Arena;
        use scenic_item::Element;

        let mut arena = Arena::new();
        let item = arena.insert(Box::new(Element::new(1.0, 1.0)));

        let mut sink = NullEventSink;
        sink.observe(ObservedEvent::Add {
            item,
            parent: None,
            index: 0,
        });
    }
}
