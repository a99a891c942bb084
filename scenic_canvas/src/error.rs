// Copyright 2026 the Scenic Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors surfaced by [`Canvas`](crate::Canvas)'s mutating operations.

use std::fmt;

use scenic_solver::JuggleError;

use crate::ItemId;

/// Errors from [`Canvas`](crate::Canvas)'s public API.
///
/// `AlreadyPresent`/`NotPresent` are programming errors: a caller handed the
/// canvas an [`ItemId`] that doesn't (or no longer) names a live item.
/// They are returned rather than panicking, so a host in a position to
/// recover (e.g. an item removed by a concurrent undo step) can do so
/// without the library deciding that's fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasError {
    /// `parent` does not name an item currently in the canvas.
    NotPresent(ItemId),
    /// Reparenting `item` under the given parent would make it its own
    /// ancestor.
    Cycle(ItemId),
    /// The solver did not reach a fixpoint within its juggle limit.
    Juggle(JuggleError),
}

impl fmt::Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPresent(id) => write!(f, "item {id:?} is not present in this canvas"),
            Self::Cycle(id) => write!(f, "moving {id:?} there would make it its own ancestor"),
            Self::Juggle(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CanvasError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Juggle(err) => Some(err),
            _ => None,
        }
    }
}

impl From<JuggleError> for CanvasError {
    fn from(err: JuggleError) -> Self {
        Self::Juggle(err)
    }
}

/// Records that an item's `pre_update`/`post_update` hook panicked during an
/// update pass. The pipeline recovers locally from these (logs and
/// continues); they are never returned from [`Canvas::update_now`](crate::Canvas::update_now),
/// which only surfaces [`CanvasError::Juggle`] to its caller.
#[derive(Clone, Debug)]
pub struct ItemUpdateError {
    /// The item whose hook panicked.
    pub item: ItemId,
    /// Which hook panicked.
    pub phase: UpdatePhase,
    /// The panic payload, downcast to a message where possible.
    pub message: String,
}

/// Which update hook an [`ItemUpdateError`] was raised from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdatePhase {
    /// [`Item::pre_update`](scenic_item::Item::pre_update).
    Pre,
    /// [`Item::post_update`](scenic_item::Item::post_update).
    Post,
}

impl fmt::Display for ItemUpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            UpdatePhase::Pre => "pre_update",
            UpdatePhase::Post => "post_update",
        };
        write!(f, "{phase} panicked for item {:?}: {}", self.item, self.message)
    }
}

impl std::error::Error for ItemUpdateError {}
