//! Capabilities the overlay consumes from the host application.
//!
//! The overlay never talks to a GUI toolkit directly. A host exposes its widget
//! tree as a flat list of [`ControlDescriptor`]s plus a handful of actions, and
//! the overlay stays decoupled from any particular class hierarchy.

use std::ops::RangeInclusive;

use glam::Vec2;

use crate::api::error::HostError;
use crate::api::types::{ControlId, ControlKind, Rect};

/// How a host node takes part in hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    /// A control the character can play with.
    Interactive(ControlKind),
    /// Labels, frames, containers. Hits on these resolve to the nearest
    /// interactive ancestor.
    Passive,
}

impl NodeClass {
    pub fn control_kind(self) -> Option<ControlKind> {
        match self {
            NodeClass::Interactive(kind) => Some(kind),
            NodeClass::Passive => None,
        }
    }
}

/// One node of the host's widget tree, flattened.
///
/// Descriptors are listed in paint order: a later descriptor is drawn on top
/// of an earlier one.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlDescriptor {
    pub id: ControlId,
    pub parent: Option<ControlId>,
    /// Rect in the shared coordinate space.
    pub rect: Rect,
    pub class: NodeClass,
    pub enabled: bool,
    pub visible: bool,
}

/// The host application as seen by the overlay.
///
/// Query methods take `&self`; anything that changes a control takes `&mut self`.
/// Value and index operations default to [`HostError::Unsupported`] so hosts
/// only implement what their controls can do.
pub trait HostWindow {
    /// Enumerate the window's visible nodes in paint order. Passive nodes may be
    /// included so hits on child labels can be resolved to their control.
    fn enumerate_interactive_controls(&self) -> Result<Vec<ControlDescriptor>, HostError>;

    /// Size of the overlay/window area in overlay-local pixels.
    fn window_size(&self) -> Vec2;

    fn map_local_to_shared(&self, point: Vec2) -> Vec2 {
        point
    }

    fn map_shared_to_local(&self, point: Vec2) -> Vec2 {
        point
    }

    /// Trigger the control's primary action (click/toggle).
    fn activate(&mut self, id: ControlId) -> Result<(), HostError>;

    fn get_index(&self, id: ControlId) -> Result<usize, HostError> {
        Err(HostError::Unsupported { id, op: "get_index" })
    }

    fn set_index(&mut self, id: ControlId, _index: usize) -> Result<(), HostError> {
        Err(HostError::Unsupported { id, op: "set_index" })
    }

    /// Number of entries (tabs, combo items) behind an indexed control.
    fn index_count(&self, id: ControlId) -> Result<usize, HostError> {
        Err(HostError::Unsupported { id, op: "index_count" })
    }

    fn get_value(&self, id: ControlId) -> Result<i32, HostError> {
        Err(HostError::Unsupported { id, op: "get_value" })
    }

    fn set_value(&mut self, id: ControlId, _value: i32) -> Result<(), HostError> {
        Err(HostError::Unsupported { id, op: "set_value" })
    }

    fn get_range(&self, id: ControlId) -> Result<RangeInclusive<i32>, HostError> {
        Err(HostError::Unsupported { id, op: "get_range" })
    }
}

/// Coordinate conversion between overlay-local pixels and the shared space
/// control rects live in.
pub trait CoordinateSpace {
    fn to_shared(&self, local: Vec2) -> Vec2;
    fn to_local(&self, shared: Vec2) -> Vec2;
}

/// Overlay and host share one origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentitySpace;

impl CoordinateSpace for IdentitySpace {
    fn to_shared(&self, local: Vec2) -> Vec2 {
        local
    }

    fn to_local(&self, shared: Vec2) -> Vec2 {
        shared
    }
}

/// Borrowing adapter that routes conversions through a host window.
pub struct HostSpace<'a, H: HostWindow + ?Sized>(pub &'a H);

impl<H: HostWindow + ?Sized> CoordinateSpace for HostSpace<'_, H> {
    fn to_shared(&self, local: Vec2) -> Vec2 {
        self.0.map_local_to_shared(local)
    }

    fn to_local(&self, shared: Vec2) -> Vec2 {
        self.0.map_shared_to_local(shared)
    }
}
