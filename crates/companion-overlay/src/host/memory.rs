//! In-memory host window.
//!
//! Holds a small widget tree and per-control state so the overlay can run
//! headless: in tests, in the simulation runner, or behind a toolkit adapter
//! that mirrors its widgets into it.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;

use glam::Vec2;

use crate::api::error::HostError;
use crate::api::types::{ControlId, ControlKind, Rect};
use super::tree::{walk_widget_tree, WidgetNode};
use super::window::{ControlDescriptor, HostWindow, NodeClass};

/// Mutable state behind a control.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControlState {
    pub checked: bool,
    pub index: usize,
    pub count: usize,
    pub value: i32,
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone)]
struct MemoryNode {
    id: ControlId,
    class: NodeClass,
    /// Window-local rect.
    rect: Rect,
    visible: bool,
    enabled: bool,
    state: ControlState,
    children: Vec<MemoryNode>,
}

impl MemoryNode {
    fn new(id: ControlId, class: NodeClass, rect: Rect) -> Self {
        let mut state = ControlState::default();
        match class {
            NodeClass::Interactive(ControlKind::Slider) => {
                state.max = 100;
            }
            NodeClass::Interactive(ControlKind::Tab | ControlKind::Combo) => {
                state.count = 1;
            }
            _ => {}
        }
        Self {
            id,
            class,
            rect,
            visible: true,
            enabled: true,
            state,
            children: Vec::new(),
        }
    }

    fn find(&self, id: ControlId) -> Option<&MemoryNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    fn find_mut(&mut self, id: ControlId) -> Option<&mut MemoryNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    fn remove_child(&mut self, id: ControlId) -> bool {
        if let Some(idx) = self.children.iter().position(|c| c.id == id) {
            self.children.remove(idx);
            return true;
        }
        self.children.iter_mut().any(|c| c.remove_child(id))
    }
}

/// Presents a node with its rect translated into the shared space.
struct SharedNode<'a> {
    node: &'a MemoryNode,
    origin: Vec2,
}

impl WidgetNode for SharedNode<'_> {
    fn id(&self) -> ControlId {
        self.node.id
    }

    fn kind_of(&self) -> NodeClass {
        self.node.class
    }

    fn geometry(&self) -> Rect {
        self.node.rect.translate(self.origin)
    }

    fn is_visible(&self) -> bool {
        self.node.visible
    }

    fn is_enabled(&self) -> bool {
        self.node.enabled
    }

    fn for_each_child(&self, visit: &mut dyn FnMut(&dyn WidgetNode)) {
        for child in &self.node.children {
            visit(&SharedNode { node: child, origin: self.origin });
        }
    }
}

/// A host window backed by plain data.
#[derive(Debug)]
pub struct MemoryHost {
    size: Vec2,
    /// Window origin in the shared coordinate space.
    origin: Vec2,
    root: MemoryNode,
    next_id: u64,
    available: bool,
    activations: HashMap<ControlId, u32>,
    failing: HashSet<ControlId>,
    panicking: HashSet<ControlId>,
    enumerations: Cell<u32>,
}

impl MemoryHost {
    pub const ROOT: ControlId = ControlId(0);

    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            origin: Vec2::ZERO,
            root: MemoryNode::new(Self::ROOT, NodeClass::Passive, Rect::new(0.0, 0.0, width, height)),
            next_id: 1,
            available: true,
            activations: HashMap::new(),
            failing: HashSet::new(),
            panicking: HashSet::new(),
            enumerations: Cell::new(0),
        }
    }

    /// Place the window at `origin` in the shared coordinate space.
    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    /// Add an interactive control directly under the window root.
    pub fn add_control(&mut self, kind: ControlKind, rect: Rect) -> ControlId {
        self.add_node(Self::ROOT, NodeClass::Interactive(kind), rect)
            .unwrap_or(Self::ROOT)
    }

    /// Add a node under `parent`. Returns `None` if the parent does not exist.
    pub fn add_node(&mut self, parent: ControlId, class: NodeClass, rect: Rect) -> Option<ControlId> {
        let id = ControlId(self.next_id);
        let parent = self.root.find_mut(parent)?;
        parent.children.push(MemoryNode::new(id, class, rect));
        self.next_id += 1;
        Some(id)
    }

    /// Remove a node and its subtree. Returns whether anything was removed.
    pub fn remove(&mut self, id: ControlId) -> bool {
        if id == Self::ROOT {
            return false;
        }
        self.root.remove_child(id)
    }

    pub fn set_visible(&mut self, id: ControlId, visible: bool) {
        if let Some(node) = self.root.find_mut(id) {
            node.visible = visible;
        }
    }

    pub fn set_enabled(&mut self, id: ControlId, enabled: bool) {
        if let Some(node) = self.root.find_mut(id) {
            node.enabled = enabled;
        }
    }

    /// Simulate the host tree becoming unqueryable.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width, height);
        self.root.rect = Rect::new(0.0, 0.0, width, height);
    }

    pub fn configure_slider(&mut self, id: ControlId, min: i32, max: i32, value: i32) {
        if let Some(node) = self.root.find_mut(id) {
            node.state.min = min;
            node.state.max = max.max(min);
            node.state.value = value.clamp(min, max.max(min));
        }
    }

    pub fn configure_indexed(&mut self, id: ControlId, count: usize, index: usize) {
        if let Some(node) = self.root.find_mut(id) {
            node.state.count = count;
            node.state.index = if count == 0 { 0 } else { index.min(count - 1) };
        }
    }

    /// Make `activate` on this control return an error.
    pub fn fail_activation(&mut self, id: ControlId) {
        self.failing.insert(id);
    }

    /// Make `activate` on this control panic, like a misbehaving callback.
    pub fn panic_on_activation(&mut self, id: ControlId) {
        self.panicking.insert(id);
    }

    pub fn activation_count(&self, id: ControlId) -> u32 {
        self.activations.get(&id).copied().unwrap_or(0)
    }

    pub fn total_activations(&self) -> u32 {
        self.activations.values().sum()
    }

    pub fn state(&self, id: ControlId) -> Option<&ControlState> {
        self.root.find(id).map(|n| &n.state)
    }

    /// How many times the tree has been enumerated.
    pub fn enumeration_count(&self) -> u32 {
        self.enumerations.get()
    }

    fn control(&self, id: ControlId) -> Result<&MemoryNode, HostError> {
        if !self.available {
            return Err(HostError::Unavailable);
        }
        self.root
            .find(id)
            .filter(|n| n.id != Self::ROOT)
            .ok_or(HostError::UnknownControl(id))
    }

    fn control_mut(&mut self, id: ControlId) -> Result<&mut MemoryNode, HostError> {
        if !self.available {
            return Err(HostError::Unavailable);
        }
        self.root
            .find_mut(id)
            .filter(|n| n.id != Self::ROOT)
            .ok_or(HostError::UnknownControl(id))
    }

    fn indexed(&self, id: ControlId, op: &'static str) -> Result<&ControlState, HostError> {
        let node = self.control(id)?;
        match node.class {
            NodeClass::Interactive(ControlKind::Tab | ControlKind::Combo) => Ok(&node.state),
            _ => Err(HostError::Unsupported { id, op }),
        }
    }

    fn ranged(&self, id: ControlId, op: &'static str) -> Result<&ControlState, HostError> {
        let node = self.control(id)?;
        match node.class {
            NodeClass::Interactive(ControlKind::Slider) => Ok(&node.state),
            _ => Err(HostError::Unsupported { id, op }),
        }
    }
}

impl HostWindow for MemoryHost {
    fn enumerate_interactive_controls(&self) -> Result<Vec<ControlDescriptor>, HostError> {
        if !self.available {
            return Err(HostError::Unavailable);
        }
        self.enumerations.set(self.enumerations.get() + 1);
        Ok(walk_widget_tree(&SharedNode { node: &self.root, origin: self.origin }))
    }

    fn window_size(&self) -> Vec2 {
        self.size
    }

    fn map_local_to_shared(&self, point: Vec2) -> Vec2 {
        point + self.origin
    }

    fn map_shared_to_local(&self, point: Vec2) -> Vec2 {
        point - self.origin
    }

    fn activate(&mut self, id: ControlId) -> Result<(), HostError> {
        if self.panicking.contains(&id) {
            panic!("control {:?} blew up during activation", id);
        }
        if self.failing.contains(&id) {
            return Err(HostError::Failed(format!("activation of {:?} rejected", id)));
        }
        let node = self.control_mut(id)?;
        if !node.enabled {
            return Err(HostError::Failed(format!("{:?} is disabled", id)));
        }
        if node.class == NodeClass::Interactive(ControlKind::Checkbox) {
            node.state.checked = !node.state.checked;
        }
        *self.activations.entry(id).or_insert(0) += 1;
        Ok(())
    }

    fn get_index(&self, id: ControlId) -> Result<usize, HostError> {
        Ok(self.indexed(id, "get_index")?.index)
    }

    fn set_index(&mut self, id: ControlId, index: usize) -> Result<(), HostError> {
        let count = self.indexed(id, "set_index")?.count;
        if index >= count {
            return Err(HostError::Failed(format!("index {} out of range for {:?}", index, id)));
        }
        self.control_mut(id)?.state.index = index;
        Ok(())
    }

    fn index_count(&self, id: ControlId) -> Result<usize, HostError> {
        Ok(self.indexed(id, "index_count")?.count)
    }

    fn get_value(&self, id: ControlId) -> Result<i32, HostError> {
        Ok(self.ranged(id, "get_value")?.value)
    }

    fn set_value(&mut self, id: ControlId, value: i32) -> Result<(), HostError> {
        let state = self.ranged(id, "set_value")?;
        let value = value.clamp(state.min, state.max);
        self.control_mut(id)?.state.value = value;
        Ok(())
    }

    fn get_range(&self, id: ControlId) -> Result<RangeInclusive<i32>, HostError> {
        let state = self.ranged(id, "get_range")?;
        Ok(state.min..=state.max)
    }
}
