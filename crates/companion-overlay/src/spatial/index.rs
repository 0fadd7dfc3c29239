use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Weak;
use std::sync::Arc;

use glam::Vec2;

use crate::api::types::{ControlHandle, ControlId, Rect};
use crate::core::time::Interval;
use crate::host::window::{ControlDescriptor, HostWindow, NodeClass};

/// Spatial queries over the host's interactive controls.
///
/// Implemented by the live index (which may rebuild before answering) and by
/// an immutable snapshot.
pub trait SpatialQuery {
    /// Topmost interactive control containing `point`.
    fn query_point(&mut self, point: Vec2) -> Option<ControlHandle>;
    /// Control whose center is closest to `point`, within `max_radius`.
    fn query_nearest(&mut self, point: Vec2, max_radius: f32) -> Option<(ControlHandle, f32)>;
    /// Every control whose center lies within `radius` of `point`.
    fn query_within(&mut self, point: Vec2, radius: f32) -> Vec<(ControlHandle, f32)>;
    /// Every control intersecting `area`.
    fn query_area(&mut self, area: Rect) -> Vec<ControlHandle>;
}

#[derive(Debug, Clone)]
struct IndexedNode {
    id: ControlId,
    parent: Option<ControlId>,
    rect: Rect,
    class: NodeClass,
    enabled: bool,
}

/// Immutable result of one enumeration of the host tree.
///
/// Published through an `Arc` swap, so a reader holding a snapshot never sees
/// a half-built index.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    generation: u64,
    /// All visible nodes in paint order, back to front.
    nodes: Vec<IndexedNode>,
    node_pos: HashMap<ControlId, usize>,
    /// Visible + enabled interactive controls, paint order.
    controls: Vec<ControlHandle>,
    control_pos: HashMap<ControlId, usize>,
}

impl IndexSnapshot {
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            nodes: Vec::new(),
            node_pos: HashMap::new(),
            controls: Vec::new(),
            control_pos: HashMap::new(),
        }
    }

    pub fn from_descriptors(generation: u64, descriptors: Vec<ControlDescriptor>) -> Self {
        let mut snapshot = Self::empty(generation);
        for d in descriptors.into_iter().filter(|d| d.visible) {
            if let NodeClass::Interactive(kind) = d.class {
                if d.enabled && !d.rect.is_empty() {
                    snapshot.control_pos.insert(d.id, snapshot.controls.len());
                    snapshot.controls.push(ControlHandle {
                        id: d.id,
                        rect: d.rect,
                        kind,
                        enabled: true,
                        visible: true,
                        generation,
                    });
                }
            }
            snapshot.node_pos.insert(d.id, snapshot.nodes.len());
            snapshot.nodes.push(IndexedNode {
                id: d.id,
                parent: d.parent,
                rect: d.rect,
                class: d.class,
                enabled: d.enabled,
            });
        }
        snapshot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn controls(&self) -> &[ControlHandle] {
        &self.controls
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn control(&self, id: ControlId) -> Option<ControlHandle> {
        self.control_pos.get(&id).map(|&i| self.controls[i])
    }

    /// Topmost node containing the point, resolved to its nearest interactive
    /// ancestor when the direct hit is passive.
    pub fn query_point(&self, point: Vec2) -> Option<ControlHandle> {
        let hit = self
            .nodes
            .iter()
            .rev()
            .find(|n| !n.rect.is_empty() && n.rect.contains(point))?;
        self.resolve_interactive(hit)
    }

    fn resolve_interactive(&self, start: &IndexedNode) -> Option<ControlHandle> {
        let mut node = start;
        // Bounded walk: a malformed parent cycle cannot spin forever.
        for _ in 0..=self.nodes.len() {
            if let NodeClass::Interactive(_) = node.class {
                if !node.enabled {
                    return None;
                }
                return self.control(node.id);
            }
            let parent = node.parent?;
            node = &self.nodes[*self.node_pos.get(&parent)?];
        }
        None
    }

    pub fn query_nearest(&self, point: Vec2, max_radius: f32) -> Option<(ControlHandle, f32)> {
        self.controls
            .iter()
            .map(|c| (*c, c.center().distance(point)))
            .filter(|(_, d)| *d <= max_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn query_within(&self, point: Vec2, radius: f32) -> Vec<(ControlHandle, f32)> {
        self.controls
            .iter()
            .map(|c| (*c, c.center().distance(point)))
            .filter(|(_, d)| *d <= radius)
            .collect()
    }

    pub fn query_area(&self, area: Rect) -> Vec<ControlHandle> {
        self.controls
            .iter()
            .filter(|c| c.rect.intersects(&area))
            .copied()
            .collect()
    }
}

impl SpatialQuery for IndexSnapshot {
    fn query_point(&mut self, point: Vec2) -> Option<ControlHandle> {
        IndexSnapshot::query_point(self, point)
    }

    fn query_nearest(&mut self, point: Vec2, max_radius: f32) -> Option<(ControlHandle, f32)> {
        IndexSnapshot::query_nearest(self, point, max_radius)
    }

    fn query_within(&mut self, point: Vec2, radius: f32) -> Vec<(ControlHandle, f32)> {
        IndexSnapshot::query_within(self, point, radius)
    }

    fn query_area(&mut self, area: Rect) -> Vec<ControlHandle> {
        IndexSnapshot::query_area(self, area)
    }
}

/// Rate-limited, lazily rebuilt index of the host's interactive controls.
///
/// Holds only a weak reference to the host window: the application owns the
/// window, and a dropped window simply yields empty results.
pub struct SpatialWidgetIndex<H: HostWindow> {
    host: Weak<RefCell<H>>,
    snapshot: Arc<IndexSnapshot>,
    dirty: bool,
    timer: Interval,
    rebuilds: u64,
}

impl<H: HostWindow> SpatialWidgetIndex<H> {
    /// `rebuild_interval` is in seconds; the first query always rebuilds.
    pub fn new(host: Weak<RefCell<H>>, rebuild_interval: f64) -> Self {
        Self {
            host,
            snapshot: Arc::new(IndexSnapshot::empty(0)),
            dirty: true,
            timer: Interval::new(rebuild_interval, 0.0),
            rebuilds: 0,
        }
    }

    /// Re-enumerate the host tree now and publish a fresh snapshot.
    pub fn rebuild(&mut self) {
        let generation = self.snapshot.generation() + 1;
        let next = match self.enumerate() {
            Some(descriptors) => IndexSnapshot::from_descriptors(generation, descriptors),
            None => IndexSnapshot::empty(generation),
        };
        log::debug!(
            "widget index rebuilt: generation {} with {} controls",
            generation,
            next.len()
        );
        self.snapshot = Arc::new(next);
        self.dirty = false;
        self.rebuilds += 1;
    }

    fn enumerate(&self) -> Option<Vec<ControlDescriptor>> {
        let host = self.host.upgrade()?;
        let host = host.try_borrow().ok()?;
        match host.enumerate_interactive_controls() {
            Ok(descriptors) => Some(descriptors),
            Err(err) => {
                log::debug!("widget enumeration skipped: {}", err);
                None
            }
        }
    }

    /// Rate-limited rebuild, called once per tick. Returns whether it rebuilt.
    pub fn refresh(&mut self, now: f64) -> bool {
        let due = self.timer.poll(now);
        if self.dirty || due {
            self.rebuild();
            true
        } else {
            false
        }
    }

    /// Force a rebuild before the next query (layout change, resize).
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Current snapshot, rebuilding first if the index was invalidated.
    pub fn snapshot(&mut self) -> Arc<IndexSnapshot> {
        if self.dirty {
            self.rebuild();
        }
        Arc::clone(&self.snapshot)
    }

    /// Current snapshot without triggering a rebuild.
    pub fn current(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    pub fn control(&mut self, id: ControlId) -> Option<ControlHandle> {
        self.snapshot().control(id)
    }
}

impl<H: HostWindow> SpatialQuery for SpatialWidgetIndex<H> {
    fn query_point(&mut self, point: Vec2) -> Option<ControlHandle> {
        self.snapshot().query_point(point)
    }

    fn query_nearest(&mut self, point: Vec2, max_radius: f32) -> Option<(ControlHandle, f32)> {
        self.snapshot().query_nearest(point, max_radius)
    }

    fn query_within(&mut self, point: Vec2, radius: f32) -> Vec<(ControlHandle, f32)> {
        self.snapshot().query_within(point, radius)
    }

    fn query_area(&mut self, area: Rect) -> Vec<ControlHandle> {
        self.snapshot().query_area(area)
    }
}
