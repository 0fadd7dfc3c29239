use glam::Vec3;

use crate::api::config::PhysicsParams;
use crate::api::types::{ItemId, ItemKind};
use crate::core::physics::{GroundResponse, PhysicsBody};

/// Degrees per second an item spins while it slides.
const SLIDE_SPIN_RATE: f32 = 100.0;
/// Horizontal speed below which an item counts as still.
const SLIDE_EPSILON: f32 = 0.01;
/// Impacts faster than this squash the item briefly.
const IMPACT_SQUASH_SPEED: f32 = 1.0;
const IMPACT_SQUASH: f32 = 0.8;

/// A loose toy, food or clothing item living in the overlay.
#[derive(Debug, Clone)]
pub struct ItemState {
    pub id: ItemId,
    pub kind: ItemKind,
    pub body: PhysicsBody,
    pub physics_enabled: bool,
}

impl ItemState {
    pub fn new(id: ItemId, kind: ItemKind, position: Vec3) -> Self {
        Self {
            id,
            kind,
            body: PhysicsBody::at(position),
            physics_enabled: true,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.body.velocity = velocity;
        self
    }
}

/// Flat item storage. Item counts are small, so lookups are linear.
pub struct ItemStore {
    items: Vec<ItemState>,
    next_id: u32,
}

impl ItemStore {
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(16),
            next_id: 1,
        }
    }

    /// Spawn an item at a world position. Returns its id.
    pub fn spawn(&mut self, kind: ItemKind, position: Vec3) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.items.push(ItemState::new(id, kind, position));
        id
    }

    /// Remove an item by id. Returns the removed item if found.
    pub fn remove(&mut self, id: ItemId) -> Option<ItemState> {
        let idx = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.swap_remove(idx))
    }

    pub fn get(&self, id: ItemId) -> Option<&ItemState> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut ItemState> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemState> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Integrate every physics-enabled item independently.
    pub fn step(&mut self, params: &PhysicsParams, dt: f32) {
        let response = GroundResponse::bounce(params);
        for item in self.items.iter_mut().filter(|i| i.physics_enabled) {
            let body = &mut item.body;
            if let Some(speed) = body.integrate(params, params.item_ground_y, response, dt) {
                if speed > IMPACT_SQUASH_SPEED {
                    body.squash_factor = IMPACT_SQUASH;
                }
            }
            body.relax_squash(params.squash_recovery);
            if body.horizontal_speed() > SLIDE_EPSILON {
                body.rotation = (body.rotation + SLIDE_SPIN_RATE * dt) % 360.0;
            }
        }
    }
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}
